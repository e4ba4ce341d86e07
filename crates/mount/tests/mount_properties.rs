use pv_domain::FileMap;
use pv_mount::{to_mount_tree, MountError};

fn generated_project() -> FileMap {
    [
        ("package.json", "{\"name\":\"demo\"}"),
        ("next.config.js", "module.exports = {};"),
        ("app/layout.tsx", "export default function L({ children }) { return children }"),
        ("app/page.tsx", "export default function P() { return <main/> }"),
        ("app/api/users/route.ts", "export async function GET() {}"),
        ("lib/prisma.ts", "export const prisma = {};"),
        ("public/favicon.svg", "<svg/>"),
        ("components/ui/button.tsx", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

#[test]
fn one_leaf_per_path_with_content_preserved() {
    let files = generated_project();
    let tree = to_mount_tree(&files).unwrap();
    assert_eq!(tree.leaf_count(), files.len());
    for (path, contents) in &files {
        assert_eq!(tree.file_contents(path), Some(contents.as_str()), "{path}");
    }
}

#[test]
fn leaves_round_trip_to_the_source_map() {
    let files = generated_project();
    let tree = to_mount_tree(&files).unwrap();
    let rebuilt: FileMap = tree
        .leaves()
        .into_iter()
        .map(|(p, c)| (p, c.to_owned()))
        .collect();
    assert_eq!(rebuilt, files);
}

#[test]
fn empty_map_is_empty_tree() {
    let tree = to_mount_tree(&FileMap::new()).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.leaf_count(), 0);
}

#[test]
fn serializes_to_sandbox_wire_shape() {
    let mut files = FileMap::new();
    files.insert("src/index.js".into(), "console.log(1)".into());
    let tree = to_mount_tree(&files).unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "src": { "directory": { "index.js": { "file": { "contents": "console.log(1)" } } } }
        })
    );
}

#[test]
fn materialize_writes_every_file() {
    let files = generated_project();
    let tree = to_mount_tree(&files).unwrap();
    let dir = tempfile::tempdir().unwrap();
    tree.materialize(dir.path()).unwrap();
    for (path, contents) in &files {
        let on_disk = std::fs::read_to_string(dir.path().join(path)).unwrap();
        assert_eq!(&on_disk, contents);
    }
}

#[test]
fn conflicting_map_is_rejected_not_resolved() {
    let mut files = generated_project();
    files.insert("lib".into(), "shadowing file".into());
    let err = to_mount_tree(&files).unwrap_err();
    assert!(matches!(err, MountError::PathConflict { .. }));
}

#[test]
fn parent_segments_never_leave_the_mount_root() {
    let base = tempfile::tempdir().unwrap();
    let mut files = generated_project();
    files.insert("../escaped.txt".into(), "outside".into());

    let err = to_mount_tree(&files).unwrap_err();
    assert!(matches!(err, MountError::UnsafeSegment { ref segment, .. } if segment == ".."));
    assert!(!base.path().join("escaped.txt").exists());
}
