use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use pv_domain::files::{self, FileMap};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// `path` needs `at` to be a directory, but another path made it a
    /// file (or the reverse).
    #[error("path conflict: `{path}` collides with a {existing} at `{at}`")]
    PathConflict {
        path: String,
        at: String,
        existing: &'static str,
    },

    /// Two keys normalize to the same leaf (`a/b` and `/a//b`).
    #[error("duplicate file: `{path}` normalizes to an existing file")]
    DuplicateLeaf { path: String },

    #[error("empty path: `{0}` has no segments")]
    EmptyPath(String),

    /// A segment that would resolve outside its parent directory.
    #[error("unsafe path: `{path}` contains segment `{segment}`")]
    UnsafeSegment { path: String, segment: String },
}

/// `.`, `..` and segments carrying a backslash or NUL never reach the disk.
fn is_unsafe_segment(seg: &str) -> bool {
    seg == "." || seg == ".." || seg.contains('\\') || seg.contains('\0')
}

/// One node of the sandbox filesystem.
///
/// Serializes to the sandbox wire shape: `{"file": {"contents": ...}}`
/// or `{"directory": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountNode {
    File { contents: String },
    Directory(BTreeMap<String, MountNode>),
}

impl MountNode {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    fn leaf_count(&self) -> usize {
        match self {
            Self::File { .. } => 1,
            Self::Directory(children) => children.values().map(MountNode::leaf_count).sum(),
        }
    }
}

/// Root directory of a mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MountTree {
    root: BTreeMap<String, MountNode>,
}

impl MountTree {
    pub fn entries(&self) -> &BTreeMap<String, MountNode> {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.values().map(MountNode::leaf_count).sum()
    }

    /// Walk `path`'s segments from the root.
    pub fn get(&self, path: &str) -> Option<&MountNode> {
        let mut segments = files::path_segments(path);
        let mut node = self.root.get(segments.next()?)?;
        for seg in segments {
            match node {
                MountNode::Directory(children) => node = children.get(seg)?,
                MountNode::File { .. } => return None,
            }
        }
        Some(node)
    }

    pub fn file_contents(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            MountNode::File { contents } => Some(contents),
            MountNode::Directory(_) => None,
        }
    }

    /// Every leaf as `(normalized path, contents)`, in path order.
    pub fn leaves(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, "", &mut out);
        out
    }

    /// Write the tree under `dir`, creating directories as needed.
    /// Existing files at the same paths are overwritten.
    pub fn materialize(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        write_children(&self.root, dir)
    }
}

fn collect_leaves<'a>(
    children: &'a BTreeMap<String, MountNode>,
    prefix: &str,
    out: &mut Vec<(String, &'a str)>,
) {
    for (name, node) in children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        match node {
            MountNode::File { contents } => out.push((path, contents.as_str())),
            MountNode::Directory(sub) => collect_leaves(sub, &path, out),
        }
    }
}

fn write_children(children: &BTreeMap<String, MountNode>, dir: &Path) -> std::io::Result<()> {
    for (name, node) in children {
        let target = dir.join(name);
        match node {
            MountNode::File { contents } => std::fs::write(&target, contents)?,
            MountNode::Directory(sub) => {
                std::fs::create_dir_all(&target)?;
                write_children(sub, &target)?;
            }
        }
    }
    Ok(())
}

/// Build the mount tree for `files`.
pub fn to_mount_tree(files: &FileMap) -> Result<MountTree, MountError> {
    let mut root = BTreeMap::new();

    for (path, contents) in files {
        let segments: Vec<&str> = files::path_segments(path).collect();
        if let Some(seg) = segments.iter().find(|s| is_unsafe_segment(s)) {
            return Err(MountError::UnsafeSegment {
                path: path.clone(),
                segment: (*seg).to_owned(),
            });
        }
        let Some((leaf, dirs)) = segments.split_last() else {
            return Err(MountError::EmptyPath(path.clone()));
        };

        let mut current = &mut root;
        for (i, seg) in dirs.iter().enumerate() {
            let node = current
                .entry((*seg).to_owned())
                .or_insert_with(|| MountNode::Directory(BTreeMap::new()));
            current = match node {
                MountNode::Directory(children) => children,
                MountNode::File { .. } => {
                    return Err(MountError::PathConflict {
                        path: path.clone(),
                        at: segments[..=i].join("/"),
                        existing: "file",
                    });
                }
            };
        }

        match current.get(*leaf) {
            None => {
                current.insert(
                    (*leaf).to_owned(),
                    MountNode::File {
                        contents: contents.clone(),
                    },
                );
            }
            Some(MountNode::File { .. }) => {
                return Err(MountError::DuplicateLeaf { path: path.clone() });
            }
            Some(MountNode::Directory(_)) => {
                return Err(MountError::PathConflict {
                    path: path.clone(),
                    at: segments.join("/"),
                    existing: "directory",
                });
            }
        }
    }

    tracing::debug!(files = files.len(), "mount tree built");
    Ok(MountTree { root })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> FileMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn nests_directories() {
        let tree = to_mount_tree(&map(&[("src/app/page.tsx", "page"), ("package.json", "{}")])).unwrap();
        assert!(matches!(tree.get("src"), Some(MountNode::Directory(_))));
        assert!(matches!(tree.get("src/app"), Some(MountNode::Directory(_))));
        assert_eq!(tree.file_contents("src/app/page.tsx"), Some("page"));
        assert_eq!(tree.file_contents("package.json"), Some("{}"));
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let tree = to_mount_tree(&map(&[("/lib//db.ts/", "db")])).unwrap();
        assert_eq!(tree.file_contents("lib/db.ts"), Some("db"));
    }

    #[test]
    fn file_then_directory_conflicts() {
        let err = to_mount_tree(&map(&[("a", "file"), ("a/b", "nested")])).unwrap_err();
        assert_eq!(
            err,
            MountError::PathConflict {
                path: "a/b".into(),
                at: "a".into(),
                existing: "file",
            }
        );
    }

    #[test]
    fn directory_then_file_conflicts() {
        // "a/b/!x" sorts before "a/b//", so the directory exists first.
        let err = to_mount_tree(&map(&[("a/b/!x", "nested"), ("a/b//", "file")])).unwrap_err();
        assert_eq!(
            err,
            MountError::PathConflict {
                path: "a/b//".into(),
                at: "a/b".into(),
                existing: "directory",
            }
        );
    }

    #[test]
    fn duplicate_after_normalization() {
        let err = to_mount_tree(&map(&[("/a/b", "one"), ("a/b", "two")])).unwrap_err();
        assert!(matches!(err, MountError::DuplicateLeaf { .. }));
    }

    #[test]
    fn separator_only_path_is_rejected() {
        let err = to_mount_tree(&map(&[("//", "x")])).unwrap_err();
        assert_eq!(err, MountError::EmptyPath("//".into()));
    }

    #[test]
    fn dot_segments_are_rejected() {
        let err = to_mount_tree(&map(&[("../escaped.txt", "x")])).unwrap_err();
        assert_eq!(
            err,
            MountError::UnsafeSegment {
                path: "../escaped.txt".into(),
                segment: "..".into(),
            }
        );
        assert!(matches!(
            to_mount_tree(&map(&[("app/./page.tsx", "x")])),
            Err(MountError::UnsafeSegment { .. })
        ));
        assert!(matches!(
            to_mount_tree(&map(&[("app\\..\\x", "x")])),
            Err(MountError::UnsafeSegment { .. })
        ));
        // Dots inside a name are fine.
        assert!(to_mount_tree(&map(&[("..config/.env.local", "x")])).is_ok());
    }

    #[test]
    fn get_through_a_file_is_none() {
        let tree = to_mount_tree(&map(&[("a.txt", "x")])).unwrap();
        assert!(tree.get("a.txt/b").is_none());
        assert!(tree.get("").is_none());
    }
}
