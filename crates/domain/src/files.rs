//! The flat file map: a generated project before it touches a filesystem.
//!
//! Keys are `/`-separated paths relative to the project root. Consumers
//! must not rely on key order for meaning; a `BTreeMap` is used so that
//! anything derived from the map (scan reasons, patch notes, mount trees)
//! comes out in a stable order.

use std::collections::BTreeMap;

/// Path → text content for one generated project.
pub type FileMap = BTreeMap<String, String>;

/// Non-empty `/`-separated segments of `path`.
///
/// Leading, trailing and doubled separators produce no segments.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Canonical form of `path`: its non-empty segments joined by `/`.
pub fn normalize_path(path: &str) -> String {
    path_segments(path).collect::<Vec<_>>().join("/")
}

/// Final segment of `path`, if any.
pub fn file_name(path: &str) -> Option<&str> {
    path_segments(path).last()
}

/// Look up `path` in `files`, tolerating a leading `./` or `/`.
pub fn lookup<'a>(files: &'a FileMap, path: &str) -> Option<(&'a String, &'a String)> {
    if let Some(entry) = files.get_key_value(path) {
        return Some(entry);
    }
    let wanted = normalize_path(path);
    files
        .iter()
        .find(|(k, _)| normalize_path(k.trim_start_matches("./")) == wanted)
}

/// True for files that carry program text worth scanning for imports and
/// environment reads.
pub fn is_source_file(path: &str) -> bool {
    const SOURCE_EXTENSIONS: &[&str] = &[
        ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts", ".vue", ".svelte",
    ];
    if path_segments(path).any(|s| s == "node_modules") {
        return false;
    }
    SOURCE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_skip_empty_parts() {
        let segs: Vec<_> = path_segments("/src//lib/db.ts/").collect();
        assert_eq!(segs, vec!["src", "lib", "db.ts"]);
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize_path("//a///b/"), "a/b");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name("app/page.tsx"), Some("page.tsx"));
        assert_eq!(file_name("/"), None);
    }

    #[test]
    fn lookup_tolerates_dot_prefix() {
        let mut files = FileMap::new();
        files.insert("./package.json".into(), "{}".into());
        let (key, _) = lookup(&files, "package.json").unwrap();
        assert_eq!(key, "./package.json");
    }

    #[test]
    fn source_files_exclude_node_modules() {
        assert!(is_source_file("src/app.tsx"));
        assert!(!is_source_file("node_modules/x/index.js"));
        assert!(!is_source_file("README.md"));
    }
}
