//! Reading a project directory into a flat file map and writing one back.

use std::path::Path;

use anyhow::Context;

use pv_domain::FileMap;
use pv_mount::to_mount_tree;

/// Directories never read into the file map.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", ".next", ".turbo", "dist"];

/// Load every UTF-8 file under `root`. Keys are `/`-separated and relative
/// to `root`. Binary files are skipped.
pub fn load_dir(root: &Path) -> anyhow::Result<FileMap> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    let mut files = FileMap::new();
    walk(root, "", &mut files)?;
    tracing::debug!(root = %root.display(), files = files.len(), "project loaded");
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut FileMap) -> anyhow::Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("listing {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 name");
            continue;
        };
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            walk(&entry.path(), &key, files)?;
        } else if file_type.is_file() {
            let bytes = std::fs::read(entry.path())
                .with_context(|| format!("reading {}", entry.path().display()))?;
            match String::from_utf8(bytes) {
                Ok(text) => {
                    files.insert(key, text);
                }
                Err(_) => tracing::debug!(path = %key, "skipping binary file"),
            }
        }
    }
    Ok(())
}

/// Write `files` under `out`, creating directories as needed.
pub fn write_dir(files: &FileMap, out: &Path) -> anyhow::Result<()> {
    let tree = to_mount_tree(files).context("building file tree")?;
    tree.materialize(out)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}
