use std::path::Path;

use anyhow::Context;

use crate::project;

pub fn run(dir: &Path) -> anyhow::Result<()> {
    let files = project::load_dir(dir)?;
    let tree = pv_mount::to_mount_tree(&files).context("building mount tree")?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
