use std::path::Path;

use pv_domain::config::Config;
use pv_patcher::Patcher;

use crate::cli::scan::scan_dir;
use crate::project;

pub fn run(config: &Config, dir: &Path, out: &Path) -> anyhow::Result<()> {
    if out.exists() && std::fs::canonicalize(out)? == std::fs::canonicalize(dir)? {
        anyhow::bail!("output directory must differ from the project directory");
    }
    let (files, scan) = scan_dir(config, dir)?;
    let result = Patcher::new(config.patcher.clone()).patch(&files, &scan);
    project::write_dir(&result.files, out)?;

    println!(
        "patched {} files into {} (recommended: {})",
        result.files.len(),
        out.display(),
        scan.recommended
    );
    for step in &result.applied {
        println!("  applied {step}");
    }
    for note in &result.notes {
        println!("  note: {note}");
    }
    Ok(())
}
