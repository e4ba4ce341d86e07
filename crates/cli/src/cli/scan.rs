use std::fmt::Write as _;
use std::path::Path;

use pv_domain::config::Config;
use pv_scanner::{ScanResult, ScanRules, Scanner};

use crate::project;

/// Scan with the configured rule set.
pub fn scan_dir(config: &Config, dir: &Path) -> anyhow::Result<(pv_domain::FileMap, ScanResult)> {
    let files = project::load_dir(dir)?;
    let result = Scanner::new(ScanRules::from_config(&config.scanner)).scan(&files);
    Ok((files, result))
}

pub fn run(config: &Config, dir: &Path, json: bool) -> anyhow::Result<()> {
    let (_, result) = scan_dir(config, dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", summary(&result));
    }
    Ok(())
}

/// Human-readable scan report.
pub fn summary(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "recommended: {} (risk score {})",
        result.recommended, result.score
    );
    let _ = writeln!(out, "framework:   {:?}", result.framework);
    if let Some(wrapper) = &result.orm_wrapper_path {
        let _ = writeln!(out, "orm wrapper: {wrapper}");
    }
    if !result.env_vars.is_empty() {
        let _ = writeln!(out, "env vars:    {}", result.env_vars.join(", "));
    }
    if result.can_auto_patch_to_fast {
        let _ = writeln!(out, "auto-patch:  yes");
    }
    for (title, items) in [("reasons", &result.reasons), ("warnings", &result.warnings)] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}:");
        for item in items {
            let _ = writeln!(out, "  - {item}");
        }
    }
    out
}
