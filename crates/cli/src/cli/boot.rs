//! `previewctl boot`: scan, patch and run a project in the local sandbox.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::broadcast::error::RecvError;

use pv_domain::config::Config;
use pv_patcher::Patcher;
use pv_sandbox::format::colorize;
use pv_sandbox::{
    BootController, BootFailure, BootOutcome, HostSlot, LocalHostProvider, SurfaceRegistry,
};
use pv_scanner::{Recommendation, ScanResult};

use crate::cli::scan::scan_dir;

/// Exit code when the project needs a full remote deployment instead.
pub const EXIT_DEFERRED: i32 = 2;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

/// Returns the process exit code.
pub async fn run(config: &Config, dir: &Path, workdir: Option<PathBuf>) -> anyhow::Result<i32> {
    let (files, scan) = scan_dir(config, dir)?;
    if scan.recommended == Recommendation::Full {
        print!("{}", deferral(&scan));
        return Ok(EXIT_DEFERRED);
    }

    let patched = Patcher::new(config.patcher.clone()).patch(&files, &scan);
    let workdir = match workdir {
        Some(workdir) => workdir,
        None => default_workdir(dir)?,
    };
    check_workdir(dir, &workdir)?;
    let surface = dir.display().to_string();

    let registry = SurfaceRegistry::new();
    let lifecycle = registry.register(&surface);
    let provider = Arc::new(LocalHostProvider::new(
        &workdir,
        config.boot.required_runtime.clone(),
    ));
    let slot = Arc::new(HostSlot::new(provider));
    let controller = BootController::new(slot, config.boot.clone(), lifecycle.token.clone())
        .with_fallback(Arc::new(|failure: &BootFailure| {
            eprintln!("sandbox unavailable ({}); serve a static preview instead", failure.message);
        }));

    let mut lines = controller.state().subscribe_lines();
    let printer = tokio::spawn(async move {
        loop {
            match lines.recv().await {
                Ok(line) => println!("{}", colorize(&line)),
                Err(RecvError::Lagged(skipped)) => eprintln!("... {skipped} lines skipped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let ctrl_c = lifecycle.token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    tracing::info!(workdir = %workdir.display(), "booting preview");
    let code = match controller.boot(&patched.files).await? {
        BootOutcome::Ready(ready) => {
            eprintln!("preview running at {}; press Ctrl-C to stop", ready.url);
            lifecycle.token.cancelled().await;
            controller.shutdown().await;
            0
        }
        BootOutcome::Failed(failure) => {
            eprintln!("boot failed: {}", failure.message);
            if let Some(context) = &failure.context {
                eprintln!("{context}");
            }
            controller.slot().release().await;
            EXIT_FAILED
        }
        BootOutcome::Cancelled => EXIT_CANCELLED,
    };

    registry.remove(&surface, lifecycle.generation);
    printer.abort();
    Ok(code)
}

/// Per-project scratch directory under the system temp dir, keyed by the
/// project's canonical path so same-named projects never share one.
pub fn default_workdir(dir: &Path) -> anyhow::Result<PathBuf> {
    let canonical = std::fs::canonicalize(dir)?;
    let name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project");
    let digest = hex::encode(Sha256::digest(canonical.to_string_lossy().as_bytes()));
    Ok(std::env::temp_dir()
        .join("previewctl")
        .join(format!("{name}-{}", &digest[..12])))
}

/// Mounting clears the workdir, so it must not overlap the project.
pub fn check_workdir(dir: &Path, workdir: &Path) -> anyhow::Result<()> {
    let project = std::fs::canonicalize(dir)?;
    let workdir = resolve(workdir)?;
    if project.starts_with(&workdir) {
        anyhow::bail!(
            "workdir {} contains the project directory; it would be wiped on mount",
            workdir.display()
        );
    }
    if workdir.starts_with(&project) {
        anyhow::bail!(
            "workdir {} is inside the project directory",
            workdir.display()
        );
    }
    Ok(())
}

/// Canonical form of `path`, which need not exist yet.
fn resolve(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        let Some(parent) = existing.parent() else {
            return Ok(absolute);
        };
        if let Some(name) = existing.file_name() {
            rest.push(name.to_owned());
        }
        existing = parent;
    }
    let mut resolved = std::fs::canonicalize(existing)?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

/// Message printed instead of booting a high-risk project.
pub fn deferral(scan: &ScanResult) -> String {
    let mut out = format!(
        "risk score {} needs a full deployment; not booting in the sandbox\n",
        scan.score
    );
    for reason in &scan.reasons {
        out.push_str("  - ");
        out.push_str(reason);
        out.push('\n');
    }
    out
}
