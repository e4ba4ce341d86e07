pub mod boot;
pub mod config;
pub mod patch;
pub mod scan;
pub mod tree;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// previewctl: scan, patch and boot generated projects in a local sandbox.
#[derive(Debug, Parser)]
#[command(name = "previewctl", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a project and recommend a preview strategy.
    Scan {
        /// Project directory.
        dir: PathBuf,
        /// Print the full scan result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write a sandbox-ready copy of a project.
    Patch {
        /// Project directory.
        dir: PathBuf,
        /// Output directory for the patched project.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the mock ORM client module.
    MockClient {
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the mount tree of a project as JSON.
    Tree {
        /// Project directory.
        dir: PathBuf,
    },
    /// Scan, patch and boot a project in a local sandbox.
    Boot {
        /// Project directory.
        dir: PathBuf,
        /// Sandbox working directory (defaults to a temp directory).
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `PV_CONFIG` (or `preview.toml` by
/// default). Returns the parsed config and the path that was used.
pub fn load_config() -> anyhow::Result<(pv_domain::config::Config, String)> {
    let config_path = std::env::var("PV_CONFIG").unwrap_or_else(|_| "preview.toml".into());
    let config = pv_domain::config::Config::load(std::path::Path::new(&config_path))
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;
    Ok((config, config_path))
}
