mod boot;
mod observability;
mod patcher;
mod scanner;

pub use boot::*;
pub use observability::*;
pub use patcher::*;
pub use scanner::*;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub patcher: PatcherConfig,
    #[serde(default)]
    pub boot: BootConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Read a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.patcher.dev_port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "patcher.dev_port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.patcher.dev_host.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "patcher.dev_host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.boot.log_capacity == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "boot.log_capacity".into(),
                message: "log capacity must be greater than 0".into(),
            });
        }

        for (field, value) in [
            ("boot.install_command", &self.boot.install_command),
            ("boot.start_command", &self.boot.start_command),
        ] {
            if value.trim().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "command must not be empty".into(),
                });
            }
        }

        // A zero threshold sends every project to the remote deployment.
        if self.scanner.full_threshold == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "scanner.full_threshold".into(),
                message: "threshold 0 recommends full deployment for every project".into(),
            });
        }

        if self.boot.error_context_lines > self.boot.log_capacity {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "boot.error_context_lines".into(),
                message: format!(
                    "{} exceeds log_capacity ({}); context is clamped",
                    self.boot.error_context_lines, self.boot.log_capacity
                ),
            });
        }

        errors
    }
}
