use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Boot lifecycle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootConfig {
    #[serde(default = "d_install")]
    pub install_command: String,
    #[serde(default = "d_start")]
    pub start_command: String,
    /// Max lines kept in the terminal log before oldest-first eviction.
    #[serde(default = "d_500")]
    pub log_capacity: usize,
    /// Tail lines attached to a start-failure message.
    #[serde(default = "d_20")]
    pub error_context_lines: usize,
    /// Runtime binary the local host needs on `PATH`.
    #[serde(default = "d_runtime")]
    pub required_runtime: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            install_command: d_install(),
            start_command: d_start(),
            log_capacity: 500,
            error_context_lines: 20,
            required_runtime: d_runtime(),
        }
    }
}

fn d_install() -> String {
    "npm install".into()
}
fn d_start() -> String {
    "npm run dev".into()
}
fn d_500() -> usize {
    500
}
fn d_20() -> usize {
    20
}
fn d_runtime() -> String {
    "node".into()
}
