use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Patcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatcherConfig {
    /// Interface the dev server binds to. The sandbox bridge cannot reach
    /// a loopback-only bind.
    #[serde(default = "d_dev_host")]
    pub dev_host: String,
    #[serde(default = "d_3000")]
    pub dev_port: u16,
    /// Secrets file synthesized when the project ships none.
    #[serde(default = "d_env_file")]
    pub env_file: String,
    /// Where the mock client is written when no ORM wrapper was detected.
    #[serde(default = "d_wrapper_path")]
    pub wrapper_default_path: String,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            dev_host: d_dev_host(),
            dev_port: 3000,
            env_file: d_env_file(),
            wrapper_default_path: d_wrapper_path(),
        }
    }
}

fn d_dev_host() -> String {
    "0.0.0.0".into()
}
fn d_3000() -> u16 {
    3000
}
fn d_env_file() -> String {
    ".env.local".into()
}
fn d_wrapper_path() -> String {
    "lib/prisma.ts".into()
}
