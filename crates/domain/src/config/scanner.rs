use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scanner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Packages added to the built-in native-binary deny-list.
    #[serde(default)]
    pub extra_native_packages: Vec<String>,
    /// Risk score at or above which the full deployment is recommended.
    #[serde(default = "d_3")]
    pub full_threshold: u32,
    /// Max files outside the ORM wrapper that may import the ORM client
    /// directly while still allowing an automatic patch.
    #[serde(default = "d_2")]
    pub max_direct_orm_imports: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extra_native_packages: Vec::new(),
            full_threshold: 3,
            max_direct_orm_imports: 2,
        }
    }
}

fn d_3() -> u32 {
    3
}
fn d_2() -> usize {
    2
}
