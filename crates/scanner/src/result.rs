use serde::{Deserialize, Serialize};

/// Where the preview should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Boot in the in-browser sandbox.
    Fast,
    /// Defer to a real remote deployment.
    Full,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Full => f.write_str("full"),
        }
    }
}

/// Declared web-framework family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkFamily {
    /// The default full-stack framework (Next.js).
    FullStack,
    /// Bundler-based single-page app (Vite).
    BundlerSpa,
    /// Legacy single-page app (Create React App).
    LegacySpa,
    Unknown,
}

impl FrameworkFamily {
    pub fn is_default(self) -> bool {
        self == Self::FullStack
    }
}

/// Everything the scanner detected about one project.
///
/// Pure function of the scanned file map and rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// ORM schema, client dependency or client import present.
    pub has_orm: bool,
    /// ORM schema files and generated-client artifacts.
    pub orm_schema_paths: Vec<String>,
    /// The single module through which code is expected to get its client.
    pub orm_wrapper_path: Option<String>,
    /// Files outside the wrapper that import the ORM client directly.
    pub orm_direct_importers: Vec<String>,
    pub has_hosted_db: bool,
    /// Deny-listed packages found in the manifest, sorted.
    pub native_dependencies: Vec<String>,
    pub middleware_path: Option<String>,
    pub has_postinstall: bool,
    pub framework: FrameworkFamily,
    /// Environment variable names read by source files, sorted.
    pub env_vars: Vec<String>,
    pub requires_secrets: bool,
    pub score: u32,
    pub recommended: Recommendation,
    pub can_auto_patch_to_fast: bool,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// True when nothing at all was detected.
    pub fn is_clean(&self) -> bool {
        !self.has_orm
            && !self.has_hosted_db
            && self.native_dependencies.is_empty()
            && self.middleware_path.is_none()
            && !self.has_postinstall
            && self.framework == FrameworkFamily::Unknown
            && self.env_vars.is_empty()
    }
}
