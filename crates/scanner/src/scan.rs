//! Signal detection and scoring.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use pv_domain::files::{self, FileMap};
use pv_domain::manifest::{PackageManifest, MANIFEST_PATH};
use pv_domain::trace::TraceEvent;

use crate::result::{FrameworkFamily, Recommendation, ScanResult};
use crate::rules::{self, ScanRules};

#[allow(clippy::expect_used)]
static ORM_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s*|\brequire\s*\(\s*|\bimport\s*\(?\s*)['"]@prisma/client(?:/[^'"]*)?['"]"#)
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static HOSTED_DB_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s*|\brequire\s*\(\s*|\bimport\s*\(?\s*)['"]@supabase/[^'"]+['"]"#)
        .expect("valid regex")
});

/// `process.env.X`, `process.env["X"]` and `import.meta.env.X`.
#[allow(clippy::expect_used)]
static ENV_READ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"process\.env\.([A-Za-z_][A-Za-z0-9_]*)|process\.env\[\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]\s*\]|import\.meta\.env\.([A-Za-z_][A-Za-z0-9_]*)"#,
    )
    .expect("valid regex")
});

/// Scan `files` with the default rule set.
pub fn scan(files: &FileMap) -> ScanResult {
    Scanner::default().scan(files)
}

/// Scanner bound to a rule set.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    rules: ScanRules,
}

impl Scanner {
    pub fn new(rules: ScanRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScanRules {
        &self.rules
    }

    pub fn scan(&self, files: &FileMap) -> ScanResult {
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        let manifest = match files::lookup(files, MANIFEST_PATH) {
            Some((_, text)) => {
                let parsed = PackageManifest::parse(text);
                if parsed.is_none() {
                    warnings.push(
                        "package.json is not a JSON object; manifest signals ignored".to_owned(),
                    );
                }
                parsed
            }
            None => None,
        };

        let native_dependencies: Vec<String> = manifest
            .as_ref()
            .map(|m| {
                m.dependency_names()
                    .into_iter()
                    .filter(|name| self.rules.is_denied(name))
                    .collect()
            })
            .unwrap_or_default();

        let has_postinstall = manifest
            .as_ref()
            .is_some_and(|m| m.script("postinstall").is_some());

        let framework = detect_framework(files, manifest.as_ref());

        // ── Source-level signals ────────────────────────────────────
        let mut orm_importers = Vec::new();
        let mut hosted_db_imported = false;
        let mut env_vars = BTreeSet::new();

        for (path, content) in files.iter().filter(|(p, _)| files::is_source_file(p)) {
            if ORM_IMPORT_RE.is_match(content) {
                orm_importers.push(path.clone());
            }
            if HOSTED_DB_IMPORT_RE.is_match(content) {
                hosted_db_imported = true;
            }
            for caps in ENV_READ_RE.captures_iter(content) {
                if let Some(name) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) {
                    if !rules::BUILTIN_ENV_VARS.contains(&name.as_str()) {
                        env_vars.insert(name.as_str().to_owned());
                    }
                }
            }
        }

        let orm_schema_paths: Vec<String> = files
            .keys()
            .filter(|p| is_orm_schema_artifact(p))
            .cloned()
            .collect();

        let orm_in_manifest = manifest
            .as_ref()
            .is_some_and(|m| rules::ORM_PACKAGES.iter().any(|p| m.has_dependency(p)));

        let has_orm = orm_in_manifest || !orm_schema_paths.is_empty() || !orm_importers.is_empty();

        let orm_wrapper_path = detect_wrapper(files, &orm_importers);
        let orm_direct_importers: Vec<String> = orm_importers
            .iter()
            .filter(|p| Some(*p) != orm_wrapper_path.as_ref())
            .cloned()
            .collect();

        let has_hosted_db = hosted_db_imported
            || manifest
                .as_ref()
                .is_some_and(|m| rules::HOSTED_DB_PACKAGES.iter().any(|p| m.has_dependency(p)));

        let middleware_path = rules::MIDDLEWARE_PATHS
            .iter()
            .find_map(|candidate| files::lookup(files, candidate).map(|(k, _)| k.clone()));

        let env_vars: Vec<String> = env_vars.into_iter().collect();
        let requires_secrets = !env_vars.is_empty();

        // ── Scoring ─────────────────────────────────────────────────
        let mut score = 0;

        if !native_dependencies.is_empty() {
            score += rules::NATIVE_WEIGHT;
            for dep in &native_dependencies {
                reasons.push(format!(
                    "native dependency `{dep}` needs a compiled binary the sandbox cannot load"
                ));
            }
        }

        if has_orm {
            score += rules::ORM_WEIGHT;
            reasons.push("ORM detected; its query engine cannot run in the sandbox".to_owned());
        }

        if has_hosted_db && requires_secrets {
            score += rules::HOSTED_DB_WEIGHT;
            reasons.push("hosted database client reads secrets from the environment".to_owned());
        }

        if framework != FrameworkFamily::Unknown && !framework.is_default() {
            score += rules::FRAMEWORK_WEIGHT;
            reasons.push(format!("framework family {framework:?} is not the default"));
        }

        let recommended = if score >= self.rules.full_threshold {
            Recommendation::Full
        } else {
            Recommendation::Fast
        };

        let can_auto_patch_to_fast = orm_direct_importers.len() <= self.rules.max_direct_orm_imports;
        if !can_auto_patch_to_fast {
            warnings.push(format!(
                "{} files import the ORM client directly; replacing the wrapper will not cover them",
                orm_direct_importers.len()
            ));
        }
        if has_orm && orm_wrapper_path.is_none() {
            warnings.push("no ORM wrapper module found; a default path will be used".to_owned());
        }
        if middleware_path.is_some() {
            warnings.push("request middleware present; it will be neutralized".to_owned());
        }

        let result = ScanResult {
            has_orm,
            orm_schema_paths,
            orm_wrapper_path,
            orm_direct_importers,
            has_hosted_db,
            native_dependencies,
            middleware_path,
            has_postinstall,
            framework,
            env_vars,
            requires_secrets,
            score,
            recommended,
            can_auto_patch_to_fast,
            reasons,
            warnings,
        };

        tracing::debug!(score, recommended = %recommended, "scan complete");
        TraceEvent::ScanCompleted {
            files: files.len(),
            score,
            recommended: recommended.to_string(),
            native_dependencies: result.native_dependencies.len(),
            orm_detected: has_orm,
        }
        .emit();

        result
    }
}

/// Schema files and generated ORM client code.
pub fn is_orm_schema_artifact(path: &str) -> bool {
    let normalized = files::normalize_path(path);
    normalized.ends_with(".prisma")
        || rules::ORM_GENERATED_PREFIXES
            .iter()
            .any(|prefix| normalized.starts_with(prefix) || normalized.contains(&format!("/{prefix}")))
}

fn detect_framework(files: &FileMap, manifest: Option<&PackageManifest>) -> FrameworkFamily {
    let has_any = |candidates: &[&str]| candidates.iter().any(|c| files::lookup(files, c).is_some());
    let depends = |name: &str| manifest.is_some_and(|m| m.has_dependency(name));

    if has_any(rules::FULL_STACK_CONFIGS) || depends("next") {
        FrameworkFamily::FullStack
    } else if has_any(rules::BUNDLER_CONFIGS) || depends("vite") {
        FrameworkFamily::BundlerSpa
    } else if depends("react-scripts") {
        FrameworkFamily::LegacySpa
    } else {
        FrameworkFamily::Unknown
    }
}

/// Pick the module that constructs the ORM client, preferring a
/// conventional file stem and then the shallowest path.
fn detect_wrapper(files: &FileMap, importers: &[String]) -> Option<String> {
    let mut constructs: Vec<&String> = importers
        .iter()
        .filter(|p| files.get(*p).is_some_and(|c| c.contains("new PrismaClient")))
        .collect();

    let depth = |p: &str| files::path_segments(p).count();
    constructs.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

    let is_conventional = |p: &str| {
        files::file_name(p)
            .and_then(|name| name.split('.').next())
            .is_some_and(|stem| rules::WRAPPER_STEMS.contains(&stem))
    };

    constructs
        .iter()
        .find(|p| is_conventional(p))
        .or_else(|| constructs.first())
        .map(|p| (*p).clone())
}
