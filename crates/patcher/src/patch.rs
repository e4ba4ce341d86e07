use serde::Serialize;

use pv_domain::config::PatcherConfig;
use pv_domain::files::{self, FileMap};
use pv_domain::manifest::MANIFEST_PATH;
use pv_domain::trace::TraceEvent;
use pv_mockgen::generate_mock_client;
use pv_scanner::scan::is_orm_schema_artifact;
use pv_scanner::ScanResult;

use crate::{manifest, templates};

/// Secrets files that, when present, stop a new one being synthesized.
const ENV_FILES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.development",
    ".env.development.local",
];

/// Identifier of a patch step that changed the file map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchStep {
    ManifestRewrite,
    OrmSchemaRemoved,
    OrmWrapperMocked,
    MiddlewareNeutralized,
    EnvSynthesized,
}

impl PatchStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManifestRewrite => "manifest-rewrite",
            Self::OrmSchemaRemoved => "orm-schema-removed",
            Self::OrmWrapperMocked => "orm-wrapper-mocked",
            Self::MiddlewareNeutralized => "middleware-neutralized",
            Self::EnvSynthesized => "env-synthesized",
        }
    }
}

impl std::fmt::Display for PatchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchResult {
    pub files: FileMap,
    /// Steps that changed something, in the order they ran.
    pub applied: Vec<PatchStep>,
    pub notes: Vec<String>,
}

/// Patch `files` with the default patcher settings.
pub fn patch(files: &FileMap, scan: &ScanResult) -> PatchResult {
    Patcher::default().patch(files, scan)
}

#[derive(Debug, Clone, Default)]
pub struct Patcher {
    config: PatcherConfig,
}

impl Patcher {
    pub fn new(config: PatcherConfig) -> Self {
        Self { config }
    }

    pub fn patch(&self, input: &FileMap, scan: &ScanResult) -> PatchResult {
        let mut run = PatchRun {
            files: input.clone(),
            applied: Vec::new(),
            notes: Vec::new(),
        };

        self.rewrite_manifest(&mut run, scan);
        if scan.has_orm {
            remove_orm_schema(&mut run);
            self.mock_wrapper(&mut run, scan);
        }
        if let Some(path) = &scan.middleware_path {
            neutralize_middleware(&mut run, path);
        }
        if scan.requires_secrets || scan.has_orm || scan.has_hosted_db {
            self.synthesize_env(&mut run, scan);
        }

        tracing::info!(
            applied = ?run.applied,
            notes = run.notes.len(),
            "project patched for sandbox"
        );
        TraceEvent::PatchApplied {
            applied: run.applied.iter().map(|s| s.as_str().to_owned()).collect(),
            notes: run.notes.len(),
            files_before: input.len(),
            files_after: run.files.len(),
        }
        .emit();

        PatchResult {
            files: run.files,
            applied: run.applied,
            notes: run.notes,
        }
    }

    fn rewrite_manifest(&self, run: &mut PatchRun, scan: &ScanResult) {
        let Some((key, text)) = files::lookup(&run.files, MANIFEST_PATH) else {
            run.notes.push("manifest-rewrite: no package.json; skipped".to_owned());
            return;
        };
        let key = key.clone();
        let Some(rewrite) =
            manifest::rewrite(text, &scan.native_dependencies, scan.framework, &self.config)
        else {
            run.notes.push("manifest-rewrite: package.json unparseable; skipped".to_owned());
            return;
        };

        run.notes
            .extend(rewrite.notes.into_iter().map(|n| format!("manifest-rewrite: {n}")));
        if rewrite.changes.is_empty() {
            run.notes.push("manifest-rewrite: nothing to change".to_owned());
            return;
        }
        run.notes
            .extend(rewrite.changes.into_iter().map(|c| format!("manifest-rewrite: {c}")));
        run.files.insert(key, rewrite.text);
        run.applied.push(PatchStep::ManifestRewrite);
    }

    fn mock_wrapper(&self, run: &mut PatchRun, scan: &ScanResult) {
        let path = scan
            .orm_wrapper_path
            .clone()
            .unwrap_or_else(|| self.config.wrapper_default_path.clone());
        if !scan.can_auto_patch_to_fast {
            run.notes.push(format!(
                "orm-wrapper-mocked: {} files bypass the wrapper and still import the real client",
                scan.orm_direct_importers.len()
            ));
        }
        run.notes.push(format!("orm-wrapper-mocked: {path}"));
        run.files.insert(path, generate_mock_client());
        run.applied.push(PatchStep::OrmWrapperMocked);
    }

    fn synthesize_env(&self, run: &mut PatchRun, scan: &ScanResult) {
        if let Some(existing) = ENV_FILES
            .iter()
            .find(|name| files::lookup(&run.files, name).is_some())
        {
            run.notes
                .push(format!("env-synthesized: {existing} already present; skipped"));
            return;
        }
        let body = templates::env_file(self.config.dev_port, &scan.env_vars);
        run.notes
            .push(format!("env-synthesized: {}", self.config.env_file));
        run.files.insert(self.config.env_file.clone(), body);
        run.applied.push(PatchStep::EnvSynthesized);
    }
}

struct PatchRun {
    files: FileMap,
    applied: Vec<PatchStep>,
    notes: Vec<String>,
}

fn remove_orm_schema(run: &mut PatchRun) {
    let targets: Vec<String> = run
        .files
        .keys()
        .filter(|p| is_orm_schema_artifact(p))
        .cloned()
        .collect();
    if targets.is_empty() {
        run.notes
            .push("orm-schema-removed: no schema or generated client; skipped".to_owned());
        return;
    }
    for path in targets {
        run.files.remove(&path);
        run.notes.push(format!("orm-schema-removed: {path}"));
    }
    run.applied.push(PatchStep::OrmSchemaRemoved);
}

fn neutralize_middleware(run: &mut PatchRun, path: &str) {
    let Some((key, _)) = files::lookup(&run.files, path) else {
        run.notes
            .push(format!("middleware-neutralized: {path} not found; skipped"));
        return;
    };
    let key = key.clone();
    let body = templates::passthrough_middleware(&key);
    run.files.insert(key.clone(), body);
    run.notes.push(format!("middleware-neutralized: {key}"));
    run.applied.push(PatchStep::MiddlewareNeutralized);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_ids_match_serde() {
        for step in [
            PatchStep::ManifestRewrite,
            PatchStep::OrmSchemaRemoved,
            PatchStep::OrmWrapperMocked,
            PatchStep::MiddlewareNeutralized,
            PatchStep::EnvSynthesized,
        ] {
            let json = serde_json::to_value(step).unwrap();
            assert_eq!(json, step.as_str());
        }
    }
}
