//! Dependency manifest rewrite.

use serde_json::{Map, Value};

use pv_domain::config::PatcherConfig;
use pv_domain::manifest::DEPENDENCY_SECTIONS;
use pv_scanner::FrameworkFamily;

/// Dev-server command that binds `host:port` for a framework family.
/// `None` when the family is unknown and the existing script is kept.
pub fn start_command_for(framework: FrameworkFamily, host: &str, port: u16) -> Option<String> {
    match framework {
        FrameworkFamily::FullStack => Some(format!("next dev -H {host} -p {port}")),
        FrameworkFamily::BundlerSpa => Some(format!("vite --host {host} --port {port}")),
        FrameworkFamily::LegacySpa => Some(format!("HOST={host} PORT={port} react-scripts start")),
        FrameworkFamily::Unknown => None,
    }
}

/// Outcome of rewriting one manifest.
pub(crate) struct ManifestRewrite {
    pub text: String,
    pub changes: Vec<String>,
    pub notes: Vec<String>,
}

/// Strip `denied` packages, drop the post-install hook and pin the dev
/// script to the sandbox bind. Returns `None` when `text` is not a JSON
/// object.
pub(crate) fn rewrite(
    text: &str,
    denied: &[String],
    framework: FrameworkFamily,
    config: &PatcherConfig,
) -> Option<ManifestRewrite> {
    let Ok(Value::Object(mut root)) = serde_json::from_str::<Value>(text) else {
        return None;
    };
    let mut changes = Vec::new();
    let mut notes = Vec::new();

    for section in DEPENDENCY_SECTIONS {
        let Some(deps) = root.get_mut(*section).and_then(Value::as_object_mut) else {
            continue;
        };
        let before: Vec<String> = deps.keys().cloned().collect();
        deps.retain(|name, _| !denied.contains(name));
        for name in before.iter().filter(|n| !deps.contains_key(*n)) {
            changes.push(format!("removed native dependency `{name}` from {section}"));
        }
    }

    if !root.get("scripts").is_some_and(Value::is_object) {
        root.insert("scripts".into(), Value::Object(Map::new()));
    }
    let scripts = root.get_mut("scripts").and_then(Value::as_object_mut)?;
    if let Some(hook) = scripts.get("postinstall").cloned() {
        scripts.retain(|name, _| name != "postinstall");
        changes.push(format!(
            "removed postinstall hook `{}`",
            hook.as_str().unwrap_or("<non-string>")
        ));
    }

    match start_command_for(framework, &config.dev_host, config.dev_port) {
        Some(command) => {
            let current = scripts.get("dev").and_then(Value::as_str);
            if current != Some(command.as_str()) {
                changes.push(format!("dev script set to `{command}`"));
                scripts.insert("dev".into(), Value::String(command));
            }
        }
        None => notes.push("framework unknown; dev script left unchanged".to_owned()),
    }

    let mut text = serde_json::to_string_pretty(&Value::Object(root)).ok()?;
    text.push('\n');
    Some(ManifestRewrite {
        text,
        changes,
        notes,
    })
}
