//! Lenient read-only view over a `package.json` dependency manifest.
//!
//! Generated manifests are untrusted. Anything that fails to parse as a
//! JSON object is treated as "no manifest" rather than an error.

use serde_json::{Map, Value};

/// Conventional location of the dependency manifest.
pub const MANIFEST_PATH: &str = "package.json";

/// Manifest sections that list installable packages.
pub const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    root: Map<String, Value>,
}

impl PackageManifest {
    /// Parse manifest text. Returns `None` for anything but a JSON object.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(root)) => Some(Self { root }),
            _ => None,
        }
    }

    /// All package names across every dependency section, deduplicated
    /// and sorted.
    pub fn dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = DEPENDENCY_SECTIONS
            .iter()
            .filter_map(|section| self.root.get(*section).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        DEPENDENCY_SECTIONS.iter().any(|section| {
            self.root
                .get(*section)
                .and_then(Value::as_object)
                .is_some_and(|deps| deps.contains_key(name))
        })
    }

    /// A script command by name, if present and a string.
    pub fn script(&self, name: &str) -> Option<&str> {
        self.root
            .get("scripts")
            .and_then(Value::as_object)
            .and_then(|scripts| scripts.get(name))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependencies_from_all_sections() {
        let m = PackageManifest::parse(
            r#"{"dependencies":{"next":"14"},"devDependencies":{"prisma":"5"},"peerDependencies":{"react":"18"}}"#,
        )
        .unwrap();
        assert_eq!(m.dependency_names(), vec!["next", "prisma", "react"]);
        assert!(m.has_dependency("prisma"));
        assert!(!m.has_dependency("vite"));
    }

    #[test]
    fn non_object_is_none() {
        assert!(PackageManifest::parse("[1,2]").is_none());
        assert!(PackageManifest::parse("{ not json").is_none());
        assert!(PackageManifest::parse("").is_none());
    }

    #[test]
    fn non_object_sections_are_ignored() {
        let m = PackageManifest::parse(r#"{"dependencies":"oops","scripts":{"dev":42}}"#).unwrap();
        assert!(m.dependency_names().is_empty());
        assert_eq!(m.script("dev"), None);
    }

    #[test]
    fn script_lookup() {
        let m = PackageManifest::parse(r#"{"scripts":{"dev":"next dev"}}"#).unwrap();
        assert_eq!(m.script("dev"), Some("next dev"));
    }
}
