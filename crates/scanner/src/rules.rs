//! Scanner rule set: deny-list, thresholds and fingerprints.

use std::collections::BTreeSet;

use pv_domain::config::ScannerConfig;

/// Packages that need a platform-specific compiled binary the sandbox
/// cannot load.
pub const NATIVE_DENY_LIST: &[&str] = &[
    "@node-rs/argon2",
    "@node-rs/bcrypt",
    "@tensorflow/tfjs-node",
    "argon2",
    "bcrypt",
    "better-sqlite3",
    "canvas",
    "cpu-features",
    "leveldown",
    "libxmljs",
    "node-sass",
    "playwright",
    "puppeteer",
    "re2",
    "serialport",
    "sharp",
    "sodium-native",
    "sqlite3",
    "usb",
    "zeromq",
];

/// Manifest entries that mean the ORM is in play.
pub const ORM_PACKAGES: &[&str] = &["@prisma/client", "prisma"];

/// Manifest entries for the hosted database service client.
pub const HOSTED_DB_PACKAGES: &[&str] = &[
    "@supabase/supabase-js",
    "@supabase/ssr",
    "@supabase/auth-helpers-nextjs",
];

/// Path prefixes holding generated ORM client code.
pub const ORM_GENERATED_PREFIXES: &[&str] = &[
    "node_modules/.prisma/",
    "node_modules/@prisma/client/",
    "prisma/generated/",
    "src/generated/prisma/",
    "generated/prisma/",
];

/// File stems that conventionally name the ORM wrapper module.
pub const WRAPPER_STEMS: &[&str] = &["prisma", "db", "database", "client"];

pub const MIDDLEWARE_PATHS: &[&str] = &[
    "middleware.ts",
    "middleware.js",
    "src/middleware.ts",
    "src/middleware.js",
];

pub const FULL_STACK_CONFIGS: &[&str] = &[
    "next.config.js",
    "next.config.mjs",
    "next.config.cjs",
    "next.config.ts",
];

pub const BUNDLER_CONFIGS: &[&str] = &[
    "vite.config.js",
    "vite.config.mjs",
    "vite.config.cjs",
    "vite.config.ts",
    "vite.config.mts",
];

/// Environment reads that every runtime provides and never need a secret.
pub const BUILTIN_ENV_VARS: &[&str] = &["NODE_ENV", "MODE", "DEV", "PROD", "SSR", "BASE_URL"];

pub const NATIVE_WEIGHT: u32 = 3;
pub const ORM_WEIGHT: u32 = 2;
pub const HOSTED_DB_WEIGHT: u32 = 1;
pub const FRAMEWORK_WEIGHT: u32 = 1;

/// Tunable part of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRules {
    pub native_deny_list: BTreeSet<String>,
    pub full_threshold: u32,
    pub max_direct_orm_imports: usize,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            native_deny_list: NATIVE_DENY_LIST.iter().map(|s| (*s).to_owned()).collect(),
            full_threshold: 3,
            max_direct_orm_imports: 2,
        }
    }
}

impl ScanRules {
    pub fn from_config(config: &ScannerConfig) -> Self {
        let mut rules = Self::default();
        rules
            .native_deny_list
            .extend(config.extra_native_packages.iter().cloned());
        rules.full_threshold = config.full_threshold;
        rules.max_direct_orm_imports = config.max_direct_orm_imports;
        rules
    }

    pub fn is_denied(&self, package: &str) -> bool {
        self.native_deny_list.contains(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_extends_deny_list() {
        let config = ScannerConfig {
            extra_native_packages: vec!["duckdb".into()],
            full_threshold: 4,
            max_direct_orm_imports: 0,
        };
        let rules = ScanRules::from_config(&config);
        assert!(rules.is_denied("duckdb"));
        assert!(rules.is_denied("bcrypt"));
        assert_eq!(rules.full_threshold, 4);
        assert_eq!(rules.max_direct_orm_imports, 0);
    }

    #[test]
    fn deny_list_is_sorted_and_unique() {
        let mut sorted = NATIVE_DENY_LIST.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, NATIVE_DENY_LIST);
    }
}
