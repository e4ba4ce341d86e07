use pv_domain::FileMap;
use pv_scanner::{scan, FrameworkFamily, Recommendation, ScanRules, Scanner};

fn project(entries: &[(&str, &str)]) -> FileMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn risky_project() -> FileMap {
    project(&[
        (
            "package.json",
            r#"{
  "name": "shop",
  "scripts": { "dev": "next dev", "postinstall": "prisma generate" },
  "dependencies": { "next": "14.2.0", "@prisma/client": "5.10.0", "bcrypt": "5.1.1" },
  "devDependencies": { "prisma": "5.10.0" }
}"#,
        ),
        ("prisma/schema.prisma", "model User { id String @id }"),
        (
            "lib/prisma.ts",
            "import { PrismaClient } from '@prisma/client';\nexport const prisma = new PrismaClient();\n",
        ),
        ("app/page.tsx", "import { prisma } from '@/lib/prisma';\nexport default function Page() { return null }\n"),
        ("next.config.js", "module.exports = {};"),
    ])
}

#[test]
fn empty_project_has_no_signals_and_is_fast() {
    let result = scan(&FileMap::new());
    assert!(result.is_clean());
    assert_eq!(result.score, 0);
    assert_eq!(result.recommended, Recommendation::Fast);
    assert!(result.reasons.is_empty());
    assert!(result.can_auto_patch_to_fast);
}

#[test]
fn native_dependency_plus_orm_schema_recommends_full() {
    let result = scan(&risky_project());
    assert_eq!(result.native_dependencies, vec!["bcrypt"]);
    assert!(result.has_orm);
    assert_eq!(result.orm_schema_paths, vec!["prisma/schema.prisma"]);
    assert_eq!(result.orm_wrapper_path.as_deref(), Some("lib/prisma.ts"));
    assert!(result.orm_direct_importers.is_empty());
    assert!(result.has_postinstall);
    assert_eq!(result.framework, FrameworkFamily::FullStack);
    assert!(result.score >= 3);
    assert_eq!(result.score, 5);
    assert_eq!(result.recommended, Recommendation::Full);
    assert!(result.reasons.iter().any(|r| r.contains("bcrypt")));
}

#[test]
fn scan_is_pure() {
    let files = risky_project();
    let first = scan(&files);
    let second = scan(&files);
    assert_eq!(first, second);
}

#[test]
fn each_native_dependency_is_itemized() {
    let files = project(&[(
        "package.json",
        r#"{"dependencies":{"sharp":"0.33"},"optionalDependencies":{"canvas":"2"}}"#,
    )]);
    let result = scan(&files);
    assert_eq!(result.native_dependencies, vec!["canvas", "sharp"]);
    assert_eq!(result.score, 3);
    assert_eq!(result.reasons.len(), 2);
    assert_eq!(result.recommended, Recommendation::Full);
}

#[test]
fn orm_alone_stays_fast() {
    let files = project(&[("prisma/schema.prisma", "model Post { id Int @id }")]);
    let result = scan(&files);
    assert_eq!(result.score, 2);
    assert_eq!(result.recommended, Recommendation::Fast);
}

#[test]
fn hosted_db_with_secrets_and_bundler_adds_up() {
    let files = project(&[
        ("package.json", r#"{"dependencies":{"@supabase/supabase-js":"2","vite":"5"}}"#),
        ("vite.config.ts", "export default {}"),
        (
            "src/supabase.ts",
            "import { createClient } from '@supabase/supabase-js';\nexport const sb = createClient(import.meta.env.VITE_SUPABASE_URL, import.meta.env.VITE_SUPABASE_ANON_KEY);\n",
        ),
    ]);
    let result = scan(&files);
    assert!(result.has_hosted_db);
    assert!(result.requires_secrets);
    assert_eq!(result.framework, FrameworkFamily::BundlerSpa);
    assert_eq!(result.score, 2);
    assert_eq!(result.recommended, Recommendation::Fast);
}

#[test]
fn pervasive_direct_imports_block_auto_patch() {
    let mut files = risky_project();
    for name in ["a", "b", "c"] {
        files.insert(
            format!("app/{name}/route.ts"),
            "import { Prisma } from '@prisma/client';".to_owned(),
        );
    }
    let result = scan(&files);
    assert_eq!(result.orm_direct_importers.len(), 3);
    assert!(!result.can_auto_patch_to_fast);

    files.remove("app/c/route.ts");
    assert!(scan(&files).can_auto_patch_to_fast);
}

#[test]
fn middleware_is_detected() {
    let files = project(&[("src/middleware.ts", "export function middleware() {}")]);
    let result = scan(&files);
    assert_eq!(result.middleware_path.as_deref(), Some("src/middleware.ts"));
}

#[test]
fn custom_threshold_changes_recommendation() {
    let rules = ScanRules {
        full_threshold: 2,
        ..ScanRules::default()
    };
    let files = project(&[("prisma/schema.prisma", "")]);
    let result = Scanner::new(rules).scan(&files);
    assert_eq!(result.recommended, Recommendation::Full);
}
