use pv_domain::config::{Config, ConfigSeverity};

#[test]
fn default_dev_server_binds_all_interfaces() {
    let config = Config::default();
    assert_eq!(config.patcher.dev_host, "0.0.0.0");
    assert_eq!(config.patcher.dev_port, 3000);
}

#[test]
fn default_config_is_valid() {
    assert!(Config::default().validate().is_empty());
}

#[test]
fn empty_toml_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.scanner.full_threshold, 3);
    assert_eq!(config.scanner.max_direct_orm_imports, 2);
    assert_eq!(config.boot.install_command, "npm install");
    assert_eq!(config.boot.log_capacity, 500);
    assert_eq!(config.patcher.env_file, ".env.local");
}

#[test]
fn partial_sections_parse() {
    let toml_str = r#"
[scanner]
extra_native_packages = ["duckdb"]

[boot]
start_command = "pnpm dev"
log_capacity = 50
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.scanner.extra_native_packages, vec!["duckdb".to_string()]);
    assert_eq!(config.scanner.full_threshold, 3);
    assert_eq!(config.boot.start_command, "pnpm dev");
    assert_eq!(config.boot.install_command, "npm install");
    assert_eq!(config.boot.log_capacity, 50);
}

#[test]
fn zero_port_and_capacity_are_errors() {
    let mut config = Config::default();
    config.patcher.dev_port = 0;
    config.boot.log_capacity = 0;
    let issues = config.validate();
    let fields: Vec<_> = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .map(|e| e.field.as_str())
        .collect();
    assert!(fields.contains(&"patcher.dev_port"));
    assert!(fields.contains(&"boot.log_capacity"));
}

#[test]
fn empty_start_command_is_error() {
    let mut config = Config::default();
    config.boot.start_command = "  ".into();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "boot.start_command" && e.severity == ConfigSeverity::Error));
}

#[test]
fn zero_threshold_is_warning() {
    let mut config = Config::default();
    config.scanner.full_threshold = 0;
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert!(issues[0].to_string().starts_with("[WARN] scanner.full_threshold"));
}

#[test]
fn load_missing_file_yields_defaults() {
    let config = Config::load(std::path::Path::new("/nonexistent/preview.toml")).unwrap();
    assert_eq!(config.boot.required_runtime, "node");
}
