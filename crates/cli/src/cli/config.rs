use pv_domain::config::{Config, ConfigSeverity};

/// Validation issues grouped by config section, errors before warnings.
/// The flag is false when any issue is an error.
pub fn report(config: &Config, config_path: &str) -> (String, bool) {
    let mut issues = config.validate();
    if issues.is_empty() {
        return (format!("{config_path}: ok\n"), true);
    }
    issues.sort_by_key(|issue| {
        let section = issue.field.split('.').next().unwrap_or_default().to_owned();
        (section, issue.severity != ConfigSeverity::Error)
    });

    let mut out = String::new();
    let mut section = "";
    for issue in &issues {
        let current = issue.field.split('.').next().unwrap_or_default();
        if current != section {
            section = current;
            out.push_str(&format!("[{section}]\n"));
        }
        out.push_str(&format!("  {issue}\n"));
    }

    let errors = issues
        .iter()
        .filter(|issue| issue.severity == ConfigSeverity::Error)
        .count();
    let warnings = issues.len() - errors;
    out.push_str(&format!("{config_path}: {errors} error(s), {warnings} warning(s)\n"));
    (out, errors == 0)
}

/// `previewctl config validate`. Returns false when the config has errors.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let (text, ok) = report(config, config_path);
    print!("{text}");
    ok
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let (text, ok) = report(&Config::default(), "preview.toml");
        assert!(ok);
        assert_eq!(text, "preview.toml: ok\n");
    }

    #[test]
    fn zero_port_fails() {
        let mut config = Config::default();
        config.patcher.dev_port = 0;
        let (text, ok) = report(&config, "preview.toml");
        assert!(!ok);
        assert!(text.starts_with("[patcher]\n  [ERROR] patcher.dev_port"), "{text}");
        assert!(text.ends_with("preview.toml: 1 error(s), 0 warning(s)\n"));
    }

    #[test]
    fn warnings_alone_pass() {
        let mut config = Config::default();
        config.scanner.full_threshold = 0;
        let (text, ok) = report(&config, "preview.toml");
        assert!(ok);
        assert!(text.contains("[scanner]\n  [WARN] scanner.full_threshold"), "{text}");
    }

    #[test]
    fn shown_config_parses_back() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.boot.start_command, "npm run dev");
    }
}
