//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ArchConfig;
use archfpga_diagnostics::DiagnosticCode;
use std::path::Path;

/// The name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "archfpga.toml";

/// Loads and validates `archfpga.toml` from a directory.
pub fn load_config(dir: &Path) -> Result<ArchConfig, ConfigError> {
    let content = std::fs::read_to_string(dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ArchConfig, ConfigError> {
    let config: ArchConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that every listed code is well formed and that no code is both
/// denied and allowed.
fn validate_config(config: &ArchConfig) -> Result<(), ConfigError> {
    let lists = [
        ("deny", &config.diagnostics.deny),
        ("allow", &config.diagnostics.allow),
    ];
    for (list, codes) in lists {
        for code in codes {
            code.parse::<DiagnosticCode>().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "invalid diagnostic code '{code}' in diagnostics.{list}"
                ))
            })?;
        }
    }
    if let Some(code) = config
        .diagnostics
        .deny
        .iter()
        .find(|c| config.diagnostics.allow.contains(c))
    {
        return Err(ConfigError::ValidationError(format!(
            "'{code}' is both denied and allowed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = load_config_from_str("").unwrap();
        assert!(config.build.timing_enabled);
        assert!(config.diagnostics.deny.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[build]
timing_enabled = false

[diagnostics]
deny = ["T300"]
allow = ["T301", "I303"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.build.timing_enabled);
        assert_eq!(config.diagnostics.deny, vec!["T300"]);
        assert_eq!(config.diagnostics.allow.len(), 2);
    }

    #[test]
    fn reject_malformed_code() {
        let err = load_config_from_str("[diagnostics]\ndeny = [\"T30\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(format!("{err}").contains("diagnostics.deny"));
    }

    #[test]
    fn reject_denied_and_allowed() {
        let toml = "[diagnostics]\ndeny = [\"W302\"]\nallow = [\"W302\"]\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(format!("{err}").contains("'W302' is both denied and allowed"));
    }

    #[test]
    fn reject_bad_toml() {
        let err = load_config_from_str("[build\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[diagnostics]\ndeny = [\"T300\"]\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.diagnostics.deny, vec!["T300"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
