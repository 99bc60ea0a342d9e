//! Configuration types deserialized from `archfpga.toml`.

use archfpga_diagnostics::DiagnosticCode;
use serde::Deserialize;

/// The top-level build options.
#[derive(Debug, Default, Deserialize)]
pub struct ArchConfig {
    /// Settings for the model build itself.
    #[serde(default)]
    pub build: BuildConfig,
    /// Which diagnostic codes to promote or silence.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Settings that change which passes run while building the model.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Whether leaf pb_types are checked for timing annotations against
    /// their models.
    #[serde(default = "default_true")]
    pub timing_enabled: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timing_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Diagnostic policy: codes listed in `deny` fail the build, codes listed in
/// `allow` are dropped.
#[derive(Debug, Default, Deserialize)]
pub struct DiagnosticsConfig {
    /// Codes to treat as construction failures.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Codes to suppress.
    #[serde(default)]
    pub allow: Vec<String>,
}

impl ArchConfig {
    /// Returns `true` if `code` is listed in `[diagnostics] deny`.
    pub fn is_denied(&self, code: DiagnosticCode) -> bool {
        let code = code.to_string();
        self.diagnostics.deny.iter().any(|c| *c == code)
    }

    /// Returns `true` if `code` is listed in `[diagnostics] allow`.
    pub fn is_allowed(&self, code: DiagnosticCode) -> bool {
        let code = code.to_string();
        self.diagnostics.allow.iter().any(|c| *c == code)
    }

    /// Returns a copy of the default configuration with timing checks off.
    pub fn without_timing() -> Self {
        Self {
            build: BuildConfig {
                timing_enabled: false,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archfpga_diagnostics::Category;

    #[test]
    fn default_enables_timing() {
        let config = ArchConfig::default();
        assert!(config.build.timing_enabled);
        assert!(config.diagnostics.deny.is_empty());
        assert!(config.diagnostics.allow.is_empty());
        assert!(!ArchConfig::without_timing().build.timing_enabled);
    }

    #[test]
    fn policy_lookups() {
        let config = ArchConfig {
            diagnostics: DiagnosticsConfig {
                deny: vec!["T300".to_string()],
                allow: vec!["W302".to_string()],
            },
            ..ArchConfig::default()
        };
        assert!(config.is_denied(DiagnosticCode::new(Category::Timing, 300)));
        assert!(!config.is_denied(DiagnosticCode::new(Category::Timing, 301)));
        assert!(config.is_allowed(DiagnosticCode::new(Category::Warning, 302)));
    }
}
