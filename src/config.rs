//! Engine configuration, loaded from YAML

use crate::citation::Mode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Settings for a [`crate::CiteSupport`] instance. Every field is optional
/// in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiteConfig {
    /// Verbose protocol tracing
    pub debug: bool,
    /// Mode assumed until the processor reports one
    pub mode: Mode,
    pub default_locale: String,
    pub default_style: String,
    /// Restore slots at fixed `citeme` pegs and persist the peg map
    pub demo: bool,
    /// Assumed bibliography width in px, used for second-field alignment
    pub bibliography_width: u32,
}

impl Default for CiteConfig {
    fn default() -> Self {
        Self {
            debug: false,
            mode: Mode::Note,
            default_locale: "en-US".to_string(),
            default_style: "american-medical-association".to_string(),
            demo: false,
            bibliography_width: 680,
        }
    }
}

impl CiteConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_gives_defaults() {
        assert_eq!(CiteConfig::from_yaml_str("").unwrap(), CiteConfig::default());
        assert_eq!(CiteConfig::from_yaml_str("{}").unwrap(), CiteConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_named_fields() {
        let config = CiteConfig::from_yaml_str("mode: in-text\ndemo: true\nbibliography_width: 500\n").unwrap();
        assert_eq!(config.mode, Mode::InText);
        assert!(config.demo);
        assert_eq!(config.bibliography_width, 500);
        assert_eq!(config.default_style, "american-medical-association");
    }

    #[test]
    fn bad_mode_is_a_parse_error() {
        let err = CiteConfig::from_yaml_str("mode: endnote").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_locale: fr-FR").unwrap();
        let config = CiteConfig::load(file.path()).unwrap();
        assert_eq!(config.default_locale, "fr-FR");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CiteConfig::load("/nonexistent/citesupport.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
