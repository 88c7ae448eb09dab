//! Session configuration loaded from RON.
//!
//! Every field has a default, so a config file only needs the fields it
//! changes:
//!
//! ```ron
//! (
//!     seed: Some(42),
//!     auto_render: true,
//!     render: (use_color: false),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ascii::AsciiConfig;

/// Error type for config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Options for a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed of the first game; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Emit a `state` response after every change.
    pub auto_state: bool,
    /// Emit a `frame` response after every change.
    pub auto_render: bool,
    /// Emit `log` responses describing each tick.
    pub combat_log: bool,
    /// ASCII rendering options.
    pub render: AsciiConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            auto_state: false,
            auto_render: false,
            combat_log: true,
            render: AsciiConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(ron)?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_from_empty_struct() {
        let config = SessionConfig::from_ron_str("()").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert!(config.combat_log);
        assert!(config.render.use_color);
    }

    #[test]
    fn test_partial_override() {
        let config =
            SessionConfig::from_ron_str("(seed: Some(42), auto_state: true, render: (show_fog: false))")
                .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(config.auto_state);
        assert!(!config.render.show_fog);
        assert!(config.render.show_legend);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(seed: Some(7), combat_log: false)").unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.seed, Some(7));
        assert!(!config.combat_log);
    }

    #[test]
    fn test_load_errors() {
        let missing = SessionConfig::load("/definitely/not/here.ron");
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

        let bad = SessionConfig::from_ron_str("(seed: \"x\")");
        assert!(matches!(bad, Err(ConfigError::ParseError(_))));

        assert_eq!(
            SessionConfig::load_or_default(None).unwrap(),
            SessionConfig::default()
        );
    }
}
