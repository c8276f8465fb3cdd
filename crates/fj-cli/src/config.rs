//! `fj` settings, read from TOML.

use crate::{CliError, Result};
use fj_lower::LowerOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FjConfig {
    pub lowering: LowerOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension of an artifact written next to its input.
    pub extension: String,
    /// Print the class listing after lowering.
    pub listing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "fjc".to_string(),
            listing: false,
        }
    }
}

impl FjConfig {
    /// Loads `config_path` if given, otherwise the first of `./fj.toml`,
    /// `~/.fj.toml` and `<config dir>/fj/config.toml` that exist, each
    /// overriding the previous one.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }
        let mut config = Self::default();
        let candidates = [
            Some(PathBuf::from("fj.toml")),
            dirs::home_dir().map(|home| home.join(".fj.toml")),
            Self::default_config_path(),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                config = config.merge(Self::load_from_file(&path)?);
            }
        }
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("loading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))
    }

    /// Whole-file precedence: a later file replaces an earlier one.
    pub fn merge(self, other: Self) -> Self {
        other
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fj").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: FjConfig = toml::from_str("[lowering]\nparallel = true\n").unwrap();
        assert!(config.lowering.parallel);
        assert!(config.lowering.line_numbers);
        assert_eq!(config.lowering.class_version, fj_lower::DEFAULT_CLASS_VERSION);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn config_survives_a_save() {
        let mut config = FjConfig::default();
        config.lowering.fail_fast = true;
        config.output.extension = "bin".to_string();
        let file = NamedTempFile::new().unwrap();

        config.save_to_file(file.path()).unwrap();
        let loaded = FjConfig::load(Some(file.path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn unreadable_config_is_reported() {
        let err = FjConfig::load_from_file(Path::new("/nonexistent/fj.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
