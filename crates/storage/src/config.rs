use saldo_core::{DEFAULT_DATE_FORMATS, DEFAULT_EXCLUSION_PHRASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "saldo.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("CSV delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ruleset file. Relative paths resolve against the config directory.
    pub rules_path: PathBuf,
    /// Uploaded rows whose title contains one of these are skipped.
    pub exclusion_phrases: Vec<String>,
    /// Tried in order for text dates.
    pub date_formats: Vec<String>,
    pub csv_delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("categorias.json"),
            exclusion_phrases: vec![DEFAULT_EXCLUSION_PHRASE.to_string()],
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            csv_delimiter: ',',
        }
    }
}

impl Config {
    /// A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.delimiter()?;
        Ok(config)
    }

    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.csv_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(ConfigError::InvalidDelimiter(self.csv_delimiter))
    }

    pub fn resolve_rules_path(&self, base_dir: &Path) -> PathBuf {
        if self.rules_path.is_absolute() {
            self.rules_path.clone()
        } else {
            base_dir.join(&self.rules_path)
        }
    }
}

/// Per-user config directory for saldo, if the platform has one.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "saldo", "Saldo").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
