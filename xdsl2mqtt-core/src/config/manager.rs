//! Locating, reading and validating the configuration file

use std::path::{Path, PathBuf};

use super::settings::AppConfig;
use crate::error::{ConfigError, ConfigResult};

/// File name looked up in the working directory and the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Sub-directory of the user configuration directory
pub const CONFIG_DIR_NAME: &str = "xdsl2mqtt";

/// Loads [`AppConfig`] from a TOML file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for an explicit file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a manager for `path`, or for [`Self::default_path`] if `None`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no path is given and the
    /// platform has no configuration directory.
    pub fn resolve(path: Option<PathBuf>) -> ConfigResult<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Self::default_path().map(Self::new),
        }
    }

    /// `config.toml` in the working directory if it exists, otherwise
    /// `<config dir>/xdsl2mqtt/config.toml`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if the working directory has no
    /// config file and the platform has no configuration directory.
    pub fn default_path() -> ConfigResult<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Path this manager reads
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, parses and validates the file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// see [`Self::from_toml`].
    pub fn load(&self) -> ConfigResult<AppConfig> {
        tracing::debug!(path = %self.path.display(), "Loading configuration");
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, wrong value types or
    /// unknown sections, and the errors of [`AppConfig::validate`].
    pub fn from_toml(content: &str) -> ConfigResult<AppConfig> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
