//! Configuration file for the shell process
//!
//! This is distinct from the persisted [`SettingsBlob`](crate::SettingsBlob):
//! it describes where the shell keeps its files and how it runs, and is only
//! ever written by the user.

use crate::error::{ConfigError, ConfigResult};
use crate::{
    DEFAULT_KEYS_FILE, DEFAULT_PEER_COUNT_TARGET, DEFAULT_REFRESH_INTERVAL_MS,
    DEFAULT_SETTINGS_FILE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shell process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Directory holding settings, keys and plugin data
    pub data_dir: PathBuf,
    /// Settings file name, relative to `data_dir`
    pub settings_file: String,
    /// Key store file name, relative to `data_dir`
    pub keys_file: String,
    /// Period of the refresh timer
    pub refresh_interval_ms: u64,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Plugins loaded at startup
    pub plugins: Vec<String>,
    /// Peer target applied when the settings file has none
    pub peer_count_target: u32,
    /// Key store encryption parameters
    pub key_store: KeyStoreConfig,
}

/// Scrypt cost parameters for newly sealed keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyStoreConfig {
    pub scrypt_n: u32,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            settings_file: DEFAULT_SETTINGS_FILE.to_string(),
            keys_file: DEFAULT_KEYS_FILE.to_string(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            log_level: "info".to_string(),
            plugins: Vec::new(),
            peer_count_target: DEFAULT_PEER_COUNT_TARGET,
            key_store: KeyStoreConfig::default(),
        }
    }
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            scrypt_n: 16384,
            scrypt_r: 8,
            scrypt_p: 8,
        }
    }
}

impl ShellConfig {
    /// Platform data directory, falling back to `./.aleth-zero`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("aleth-zero"))
            .unwrap_or_else(|| PathBuf::from(".aleth-zero"))
    }

    /// Loads the configuration file, or the defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::invalid("refresh_interval_ms must be positive"));
        }
        if self.settings_file.trim().is_empty() || self.keys_file.trim().is_empty() {
            return Err(ConfigError::invalid("settings_file and keys_file must be named"));
        }
        if self.settings_file == self.keys_file {
            return Err(ConfigError::invalid(
                "settings_file and keys_file must differ",
            ));
        }
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn keys_path(&self) -> PathBuf {
        self.data_dir.join(&self.keys_file)
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.data_dir.join("plugins")
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.peer_count_target, DEFAULT_PEER_COUNT_TARGET);
        assert!(config.settings_path().ends_with(DEFAULT_SETTINGS_FILE));
        assert!(config.keys_path().ends_with(DEFAULT_KEYS_FILE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = ShellConfig::default();
        config.refresh_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfiguration(_))
        ));

        let mut config = ShellConfig::default();
        config.keys_file = config.settings_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ShellConfig = toml::from_str("refresh_interval_ms = 250\n").unwrap();
        assert_eq!(config.refresh_interval_ms, 250);
        assert_eq!(config.keys_file, DEFAULT_KEYS_FILE);
        assert_eq!(config.key_store, KeyStoreConfig::default());
    }
}
