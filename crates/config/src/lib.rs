//! Aleth Configuration Module
//!
//! This module provides the persisted settings blob and the shell
//! configuration file for the aleth-zero control shell.

pub mod error;
pub mod settings;
pub mod shell_config;

pub use error::{ConfigError, ConfigResult};
pub use settings::{SettingsBlob, SettingsFlags, SettingsScope, SettingsStore};
pub use shell_config::{KeyStoreConfig, ShellConfig};

/// Default number of peers the node tries to stay connected to
pub const DEFAULT_PEER_COUNT_TARGET: u32 = 11;

/// Default period of the refresh timer in milliseconds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

/// Default settings file name inside the data directory
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

/// Default key store file name inside the data directory
pub const DEFAULT_KEYS_FILE: &str = "keys.json";

/// Persisted setting names
pub const NETWORK_CONFIG_KEY: &str = "network-config";
pub const SERVER_LIST_KEY: &str = "server-list";
pub const PRIVATE_CHAIN_NAME_KEY: &str = "private-chain-name";
pub const BENEFICIARY_ADDRESS_KEY: &str = "beneficiary-address";
pub const VM_SELECTION_KEY: &str = "vm-selection";
pub const PEER_COUNT_TARGET_KEY: &str = "peer-count-target";
pub const WINDOW_GEOMETRY_KEY: &str = "window-geometry";
