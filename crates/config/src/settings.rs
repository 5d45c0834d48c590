//! Persisted shell settings.
//!
//! The settings blob is stored as a single TOML document. Writes can be
//! restricted to the window geometry, or to everything but the geometry, so that
//! switching chains never clobbers the window placement and moving the window
//! never rewrites chain settings.

use crate::error::{ConfigError, ConfigResult};
use crate::{
    BENEFICIARY_ADDRESS_KEY, DEFAULT_PEER_COUNT_TARGET, NETWORK_CONFIG_KEY, PEER_COUNT_TARGET_KEY,
    PRIVATE_CHAIN_NAME_KEY, SERVER_LIST_KEY, VM_SELECTION_KEY, WINDOW_GEOMETRY_KEY,
};
use aleth_core::{Address, VmSelection};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, warn};

/// In-memory value of every persisted setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsBlob {
    /// `network-config`: opaque peer configuration saved by the node.
    pub network_config: Vec<u8>,
    /// `server-list`: known peers, most recently used first.
    pub server_list: Vec<String>,
    /// `private-chain-name`: empty for the public chain.
    pub private_chain_name: String,
    /// `beneficiary-address`: mining reward recipient.
    pub beneficiary: Option<Address>,
    /// `vm-selection`
    pub vm: VmSelection,
    /// `peer-count-target`
    pub peer_count_target: u32,
    /// `window-geometry`: opaque presentation-layer blob, passed through untouched.
    pub window_geometry: Vec<u8>,
}

impl Default for SettingsBlob {
    fn default() -> Self {
        Self {
            network_config: Vec::new(),
            server_list: Vec::new(),
            private_chain_name: String::new(),
            beneficiary: None,
            vm: VmSelection::default(),
            peer_count_target: DEFAULT_PEER_COUNT_TARGET,
            window_geometry: Vec::new(),
        }
    }
}

impl SettingsBlob {
    pub fn is_private_chain(&self) -> bool {
        !self.private_chain_name.is_empty()
    }
}

/// Options limiting which keys a read or write touches.
///
/// `skip_geometry` and `only_geometry` are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsFlags {
    pub skip_geometry: bool,
    pub only_geometry: bool,
}

impl SettingsFlags {
    pub const EVERYTHING: SettingsFlags = SettingsFlags {
        skip_geometry: false,
        only_geometry: false,
    };

    pub const SKIP_GEOMETRY: SettingsFlags = SettingsFlags {
        skip_geometry: true,
        only_geometry: false,
    };

    pub const ONLY_GEOMETRY: SettingsFlags = SettingsFlags {
        skip_geometry: false,
        only_geometry: true,
    };

    pub fn scope(self) -> ConfigResult<SettingsScope> {
        match (self.skip_geometry, self.only_geometry) {
            (false, false) => Ok(SettingsScope::Everything),
            (true, false) => Ok(SettingsScope::AllButGeometry),
            (false, true) => Ok(SettingsScope::GeometryOnly),
            (true, true) => Err(ConfigError::invalid(
                "skip_geometry and only_geometry are mutually exclusive",
            )),
        }
    }
}

/// Validated form of [`SettingsFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope {
    Everything,
    AllButGeometry,
    GeometryOnly,
}

impl SettingsScope {
    pub fn includes_geometry(self) -> bool {
        !matches!(self, SettingsScope::AllButGeometry)
    }

    pub fn includes_chain_settings(self) -> bool {
        !matches!(self, SettingsScope::GeometryOnly)
    }
}

/// Reads and writes the [`SettingsBlob`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the keys selected by `flags`, keeping every other key on disk as it was.
    pub fn write(&self, blob: &SettingsBlob, flags: SettingsFlags) -> ConfigResult<()> {
        let scope = flags.scope()?;
        let mut table = self.load_table()?;

        if scope.includes_chain_settings() {
            set(&mut table, NETWORK_CONFIG_KEY, STANDARD.encode(&blob.network_config))?;
            set(&mut table, SERVER_LIST_KEY, &blob.server_list)?;
            set(&mut table, PRIVATE_CHAIN_NAME_KEY, &blob.private_chain_name)?;
            match blob.beneficiary {
                Some(address) => set(&mut table, BENEFICIARY_ADDRESS_KEY, address)?,
                None => {
                    table.remove(BENEFICIARY_ADDRESS_KEY);
                }
            }
            set(&mut table, VM_SELECTION_KEY, blob.vm)?;
            set(&mut table, PEER_COUNT_TARGET_KEY, blob.peer_count_target)?;
        }
        if scope.includes_geometry() {
            set(&mut table, WINDOW_GEOMETRY_KEY, STANDARD.encode(&blob.window_geometry))?;
        }

        self.store_table(&table)?;
        debug!(path = %self.path.display(), ?scope, "settings written");
        Ok(())
    }

    /// Reads the keys selected by `flags` into a default blob.
    pub fn read(&self, flags: SettingsFlags) -> ConfigResult<SettingsBlob> {
        let mut blob = SettingsBlob::default();
        self.read_into(&mut blob, flags)?;
        Ok(blob)
    }

    /// Overwrites the keys selected by `flags`; keys out of scope are left untouched.
    ///
    /// Each key is decoded on its own. A missing file, a missing key or a value
    /// of the wrong shape loads the default for that key. The only error is a
    /// contradictory `flags`.
    pub fn read_into(&self, blob: &mut SettingsBlob, flags: SettingsFlags) -> ConfigResult<()> {
        let scope = flags.scope()?;
        let table = self.load_table().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "settings unreadable, using defaults");
            Table::new()
        });
        let defaults = SettingsBlob::default();

        if scope.includes_chain_settings() {
            blob.network_config = decode_blob(NETWORK_CONFIG_KEY, get(&table, NETWORK_CONFIG_KEY));
            blob.server_list = get(&table, SERVER_LIST_KEY).unwrap_or(defaults.server_list);
            blob.private_chain_name =
                get(&table, PRIVATE_CHAIN_NAME_KEY).unwrap_or(defaults.private_chain_name);
            blob.beneficiary = get(&table, BENEFICIARY_ADDRESS_KEY);
            blob.vm = get(&table, VM_SELECTION_KEY).unwrap_or(defaults.vm);
            blob.peer_count_target =
                get(&table, PEER_COUNT_TARGET_KEY).unwrap_or(defaults.peer_count_target);
        }
        if scope.includes_geometry() {
            blob.window_geometry = decode_blob(WINDOW_GEOMETRY_KEY, get(&table, WINDOW_GEOMETRY_KEY));
        }
        Ok(())
    }

    /// The document on disk. A file that is not valid TOML reads as empty.
    fn load_table(&self) -> ConfigResult<Table> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content.parse::<Table>().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "settings file is not valid TOML");
            Table::new()
        }))
    }

    fn store_table(&self, table: &Table) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(table)?;
        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

fn set<T: Serialize>(table: &mut Table, key: &str, value: T) -> ConfigResult<()> {
    table.insert(key.to_string(), Value::try_from(value)?);
    Ok(())
}

/// The value under `key`, or `None` when it is absent or malformed.
fn get<T: DeserializeOwned>(table: &Table, key: &str) -> Option<T> {
    let value = table.get(key)?;
    match value.clone().try_into() {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(key, error = %e, "discarding malformed setting");
            None
        }
    }
}

fn decode_blob(key: &str, value: Option<String>) -> Vec<u8> {
    let Some(text) = value else {
        return Vec::new();
    };
    match STANDARD.decode(text.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, error = %e, "discarding undecodable setting");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_scopes() {
        assert_eq!(SettingsFlags::EVERYTHING.scope().unwrap(), SettingsScope::Everything);
        assert_eq!(
            SettingsFlags::SKIP_GEOMETRY.scope().unwrap(),
            SettingsScope::AllButGeometry
        );
        assert_eq!(
            SettingsFlags::ONLY_GEOMETRY.scope().unwrap(),
            SettingsScope::GeometryOnly
        );

        let both = SettingsFlags {
            skip_geometry: true,
            only_geometry: true,
        };
        assert!(matches!(
            both.scope(),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_scope_membership() {
        assert!(SettingsScope::Everything.includes_geometry());
        assert!(SettingsScope::Everything.includes_chain_settings());
        assert!(!SettingsScope::AllButGeometry.includes_geometry());
        assert!(!SettingsScope::GeometryOnly.includes_chain_settings());
    }

    #[test]
    fn test_file_uses_documented_key_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        let blob = SettingsBlob {
            server_list: vec!["10.0.0.1:30303".to_string()],
            private_chain_name: "lab".to_string(),
            beneficiary: Some(Address::new([1; 20])),
            vm: VmSelection::Jit,
            peer_count_target: 5,
            ..SettingsBlob::default()
        };
        store.write(&blob, SettingsFlags::EVERYTHING).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        for key in [
            NETWORK_CONFIG_KEY,
            SERVER_LIST_KEY,
            PRIVATE_CHAIN_NAME_KEY,
            BENEFICIARY_ADDRESS_KEY,
            VM_SELECTION_KEY,
            PEER_COUNT_TARGET_KEY,
            WINDOW_GEOMETRY_KEY,
        ] {
            assert!(text.contains(key), "missing {key} in {text}");
        }
        assert!(text.contains("vm-selection = \"jit\""));
    }

    #[test]
    fn test_malformed_key_falls_back_alone() {
        let mut table = Table::new();
        table.insert(VM_SELECTION_KEY.to_string(), Value::String("wasm".to_string()));
        table.insert(PEER_COUNT_TARGET_KEY.to_string(), Value::Integer(9));

        assert_eq!(get::<VmSelection>(&table, VM_SELECTION_KEY), None);
        assert_eq!(get::<u32>(&table, PEER_COUNT_TARGET_KEY), Some(9));
        assert_eq!(get::<u32>(&table, SERVER_LIST_KEY), None);
    }

    #[test]
    fn test_undecodable_blob_falls_back_to_empty() {
        assert!(decode_blob("window-geometry", Some("%%%".to_string())).is_empty());
        assert_eq!(
            decode_blob("window-geometry", Some(STANDARD.encode([1u8, 2, 3]))),
            vec![1, 2, 3]
        );
    }
}
