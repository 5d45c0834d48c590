//! The account key store.
//!
//! Every key is sealed under its own credential. A key may additionally be
//! held unlocked in memory until it is explicitly locked again.

use crate::encrypted_key::EncryptedKey;
use crate::{ScryptParameters, WalletError, WalletResult, KEY_STORE_VERSION};
use aleth_core::{Address, Secret};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// A key manager shared between the shell and its facade.
pub type SharedKeyManager = Arc<Mutex<KeyManager>>;

/// User-visible description of a managed key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub name: String,
    /// Reminder shown when the credential is requested.
    pub hint: String,
}

#[derive(Clone)]
struct ManagedKey {
    info: KeyInfo,
    sealed: EncryptedKey,
    unlocked: Option<Secret>,
}

#[derive(Serialize, Deserialize)]
struct KeyStoreFile {
    version: u32,
    keys: Vec<StoredKey>,
}

#[derive(Serialize, Deserialize)]
struct StoredKey {
    #[serde(flatten)]
    info: KeyInfo,
    key: EncryptedKey,
}

/// Encrypted account key store, optionally backed by a JSON file.
#[derive(Clone)]
pub struct KeyManager {
    keys: BTreeMap<Address, ManagedKey>,
    scrypt: ScryptParameters,
    path: Option<PathBuf>,
}

impl KeyManager {
    pub fn in_memory(scrypt: ScryptParameters) -> Self {
        Self {
            keys: BTreeMap::new(),
            scrypt,
            path: None,
        }
    }

    /// Opens the store at `path`. A missing file yields an empty store that
    /// will be created on the first [`KeyManager::save`]. All keys load locked.
    pub fn open(path: impl AsRef<Path>, scrypt: ScryptParameters) -> WalletResult<Self> {
        scrypt.validate()?;
        let path = path.as_ref().to_path_buf();
        let mut keys = BTreeMap::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: KeyStoreFile = serde_json::from_str(&content)?;
            if file.version != KEY_STORE_VERSION {
                return Err(WalletError::InvalidFormat(format!(
                    "unsupported key store version {}",
                    file.version
                )));
            }
            for stored in file.keys {
                keys.insert(
                    stored.key.address,
                    ManagedKey {
                        info: stored.info,
                        sealed: stored.key,
                        unlocked: None,
                    },
                );
            }
            info!(path = %path.display(), accounts = keys.len(), "key store opened");
        }

        Ok(Self {
            keys,
            scrypt,
            path: Some(path),
        })
    }

    /// Writes the store to its file. In-memory stores do nothing.
    pub fn save(&self) -> WalletResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = KeyStoreFile {
            version: KEY_STORE_VERSION,
            keys: self
                .keys
                .values()
                .map(|managed| StoredKey {
                    info: managed.info.clone(),
                    key: managed.sealed.clone(),
                })
                .collect(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(&file)?)?;
        fs::rename(&staging, path)?;
        debug!(path = %path.display(), accounts = self.keys.len(), "key store saved");
        Ok(())
    }

    pub fn into_shared(self) -> SharedKeyManager {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn scrypt(&self) -> ScryptParameters {
        self.scrypt
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.keys.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    pub fn info(&self, address: &Address) -> Option<&KeyInfo> {
        self.keys.get(address).map(|managed| &managed.info)
    }

    pub fn hint(&self, address: &Address) -> Option<String> {
        self.info(address)
            .map(|info| info.hint.clone())
            .filter(|hint| !hint.is_empty())
    }

    pub fn is_locked(&self, address: &Address) -> WalletResult<bool> {
        Ok(self.managed(address)?.unlocked.is_none())
    }

    /// Adds an existing secret sealed under `credential`. The key starts locked.
    pub fn import(
        &mut self,
        secret: Secret,
        info: KeyInfo,
        credential: &str,
    ) -> WalletResult<Address> {
        let address = secret.address();
        if self.keys.contains_key(&address) {
            return Err(WalletError::AccountExists(address));
        }
        let sealed = EncryptedKey::seal(&secret, credential, self.scrypt)?;
        self.keys.insert(
            address,
            ManagedKey {
                info,
                sealed,
                unlocked: None,
            },
        );
        info!(account = %address.abridged(), "key imported");
        Ok(address)
    }

    /// Generates and seals a fresh key.
    pub fn create(&mut self, info: KeyInfo, credential: &str) -> WalletResult<Address> {
        let mut secret = Secret::random();
        while self.keys.contains_key(&secret.address()) {
            secret = Secret::random();
        }
        self.import(secret, info, credential)
    }

    /// Decrypts the key and keeps it unlocked in memory.
    pub fn unlock(&mut self, address: &Address, credential: &str) -> WalletResult<()> {
        let managed = self.managed_mut(address)?;
        if managed.unlocked.is_none() {
            managed.unlocked = Some(managed.sealed.open(credential)?);
            debug!(account = %address.abridged(), "key unlocked");
        }
        Ok(())
    }

    pub fn lock(&mut self, address: &Address) -> WalletResult<()> {
        self.managed_mut(address)?.unlocked = None;
        Ok(())
    }

    pub fn lock_all(&mut self) {
        for managed in self.keys.values_mut() {
            managed.unlocked = None;
        }
    }

    /// The in-memory secret if the key is unlocked.
    pub fn unlocked_secret(&self, address: &Address) -> WalletResult<Option<Secret>> {
        Ok(self.managed(address)?.unlocked.clone())
    }

    /// Decrypts the key without changing its locked state.
    pub fn decrypt(&self, address: &Address, credential: &str) -> WalletResult<Secret> {
        self.managed(address)?.sealed.open(credential)
    }

    /// Removes the key permanently.
    pub fn kill(&mut self, address: &Address) -> WalletResult<()> {
        self.keys
            .remove(address)
            .ok_or(WalletError::AccountNotFound(*address))?;
        info!(account = %address.abridged(), "key killed");
        Ok(())
    }

    /// Seals the key under `new` after checking `old`. On failure the key is unchanged.
    pub fn reencrypt(&mut self, address: &Address, old: &str, new: &str) -> WalletResult<()> {
        let scrypt = self.scrypt;
        let managed = self.managed_mut(address)?;
        let secret = managed.sealed.open(old)?;
        managed.sealed = EncryptedKey::seal(&secret, new, scrypt)?;
        info!(account = %address.abridged(), "key re-encrypted");
        Ok(())
    }

    /// Hex-encoded key material. Requires the key's credential.
    pub fn export(&self, address: &Address, credential: &str) -> WalletResult<Zeroizing<String>> {
        let secret = self.decrypt(address, credential)?;
        Ok(Zeroizing::new(hex::encode(secret.expose())))
    }

    fn managed(&self, address: &Address) -> WalletResult<&ManagedKey> {
        self.keys
            .get(address)
            .ok_or(WalletError::AccountNotFound(*address))
    }

    fn managed_mut(&mut self, address: &Address) -> WalletResult<&mut ManagedKey> {
        self.keys
            .get_mut(address)
            .ok_or(WalletError::AccountNotFound(*address))
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("accounts", &self.keys.len())
            .field("scrypt", &self.scrypt)
            .field("path", &self.path)
            .finish()
    }
}
