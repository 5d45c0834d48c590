//! Key-management operations on behalf of the user.
//!
//! Every successful change to the set of keys, or to a key's credential, is
//! persisted and followed by a keys-changed notification on the facade.

use crate::confirmation::Confirmation;
use crate::error::BridgeError;
use aleth_core::{Address, Secret};
use aleth_extensions::NodeFacade;
use aleth_wallets::{KeyInfo, SharedKeyManager, WalletResult};
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Key store operations that persist and notify the facade.
pub struct KeyManagerBridge {
    keys: SharedKeyManager,
    facade: Arc<dyn NodeFacade>,
}

impl KeyManagerBridge {
    pub fn new(keys: SharedKeyManager, facade: Arc<dyn NodeFacade>) -> Self {
        Self { keys, facade }
    }

    pub fn keys(&self) -> &SharedKeyManager {
        &self.keys
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.keys.lock().accounts()
    }

    pub fn is_locked(&self, address: &Address) -> BridgeResult<bool> {
        Ok(self.keys.lock().is_locked(address)?)
    }

    /// Creates a fresh key sealed under `credential`. The key starts locked.
    pub fn create_account(&self, name: &str, credential: &str, hint: &str) -> BridgeResult<Address> {
        self.mutate(|keys| {
            keys.create(
                KeyInfo {
                    name: name.to_string(),
                    hint: hint.to_string(),
                },
                credential,
            )
        })
    }

    pub fn import_secret(
        &self,
        secret: Secret,
        name: &str,
        credential: &str,
        hint: &str,
    ) -> BridgeResult<Address> {
        self.mutate(|keys| {
            keys.import(
                secret,
                KeyInfo {
                    name: name.to_string(),
                    hint: hint.to_string(),
                },
                credential,
            )
        })
    }

    pub fn unlock(&self, address: &Address, credential: &str) -> BridgeResult<()> {
        Ok(self.keys.lock().unlock(address, credential)?)
    }

    pub fn lock(&self, address: &Address) -> BridgeResult<()> {
        Ok(self.keys.lock().lock(address)?)
    }

    /// Permanently removes the key for `address`.
    pub fn kill_account(&self, address: &Address, _confirmed: Confirmation) -> BridgeResult<()> {
        self.mutate(|keys| keys.kill(address))?;
        info!(account = %address.abridged(), "account killed");
        Ok(())
    }

    pub fn reencrypt(&self, address: &Address, old: &str, new: &str) -> BridgeResult<()> {
        self.mutate(|keys| keys.reencrypt(address, old, new))
    }

    /// Re-encrypts every account whose key `old` opens.
    ///
    /// Accounts are independent: one failing leaves the others re-encrypted.
    pub fn reencrypt_all(&self, old: &str, new: &str) -> BridgeResult<Vec<Address>> {
        let (succeeded, failures) = {
            let mut keys = self.keys.lock();
            let before = keys.clone();
            let mut succeeded = Vec::new();
            let mut failures = Vec::new();
            for address in keys.accounts() {
                match keys.reencrypt(&address, old, new) {
                    Ok(()) => succeeded.push(address),
                    Err(e) => {
                        warn!(account = %address.abridged(), error = %e, "re-encryption failed");
                        failures.push((address, e));
                    }
                }
            }
            if !succeeded.is_empty() {
                if let Err(e) = keys.save() {
                    warn!(error = %e, "key store not saved, re-encryption rolled back");
                    *keys = before;
                    return Err(e.into());
                }
            }
            (succeeded, failures)
        };

        if !succeeded.is_empty() {
            self.facade.on_keys_changed();
        }

        if failures.is_empty() {
            Ok(succeeded)
        } else {
            Err(BridgeError::Partial {
                succeeded,
                failures,
            })
        }
    }

    /// Hex key material for `address`. Nothing is retained.
    pub fn export_key(&self, address: &Address, credential: &str) -> BridgeResult<Zeroizing<String>> {
        Ok(self.keys.lock().export(address, credential)?)
    }

    /// Applies a change and saves the store, then notifies with the store lock
    /// released. A failed save restores the store to its state before the change.
    fn mutate<T, F>(&self, change: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut aleth_wallets::KeyManager) -> WalletResult<T>,
    {
        let value = {
            let mut keys = self.keys.lock();
            let before = keys.clone();
            let value = change(&mut keys)?;
            if let Err(e) = keys.save() {
                warn!(error = %e, "key store not saved, change rolled back");
                *keys = before;
                return Err(e.into());
            }
            value
        };
        self.facade.on_keys_changed();
        Ok(value)
    }
}

impl std::fmt::Debug for KeyManagerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManagerBridge")
            .field("keys", &*self.keys.lock())
            .finish_non_exhaustive()
    }
}
