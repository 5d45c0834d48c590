//! Aleth Wallets Library
//!
//! This crate provides the account key store used by the shell:
//! - per-account encryption of secrets under a user credential
//! - locked/unlocked tracking per key
//! - kill, re-encrypt and export operations
//! - the credential prompt seam used when a locked key is needed

pub mod encrypted_key;
pub mod error;
pub mod key_manager;
pub mod prompt;
pub mod scrypt_parameters;

// Re-export main types
pub use encrypted_key::EncryptedKey;
pub use error::{WalletError, WalletResult};
pub use key_manager::{KeyInfo, KeyManager, SharedKeyManager};
pub use prompt::{CredentialPrompt, CredentialRequest, DenyAll};
pub use scrypt_parameters::ScryptParameters;

/// Version of the key store file format
pub const KEY_STORE_VERSION: u32 = 1;
