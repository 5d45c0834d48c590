//! Shell errors

use aleth_config::ConfigError;
use aleth_core::{Address, CredentialError, NodeError};
use aleth_extensions::ExtensionError;
use aleth_wallets::WalletError;
use thiserror::Error;

pub type ShellResult<T> = std::result::Result<T, ShellError>;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures of key-management operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Key store error: {0}")]
    Wallet(WalletError),

    /// Some accounts failed to re-encrypt. Each listed account kept its old credential.
    #[error("{} accounts re-encrypted, {} failed", succeeded.len(), failures.len())]
    Partial {
        succeeded: Vec<Address>,
        failures: Vec<(Address, WalletError)>,
    },
}

impl From<WalletError> for BridgeError {
    fn from(err: WalletError) -> Self {
        match err.as_credential_error() {
            Some(credential) => BridgeError::Credential(credential),
            None => BridgeError::Wallet(err),
        }
    }
}

impl BridgeError {
    pub fn credential(&self) -> Option<&CredentialError> {
        match self {
            BridgeError::Credential(err) => Some(err),
            _ => None,
        }
    }
}
