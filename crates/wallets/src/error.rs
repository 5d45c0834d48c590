//! Wallet-related errors

use aleth_core::{Address, CoreError, CredentialError};
use thiserror::Error;

/// Result type for wallet operations
pub type WalletResult<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wrong credential")]
    WrongCredential,

    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    #[error("Account already managed: {0}")]
    AccountExists(Address),

    #[error("Invalid key store format: {0}")]
    InvalidFormat(String),

    #[error("Invalid scrypt parameters: {0}")]
    InvalidParameters(String),

    #[error("Scrypt error: {0}")]
    Scrypt(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

impl WalletError {
    /// The user-facing credential outcome this error represents, if any.
    pub fn as_credential_error(&self) -> Option<CredentialError> {
        match self {
            WalletError::WrongCredential => Some(CredentialError::WrongCredential),
            WalletError::AccountNotFound(address) => {
                Some(CredentialError::UnknownAccount(*address))
            }
            _ => None,
        }
    }
}
