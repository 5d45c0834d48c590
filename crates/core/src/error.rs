//! Error types for Aleth Core

use crate::address::Address;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for requests served by the node.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors raised while building core values.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    #[error("Unknown VM selection: {0}")]
    UnknownVm(String),

    #[error("Hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Expected, user-facing outcomes of operations that need an account credential.
///
/// These are reported to the user and never abort the shell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The supplied credential does not decrypt the key.
    #[error("wrong credential")]
    WrongCredential,

    /// The user dismissed the credential prompt.
    #[error("credential prompt cancelled")]
    UserCancelled,

    /// The address has no managed key.
    #[error("no managed key for account {0}")]
    UnknownAccount(Address),
}

/// Failures reported by the node behind a handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("node rejected request: {0}")]
    Rejected(String),

    #[error("invalid block data: {0}")]
    InvalidBlock(String),

    #[error("node operation failed: {0}")]
    Failed(String),
}

impl NodeError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
