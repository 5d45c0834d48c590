//! Aleth Core
//!
//! Types shared by every crate of the aleth-zero control shell:
//! - account [`Address`]es and decrypted [`Secret`]s
//! - the [`VmSelection`] persisted in settings
//! - the node-side capability traits consumed through the facade
//! - the credential and node error taxonomy

pub mod address;
pub mod error;
pub mod handles;
pub mod secret;
pub mod vm;

// Re-export main types
pub use address::{Address, ADDRESS_SIZE};
pub use error::{CoreError, CoreResult, CredentialError, NodeError, NodeResult};
pub use handles::{
    AnnotationHandle, BlockRef, ChainClient, MessagingHandle, NetworkPreferences, NodeHandle,
    NodeHandles, WatchCallback, WatchId, WatchKind,
};
pub use secret::{Secret, SECRET_SIZE};
pub use vm::VmSelection;
