//! The node facade.
//!
//! Everything outside the shell reads the node through a [`NodeFacade`]. A
//! facade is either [`Unbound`], where every handle is absent and every
//! notification is a no-op, or bound to a live node by the shell.

use aleth_core::{
    Address, AnnotationHandle, ChainClient, CredentialError, MessagingHandle, NodeHandle, Secret,
};
use aleth_wallets::SharedKeyManager;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Capability set exposed to plugins and the refresh scheduler.
///
/// A `None` handle means the node is unavailable. It is never an error.
pub trait NodeFacade: Send + Sync {
    /// Networking side of the node.
    fn web3_handle(&self) -> Option<Arc<dyn NodeHandle>>;

    /// Chain client of the node.
    fn node_handle(&self) -> Option<Arc<dyn ChainClient>>;

    fn messaging_handle(&self) -> Option<Arc<dyn MessagingHandle>>;

    fn script_annotation_handle(&self) -> Option<Arc<dyn AnnotationHandle>>;

    /// Returns the secret for `address`, asking the user for its credential
    /// when the key is locked. A prompted key stays locked.
    fn retrieve_secret(&self, address: &Address) -> Result<Secret, CredentialError>;

    fn key_manager_handle(&self) -> Option<SharedKeyManager>;

    /// Managed keys changed; balances need refreshing.
    fn on_keys_changed(&self);

    /// The settings blob changed and should be persisted.
    fn on_settings_changed(&self);
}

/// The facade of a shell with no node attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbound;

impl NodeFacade for Unbound {
    fn web3_handle(&self) -> Option<Arc<dyn NodeHandle>> {
        None
    }

    fn node_handle(&self) -> Option<Arc<dyn ChainClient>> {
        None
    }

    fn messaging_handle(&self) -> Option<Arc<dyn MessagingHandle>> {
        None
    }

    fn script_annotation_handle(&self) -> Option<Arc<dyn AnnotationHandle>> {
        None
    }

    fn retrieve_secret(&self, address: &Address) -> Result<Secret, CredentialError> {
        Err(CredentialError::UnknownAccount(*address))
    }

    fn key_manager_handle(&self) -> Option<SharedKeyManager> {
        None
    }

    fn on_keys_changed(&self) {}

    fn on_settings_changed(&self) {}
}

/// The active facade slot.
///
/// Holders of the binding always see the currently installed facade, so the
/// shell can attach and detach a node without re-handing facades to plugins.
pub struct FacadeBinding {
    current: RwLock<Arc<dyn NodeFacade>>,
}

impl FacadeBinding {
    pub fn unbound() -> Self {
        Self {
            current: RwLock::new(Arc::new(Unbound)),
        }
    }

    pub fn bind(&self, facade: Arc<dyn NodeFacade>) {
        *self.current.write() = facade;
        debug!("facade bound");
    }

    pub fn unbind(&self) {
        *self.current.write() = Arc::new(Unbound);
        debug!("facade unbound");
    }

    /// The installed facade. The slot lock is released before this returns.
    pub fn current(&self) -> Arc<dyn NodeFacade> {
        self.current.read().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.current().node_handle().is_some()
    }
}

impl Default for FacadeBinding {
    fn default() -> Self {
        Self::unbound()
    }
}

impl std::fmt::Debug for FacadeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacadeBinding")
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl NodeFacade for FacadeBinding {
    fn web3_handle(&self) -> Option<Arc<dyn NodeHandle>> {
        self.current().web3_handle()
    }

    fn node_handle(&self) -> Option<Arc<dyn ChainClient>> {
        self.current().node_handle()
    }

    fn messaging_handle(&self) -> Option<Arc<dyn MessagingHandle>> {
        self.current().messaging_handle()
    }

    fn script_annotation_handle(&self) -> Option<Arc<dyn AnnotationHandle>> {
        self.current().script_annotation_handle()
    }

    fn retrieve_secret(&self, address: &Address) -> Result<Secret, CredentialError> {
        self.current().retrieve_secret(address)
    }

    fn key_manager_handle(&self) -> Option<SharedKeyManager> {
        self.current().key_manager_handle()
    }

    fn on_keys_changed(&self) {
        self.current().on_keys_changed()
    }

    fn on_settings_changed(&self) {
        self.current().on_settings_changed()
    }
}

/// Human-readable description of a call into `target`, or `None` when no
/// annotation is available.
pub fn annotate_call(
    facade: &dyn NodeFacade,
    target: &Address,
    code_hash: Option<&[u8; 32]>,
) -> Option<String> {
    let annotations = facade.script_annotation_handle()?;
    let notice = code_hash.and_then(|hash| annotations.user_notice(hash));
    match (annotations.contract_name(target), notice) {
        (Some(name), Some(notice)) => Some(format!("{name}: {notice}")),
        (Some(name), None) => Some(name),
        (None, notice) => notice,
    }
}
