//! The facade bound to a live node.

use crate::scheduler::NodeEvent;
use crate::shell::ShellCore;
use aleth_config::SettingsFlags;
use aleth_core::{
    Address, AnnotationHandle, ChainClient, CredentialError, MessagingHandle, NodeHandle, Secret,
};
use aleth_extensions::NodeFacade;
use aleth_wallets::{CredentialRequest, SharedKeyManager};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Forwards to the owning shell's live node.
///
/// Holds a non-owning reference: once the shell is gone every capability
/// behaves as unbound.
pub struct LiveFacade {
    core: Weak<ShellCore>,
}

impl LiveFacade {
    pub(crate) fn new(core: Weak<ShellCore>) -> Self {
        Self { core }
    }

    pub fn is_alive(&self) -> bool {
        self.core.strong_count() > 0
    }
}

impl NodeFacade for LiveFacade {
    fn web3_handle(&self) -> Option<Arc<dyn NodeHandle>> {
        let core = self.core.upgrade()?;
        let node = core.node.read();
        node.as_ref().map(|handles| handles.web3.clone())
    }

    fn node_handle(&self) -> Option<Arc<dyn ChainClient>> {
        let core = self.core.upgrade()?;
        let node = core.node.read();
        node.as_ref().map(|handles| handles.chain.clone())
    }

    fn messaging_handle(&self) -> Option<Arc<dyn MessagingHandle>> {
        let core = self.core.upgrade()?;
        let node = core.node.read();
        node.as_ref().and_then(|handles| handles.messaging.clone())
    }

    fn script_annotation_handle(&self) -> Option<Arc<dyn AnnotationHandle>> {
        let core = self.core.upgrade()?;
        let annotations: Arc<dyn AnnotationHandle> = core.annotations.clone();
        Some(annotations)
    }

    fn retrieve_secret(&self, address: &Address) -> Result<Secret, CredentialError> {
        let core = self
            .core
            .upgrade()
            .ok_or(CredentialError::UnknownAccount(*address))?;

        let hint = {
            let keys = core.keys.lock();
            match keys.unlocked_secret(address) {
                Ok(Some(secret)) => return Ok(secret),
                Ok(None) => keys.hint(address),
                Err(_) => return Err(CredentialError::UnknownAccount(*address)),
            }
        };

        let request = CredentialRequest::unlock(*address, hint);
        let credential = core
            .prompt
            .request(&request)
            .ok_or(CredentialError::UserCancelled)?;

        let keys = core.keys.lock();
        keys.decrypt(address, &credential).map_err(|e| {
            debug!(account = %address.abridged(), error = %e, "secret retrieval failed");
            e.as_credential_error()
                .unwrap_or(CredentialError::WrongCredential)
        })
    }

    fn key_manager_handle(&self) -> Option<SharedKeyManager> {
        let core = self.core.upgrade()?;
        Some(core.keys.clone())
    }

    fn on_keys_changed(&self) {
        if let Some(core) = self.core.upgrade() {
            core.scheduler.enqueue(NodeEvent::KeysChanged);
            core.scheduler.run_pending();
        }
    }

    fn on_settings_changed(&self) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let blob = core.settings.lock().clone();
        if let Err(e) = core.store.write(&blob, SettingsFlags::EVERYTHING) {
            warn!(error = %e, "failed to write settings");
        }
    }
}
