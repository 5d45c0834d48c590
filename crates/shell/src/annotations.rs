//! Human-readable metadata for contracts and calls.

use aleth_core::{Address, AnnotationHandle};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process annotation database served through the facade.
#[derive(Debug, Default)]
pub struct AnnotationBook {
    notices: RwLock<HashMap<[u8; 32], String>>,
    names: RwLock<HashMap<Address, String>>,
}

impl AnnotationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_notice(&self, code_hash: [u8; 32], notice: impl Into<String>) {
        self.notices.write().insert(code_hash, notice.into());
    }

    pub fn register_contract(&self, address: Address, name: impl Into<String>) {
        self.names.write().insert(address, name.into());
    }

    pub fn forget_contract(&self, address: &Address) -> bool {
        self.names.write().remove(address).is_some()
    }
}

impl AnnotationHandle for AnnotationBook {
    fn user_notice(&self, code_hash: &[u8; 32]) -> Option<String> {
        self.notices.read().get(code_hash).cloned()
    }

    fn contract_name(&self, address: &Address) -> Option<String> {
        self.names.read().get(address).cloned()
    }
}
