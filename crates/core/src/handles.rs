//! Node-side capability traits.
//!
//! The node itself (chain state, mining, peer-to-peer networking, EVM execution)
//! lives outside the shell. These traits are the only surface the shell and its
//! plugins use to talk to it. Implementations are expected to be thread-safe on
//! the node side; every call is synchronous request/response from the shell's
//! point of view.

use crate::address::Address;
use crate::error::NodeResult;
use crate::vm::VmSelection;
use std::sync::Arc;

/// Identifier returned by [`ChainClient::install_watch`].
pub type WatchId = u64;

/// Callback invoked by the node when a watched condition fires.
///
/// Callbacks may run on node threads. They must only hand the notification
/// over to the shell thread and never touch shell state directly.
pub type WatchCallback = Box<dyn Fn() + Send + Sync>;

/// Chain state a query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockRef {
    /// Head of the canonical chain.
    Latest,
    /// Head plus the pending transaction set.
    Pending,
}

/// Conditions the shell can watch on the chain client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchKind {
    NewBlock,
    PendingChanged,
}

/// Networking preferences handed to the node when networking starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkPreferences {
    /// Opaque peer-configuration blob previously returned by [`NodeHandle::save_network`].
    pub network_config: Vec<u8>,
    /// Target number of connected peers.
    pub ideal_peers: u32,
    /// Peers to dial on start, most recently used first.
    pub bootstrap_peers: Vec<String>,
    /// Private chain name, `None` for the public chain.
    pub private_chain: Option<String>,
}

/// Networking side of the node (`web3` handle).
pub trait NodeHandle: Send + Sync {
    fn is_networking(&self) -> bool;

    fn peer_count(&self) -> usize;

    fn start_network(&self, preferences: &NetworkPreferences) -> NodeResult<()>;

    fn stop_network(&self);

    fn connect(&self, peer: &str) -> NodeResult<()>;

    fn set_ideal_peer_count(&self, peers: u32);

    /// Serialised peer configuration to persist as `network-config`.
    fn save_network(&self) -> Vec<u8>;
}

/// Chain client side of the node.
pub trait ChainClient: Send + Sync {
    fn is_mining(&self) -> bool;

    fn hashrate(&self) -> u64;

    fn start_mining(&self) -> NodeResult<()>;

    fn stop_mining(&self);

    /// Precomputes data for the next mining epoch.
    fn prepare_next_epoch(&self) -> NodeResult<()>;

    fn set_force_mining(&self, enabled: bool);

    fn set_turbo_mining(&self, enabled: bool);

    fn block_count(&self) -> NodeResult<u64>;

    fn pending_count(&self) -> NodeResult<usize>;

    fn balance(&self, address: &Address, at: BlockRef) -> NodeResult<u128>;

    fn set_vm(&self, vm: VmSelection);

    fn set_beneficiary(&self, address: Address);

    fn set_private_chain(&self, name: Option<&str>) -> NodeResult<()>;

    fn set_sentinel(&self, endpoint: &str) -> NodeResult<()>;

    fn set_paranoia(&self, enabled: bool);

    fn retry_unknown(&self);

    fn rewind(&self, block: u64) -> NodeResult<()>;

    fn inject_block(&self, data: &[u8]) -> NodeResult<()>;

    fn clear_pending(&self);

    /// Destroys the local chain database and starts again from genesis.
    fn kill_chain(&self) -> NodeResult<()>;

    fn install_watch(&self, kind: WatchKind, callback: WatchCallback) -> WatchId;

    fn uninstall_watch(&self, id: WatchId);
}

/// Messaging (whisper) side of the node.
pub trait MessagingHandle: Send + Sync {
    fn is_enabled(&self) -> bool;

    fn post(&self, topic: &str, payload: &[u8]) -> NodeResult<()>;
}

/// Resolves human-readable call and contract metadata.
pub trait AnnotationHandle: Send + Sync {
    /// Notice registered for the code with the given hash.
    fn user_notice(&self, code_hash: &[u8; 32]) -> Option<String>;

    fn contract_name(&self, address: &Address) -> Option<String>;
}

/// The set of live handles a running node exposes to the shell.
#[derive(Clone)]
pub struct NodeHandles {
    pub web3: Arc<dyn NodeHandle>,
    pub chain: Arc<dyn ChainClient>,
    pub messaging: Option<Arc<dyn MessagingHandle>>,
}

impl NodeHandles {
    pub fn new(web3: Arc<dyn NodeHandle>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            web3,
            chain,
            messaging: None,
        }
    }

    pub fn with_messaging(mut self, messaging: Arc<dyn MessagingHandle>) -> Self {
        self.messaging = Some(messaging);
        self
    }
}

impl std::fmt::Debug for NodeHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandles")
            .field("messaging", &self.messaging.is_some())
            .finish_non_exhaustive()
    }
}
