//! In-process fakes shared by the shell integration tests.
#![allow(dead_code)]

use aleth_core::{
    Address, BlockRef, ChainClient, NetworkPreferences, NodeError, NodeHandle, NodeHandles,
    NodeResult, VmSelection, WatchCallback, WatchId, WatchKind,
};
use aleth_shell::{ViewSink, ViewUpdate};
use aleth_wallets::{CredentialPrompt, CredentialRequest};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Default)]
pub struct FakeState {
    pub networking: bool,
    pub peers: usize,
    pub mining: bool,
    pub hashrate: u64,
    pub blocks: u64,
    pub pending: usize,
    pub balances: HashMap<Address, u128>,
    pub pending_balances: HashMap<Address, u128>,
    pub vm: Option<VmSelection>,
    pub beneficiary: Option<Address>,
    pub private_chain: Option<String>,
    pub ideal_peers: u32,
    pub connected: Vec<String>,
    pub started_with: Option<NetworkPreferences>,
    pub injected: Vec<Vec<u8>>,
    pub fail_block_count: bool,
    pub killed: bool,
    pub force_mining: bool,
    pub paranoia: bool,
    pub next_watch: WatchId,
}

/// One object playing both the networking and chain-client sides of a node.
#[derive(Default)]
pub struct FakeNode {
    pub state: Mutex<FakeState>,
    watches: Mutex<HashMap<WatchId, (WatchKind, WatchCallback)>>,
    block_count_hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    pub block_count_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
}

impl FakeNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn handles(self: &Arc<Self>) -> NodeHandles {
        NodeHandles::new(self.clone(), self.clone())
    }

    /// Runs `hook` inside every `block_count` call.
    pub fn on_block_count(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.block_count_hook.lock() = Some(Box::new(hook));
    }

    /// Fires every watch of `kind`, the way a node thread would.
    pub fn fire(&self, kind: WatchKind) {
        let watches = self.watches.lock();
        for (watched, callback) in watches.values() {
            if *watched == kind {
                callback();
            }
        }
    }

    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    pub fn set_balance(&self, address: Address, balance: u128) {
        self.state.lock().balances.insert(address, balance);
    }
}

impl NodeHandle for FakeNode {
    fn is_networking(&self) -> bool {
        self.state.lock().networking
    }

    fn peer_count(&self) -> usize {
        self.state.lock().peers
    }

    fn start_network(&self, preferences: &NetworkPreferences) -> NodeResult<()> {
        let mut state = self.state.lock();
        state.networking = true;
        state.started_with = Some(preferences.clone());
        Ok(())
    }

    fn stop_network(&self) {
        self.state.lock().networking = false;
    }

    fn connect(&self, peer: &str) -> NodeResult<()> {
        if !peer.contains(':') {
            return Err(NodeError::rejected(format!("no port in {peer}")));
        }
        self.state.lock().connected.push(peer.to_string());
        Ok(())
    }

    fn set_ideal_peer_count(&self, peers: u32) {
        self.state.lock().ideal_peers = peers;
    }

    fn save_network(&self) -> Vec<u8> {
        vec![0xca, 0xfe]
    }
}

impl ChainClient for FakeNode {
    fn is_mining(&self) -> bool {
        self.state.lock().mining
    }

    fn hashrate(&self) -> u64 {
        self.state.lock().hashrate
    }

    fn start_mining(&self) -> NodeResult<()> {
        self.state.lock().mining = true;
        Ok(())
    }

    fn stop_mining(&self) {
        self.state.lock().mining = false;
    }

    fn prepare_next_epoch(&self) -> NodeResult<()> {
        Ok(())
    }

    fn set_force_mining(&self, enabled: bool) {
        self.state.lock().force_mining = enabled;
    }

    fn set_turbo_mining(&self, _enabled: bool) {}

    fn block_count(&self) -> NodeResult<u64> {
        self.block_count_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.block_count_hook.lock().as_ref() {
            hook();
        }
        let state = self.state.lock();
        if state.fail_block_count {
            return Err(NodeError::failed("database busy"));
        }
        Ok(state.blocks)
    }

    fn pending_count(&self) -> NodeResult<usize> {
        Ok(self.state.lock().pending)
    }

    fn balance(&self, address: &Address, at: BlockRef) -> NodeResult<u128> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        let latest = state.balances.get(address).copied().unwrap_or(0);
        Ok(match at {
            BlockRef::Latest => latest,
            BlockRef::Pending => state
                .pending_balances
                .get(address)
                .copied()
                .unwrap_or(latest),
        })
    }

    fn set_vm(&self, vm: VmSelection) {
        self.state.lock().vm = Some(vm);
    }

    fn set_beneficiary(&self, address: Address) {
        self.state.lock().beneficiary = Some(address);
    }

    fn set_private_chain(&self, name: Option<&str>) -> NodeResult<()> {
        self.state.lock().private_chain = name.map(str::to_string);
        Ok(())
    }

    fn set_sentinel(&self, _endpoint: &str) -> NodeResult<()> {
        Ok(())
    }

    fn set_paranoia(&self, enabled: bool) {
        self.state.lock().paranoia = enabled;
    }

    fn retry_unknown(&self) {}

    fn rewind(&self, block: u64) -> NodeResult<()> {
        let mut state = self.state.lock();
        if block > state.blocks {
            return Err(NodeError::rejected("cannot rewind forward"));
        }
        state.blocks = block;
        Ok(())
    }

    fn inject_block(&self, data: &[u8]) -> NodeResult<()> {
        let mut state = self.state.lock();
        state.injected.push(data.to_vec());
        state.blocks += 1;
        Ok(())
    }

    fn clear_pending(&self) {
        self.state.lock().pending = 0;
    }

    fn kill_chain(&self) -> NodeResult<()> {
        let mut state = self.state.lock();
        state.killed = true;
        state.blocks = 0;
        state.pending = 0;
        Ok(())
    }

    fn install_watch(&self, kind: WatchKind, callback: WatchCallback) -> WatchId {
        let id = {
            let mut state = self.state.lock();
            state.next_watch += 1;
            state.next_watch
        };
        self.watches.lock().insert(id, (kind, callback));
        id
    }

    fn uninstall_watch(&self, id: WatchId) {
        self.watches.lock().remove(&id);
    }
}

/// Collects every published update.
#[derive(Default)]
pub struct RecordingView {
    updates: Mutex<Vec<ViewUpdate>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<ViewUpdate> {
        std::mem::take(&mut *self.updates.lock())
    }

    pub fn count(&self, matches: impl Fn(&ViewUpdate) -> bool) -> usize {
        self.updates.lock().iter().filter(|u| matches(u)).count()
    }
}

impl ViewSink for RecordingView {
    fn publish(&self, update: ViewUpdate) {
        self.updates.lock().push(update);
    }
}

/// Answers credential requests from a script. `None` entries dismiss the prompt.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    pub requests: Mutex<Vec<CredentialRequest>>,
}

impl ScriptedPrompt {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, answer: Option<&str>) {
        self.answers.lock().push_back(answer.map(str::to_string));
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn request(&self, request: &CredentialRequest) -> Option<Zeroizing<String>> {
        self.requests.lock().push(request.clone());
        self.answers
            .lock()
            .pop_front()
            .flatten()
            .map(Zeroizing::new)
    }
}
