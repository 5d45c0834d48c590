//! Updates pushed from the shell to the presentation layer.

use aleth_core::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub networking: bool,
    pub peers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningStatus {
    pub mining: bool,
    pub hashrate: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStatus {
    pub blocks: u64,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: Address,
    pub name: String,
    pub balance: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    pub accounts: Vec<AccountBalance>,
    pub total: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Note,
    Debug,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Network(NetworkStatus),
    Mining(MiningStatus),
    Chain(ChainStatus),
    Balances(Balances),
    Log { level: LogLevel, entry: String },
    /// Loaded plugin names in load order.
    Plugins(Vec<String>),
}

/// Receives view updates. Rendering is up to the implementor.
pub trait ViewSink: Send + Sync {
    fn publish(&self, update: ViewUpdate);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewSink for NullView {
    fn publish(&self, _update: ViewUpdate) {}
}

impl<F> ViewSink for F
where
    F: Fn(ViewUpdate) + Send + Sync,
{
    fn publish(&self, update: ViewUpdate) {
        self(update)
    }
}
