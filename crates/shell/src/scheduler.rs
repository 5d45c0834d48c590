//! Periodic and event-driven refresh of the node view.
//!
//! A refresh cycle reads network status, mining status, block count and
//! balances through the facade, in that order, and publishes each value that
//! differs from the last one published. Node events refresh only the stages
//! they affect. At most one refresh runs at a time: a tick that arrives while a
//! refresh is in progress is skipped.

use crate::view::{
    AccountBalance, Balances, ChainStatus, MiningStatus, NetworkStatus, ViewSink, ViewUpdate,
};
use aleth_core::{BlockRef, NodeResult};
use aleth_extensions::NodeFacade;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// One step of a refresh cycle. Ordered the way a full cycle runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Network,
    Mining,
    BlockCount,
    Balances,
}

impl Stage {
    pub const CYCLE: [Stage; 4] = [
        Stage::Network,
        Stage::Mining,
        Stage::BlockCount,
        Stage::Balances,
    ];
}

/// Change notifications that trigger a partial refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    NewBlock,
    PendingChanged,
    KeysChanged,
}

impl NodeEvent {
    pub fn stages(self) -> &'static [Stage] {
        match self {
            NodeEvent::NewBlock => &[Stage::BlockCount, Stage::Balances],
            NodeEvent::PendingChanged => &[Stage::BlockCount],
            NodeEvent::KeysChanged => &[Stage::Balances],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// A refresh was already in progress.
    Skipped,
}

/// The last value published per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshCycle {
    pub network: Option<NetworkStatus>,
    pub mining: Option<MiningStatus>,
    pub chain: Option<ChainStatus>,
    pub balances: Option<Balances>,
}

/// Drives refresh cycles against the facade and publishes changes to the view.
pub struct RefreshScheduler {
    facade: Arc<dyn NodeFacade>,
    view: Arc<dyn ViewSink>,
    busy: AtomicBool,
    preview: AtomicBool,
    pending: Mutex<BTreeSet<Stage>>,
    last: Mutex<RefreshCycle>,
    cycles: AtomicU64,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshScheduler {
    pub fn new(facade: Arc<dyn NodeFacade>, view: Arc<dyn ViewSink>) -> Self {
        Self {
            facade,
            view,
            busy: AtomicBool::new(false),
            preview: AtomicBool::new(false),
            pending: Mutex::new(BTreeSet::new()),
            last: Mutex::new(RefreshCycle::default()),
            cycles: AtomicU64::new(0),
        }
    }

    /// Runs a full refresh cycle unless one is already running.
    ///
    /// Stages queued before the cycle started are covered by it and dropped from
    /// the queue. Events arriving during the cycle stay queued.
    pub fn tick(&self) -> TickOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("refresh in progress, tick skipped");
            return TickOutcome::Skipped;
        };
        self.pending.lock().clear();
        for stage in Stage::CYCLE {
            self.run_stage(stage);
        }
        self.cycles.fetch_add(1, Ordering::Relaxed);
        TickOutcome::Completed
    }

    /// Runs the given stages, in cycle order, unless a refresh is already running.
    pub fn refresh_stages(&self, stages: &[Stage]) -> TickOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("refresh in progress, tick skipped");
            return TickOutcome::Skipped;
        };
        let ordered: BTreeSet<Stage> = stages.iter().copied().collect();
        for stage in ordered {
            self.run_stage(stage);
        }
        TickOutcome::Completed
    }

    /// Records the stages `event` affects for the next [`RefreshScheduler::run_pending`].
    pub fn enqueue(&self, event: NodeEvent) {
        self.pending.lock().extend(event.stages().iter().copied());
    }

    /// Runs queued stages. While a refresh is in progress they stay queued.
    pub fn run_pending(&self) -> TickOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return TickOutcome::Skipped;
        };
        let stages = std::mem::take(&mut *self.pending.lock());
        for stage in stages {
            self.run_stage(stage);
        }
        TickOutcome::Completed
    }

    /// Stages queued by events and not yet refreshed.
    pub fn pending_stages(&self) -> Vec<Stage> {
        self.pending.lock().iter().copied().collect()
    }

    pub fn is_refreshing(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of full cycles completed.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Reads balances at the pending state instead of the latest block.
    pub fn set_preview(&self, enabled: bool) {
        if self.preview.swap(enabled, Ordering::AcqRel) != enabled {
            self.last.lock().balances = None;
        }
    }

    pub fn is_preview(&self) -> bool {
        self.preview.load(Ordering::Acquire)
    }

    /// A copy of the last value published per stage.
    pub fn last_published(&self) -> RefreshCycle {
        self.last.lock().clone()
    }

    /// Forgets published values so the next cycle republishes everything.
    pub fn reset(&self) {
        *self.last.lock() = RefreshCycle::default();
        self.pending.lock().clear();
    }

    /// Runs one stage. Errors and panics are logged and go no further.
    fn run_stage(&self, stage: Stage) {
        debug!(?stage, "refresh stage");
        let result = catch_unwind(AssertUnwindSafe(|| match stage {
            Stage::Network => self.refresh_network(),
            Stage::Mining => self.refresh_mining(),
            Stage::BlockCount => self.refresh_block_count(),
            Stage::Balances => self.refresh_balances(),
        }));
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(?stage, error = %e, "refresh stage failed"),
            Err(_) => warn!(?stage, "refresh stage panicked"),
        }
    }

    fn refresh_network(&self) -> NodeResult<()> {
        let Some(web3) = self.facade.web3_handle() else {
            return Ok(());
        };
        let status = NetworkStatus {
            networking: web3.is_networking(),
            peers: web3.peer_count(),
        };
        self.publish_if_changed(|last| &mut last.network, status, ViewUpdate::Network);
        Ok(())
    }

    fn refresh_mining(&self) -> NodeResult<()> {
        let Some(chain) = self.facade.node_handle() else {
            return Ok(());
        };
        let status = MiningStatus {
            mining: chain.is_mining(),
            hashrate: chain.hashrate(),
        };
        self.publish_if_changed(|last| &mut last.mining, status, ViewUpdate::Mining);
        Ok(())
    }

    fn refresh_block_count(&self) -> NodeResult<()> {
        let Some(chain) = self.facade.node_handle() else {
            return Ok(());
        };
        let status = ChainStatus {
            blocks: chain.block_count()?,
            pending: chain.pending_count()?,
        };
        self.publish_if_changed(|last| &mut last.chain, status, ViewUpdate::Chain);
        Ok(())
    }

    fn refresh_balances(&self) -> NodeResult<()> {
        let (Some(chain), Some(keys)) = (self.facade.node_handle(), self.facade.key_manager_handle())
        else {
            return Ok(());
        };
        let accounts: Vec<_> = {
            let keys = keys.lock();
            keys.accounts()
                .into_iter()
                .map(|address| {
                    let name = keys.info(&address).map(|info| info.name.clone());
                    (address, name.unwrap_or_default())
                })
                .collect()
        };

        let at = if self.is_preview() {
            BlockRef::Pending
        } else {
            BlockRef::Latest
        };
        let mut balances = Balances::default();
        for (address, name) in accounts {
            let balance = chain.balance(&address, at)?;
            balances.total = balances.total.saturating_add(balance);
            balances.accounts.push(AccountBalance {
                address,
                name,
                balance,
            });
        }
        self.publish_if_changed(|last| &mut last.balances, balances, ViewUpdate::Balances);
        Ok(())
    }

    fn publish_if_changed<T, S, W>(&self, slot: S, value: T, wrap: W)
    where
        T: Clone + PartialEq,
        S: FnOnce(&mut RefreshCycle) -> &mut Option<T>,
        W: FnOnce(T) -> ViewUpdate,
    {
        let changed = {
            let mut last = self.last.lock();
            let slot = slot(&mut last);
            if slot.as_ref() == Some(&value) {
                false
            } else {
                *slot = Some(value.clone());
                true
            }
        };
        if changed {
            self.view.publish(wrap(value));
        }
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("refreshing", &self.is_refreshing())
            .field("preview", &self.is_preview())
            .field("cycles", &self.cycles())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::NullView;
    use aleth_extensions::Unbound;

    #[test]
    fn test_event_stages() {
        assert_eq!(
            NodeEvent::NewBlock.stages(),
            &[Stage::BlockCount, Stage::Balances]
        );
        assert_eq!(NodeEvent::PendingChanged.stages(), &[Stage::BlockCount]);
        assert_eq!(NodeEvent::KeysChanged.stages(), &[Stage::Balances]);
    }

    #[test]
    fn test_cycle_order_matches_stage_order() {
        let mut sorted = Stage::CYCLE;
        sorted.sort();
        assert_eq!(sorted, Stage::CYCLE);
    }

    #[test]
    fn test_unbound_tick_publishes_nothing() {
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = published.clone();
        let scheduler = RefreshScheduler::new(
            Arc::new(Unbound),
            Arc::new(move |update: ViewUpdate| sink.lock().push(update)),
        );

        assert_eq!(scheduler.tick(), TickOutcome::Completed);
        assert_eq!(scheduler.cycles(), 1);
        assert!(published.lock().is_empty());
        assert!(!scheduler.is_refreshing());
    }

    #[test]
    fn test_full_cycle_clears_queued_stages() {
        let scheduler = RefreshScheduler::new(Arc::new(Unbound), Arc::new(NullView));
        scheduler.enqueue(NodeEvent::NewBlock);
        scheduler.enqueue(NodeEvent::KeysChanged);

        assert_eq!(scheduler.tick(), TickOutcome::Completed);
        assert!(scheduler.pending_stages().is_empty());
    }

    #[test]
    fn test_partial_refresh_keeps_queue() {
        let scheduler = RefreshScheduler::new(Arc::new(Unbound), Arc::new(NullView));
        scheduler.enqueue(NodeEvent::KeysChanged);

        scheduler.refresh_stages(&[Stage::Network]);
        assert_eq!(scheduler.pending_stages(), vec![Stage::Balances]);
        assert_eq!(scheduler.cycles(), 0);
    }

    #[test]
    fn test_busy_guard_releases() {
        let flag = AtomicBool::new(false);
        {
            let _guard = BusyGuard::acquire(&flag).unwrap();
            assert!(BusyGuard::acquire(&flag).is_none());
        }
        assert!(BusyGuard::acquire(&flag).is_some());
    }
}
