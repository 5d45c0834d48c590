//! Aleth Shell
//!
//! The control shell that binds an interactive front-end to a running node.
//! It owns the plugin registry, the key manager, the persisted settings and
//! the refresh scheduler, and exposes the node to everything else through the
//! facade binding.

pub mod actions;
pub mod annotations;
pub mod binding;
pub mod bridge;
pub mod confirmation;
pub mod error;
pub mod scheduler;
pub mod shell;
pub mod view;

pub use actions::Outcome;
pub use annotations::AnnotationBook;
pub use binding::LiveFacade;
pub use bridge::KeyManagerBridge;
pub use confirmation::Confirmation;
pub use error::{BridgeError, ShellError, ShellResult};
pub use scheduler::{NodeEvent, RefreshCycle, RefreshScheduler, Stage, TickOutcome};
pub use shell::{Shell, ShellCommand, ShellOptions};
pub use view::{
    AccountBalance, Balances, ChainStatus, LogLevel, MiningStatus, NetworkStatus, NullView,
    ViewSink, ViewUpdate,
};
