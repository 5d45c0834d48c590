//! # aleth-zero: control shell for a running blockchain node
//!
//! The shell binds an interactive front-end to a node. It owns:
//! - a plugin registry whose plugins see the node only through the
//!   [`NodeFacade`](extensions::NodeFacade)
//! - an encrypted key store with on-demand credential prompts
//! - the persisted settings and the periodic refresh of status views
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aleth_zero::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShellConfig::default();
//!     let options = ShellOptions::from_config(&config)?;
//!     let mut shell = Shell::new(options, Arc::new(DenyAll), Arc::new(NullView))?;
//!
//!     let account = shell.bridge().create_account("main", "credential", "")?;
//!     println!("created {account}");
//!
//!     shell.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`] - addresses, secrets and the node capability traits
//! - [`config`] - settings persistence and the shell configuration file
//! - [`wallets`] - the encrypted key manager
//! - [`extensions`] - node facade and plugin registry
//! - [`shell`] - the shell, its actions and the refresh scheduler

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use aleth_config as config;
pub use aleth_core as core;
pub use aleth_extensions as extensions;
pub use aleth_shell as shell;
pub use aleth_wallets as wallets;

/// Common imports for embedding the shell
pub mod prelude {
    pub use crate::config::{SettingsBlob, SettingsFlags, SettingsStore, ShellConfig};
    pub use crate::core::{Address, ChainClient, CredentialError, NodeHandle, NodeHandles, Secret};
    pub use crate::extensions::{NodeFacade, Plugin, PluginContext, PluginRegistry};
    pub use crate::shell::{
        Confirmation, NullView, Outcome, Shell, ShellCommand, ShellOptions, ViewSink, ViewUpdate,
    };
    pub use crate::wallets::{CredentialPrompt, DenyAll, KeyManager, ScryptParameters};
}
