//! Aleth Extensions
//!
//! The extension points of the shell: the [`NodeFacade`] capability set that
//! plugins and the refresh scheduler read the node through, and the
//! [`PluginRegistry`] that owns loaded plugins.

pub mod error;
pub mod facade;
pub mod plugin;

pub use error::{ExtensionError, ExtensionResult};
pub use facade::{annotate_call, FacadeBinding, NodeFacade, Unbound};
pub use plugin::{
    Plugin, PluginCatalog, PluginContext, PluginFactory, PluginHandle, PluginRegistry,
};
