//! Error types for the extension framework

use thiserror::Error;

/// Result type alias for extension operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// A plugin with the same name is already loaded.
    #[error("Plugin '{0}' is already loaded")]
    DuplicatePlugin(String),

    /// No loaded plugin has this name.
    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),

    /// The catalog has no factory under this name.
    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// The plugin's initialize hook failed; nothing was registered.
    #[error("Plugin '{plugin}' failed to initialize: {reason}")]
    InitializationFailed { plugin: String, reason: String },

    /// Generic plugin operation failure.
    #[error("Plugin operation failed: {0}")]
    OperationFailed(String),
}

impl ExtensionError {
    /// Helper for creating an operation failure error with a message.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }
}
