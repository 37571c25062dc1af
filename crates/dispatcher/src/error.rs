//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-level errors
///
/// Only precondition and setup failures live here. Per-item failures are
/// reported as failure outcomes inside the `ResultSet`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Timeout is zero
    #[error("dispatch timeout must be positive, got {timeout_ms}ms")]
    InvalidTimeout { timeout_ms: u128 },

    /// Item list longer than the configured maximum
    #[error("dispatch of {count} items exceeds max_items={max}")]
    TooManyItems { count: usize, max: usize },

    /// Dispatcher configuration rejected by the builder
    #[error("invalid dispatcher config '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Operation construction error
    #[error("failed to create operation '{name}': {message}")]
    OperationSetup { name: String, message: String },
}

impl DispatchError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an operation setup error
    pub fn operation_setup(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationSetup {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Short label used as a metrics dimension
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidTimeout { .. } => "invalid_timeout",
            Self::TooManyItems { .. } => "too_many_items",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::OperationSetup { .. } => "operation_setup",
        }
    }
}
