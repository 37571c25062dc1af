//! Error types for CLI operations.

use dispatcher::DispatchError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Nothing to dispatch
    #[error("No targets configured: pass --url or add [[targets]] to the config")]
    NoTargets,

    /// Dispatcher could not be built or refused the request
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}
