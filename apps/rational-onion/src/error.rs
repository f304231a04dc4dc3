//! # Application Errors
//!
//! Failures of the binary itself. Engine failures pass through unchanged.

use rational_onion_core::OnionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] OnionError),

    /// Binding, serving or writing output failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A destructive command was refused.
    #[error("{0}")]
    Refused(String),
}
