//! # rational-onion
//!
//! The HTTP server and CLI around `rational-onion-core`.
//!
//! The binary in `main.rs` only sets up logging and dispatches to `cli`;
//! everything else lives here so integration tests can build the router.

pub mod api;
pub mod cli;
pub mod error;
pub mod settings;

pub use error::AppError;
pub use settings::Settings;
