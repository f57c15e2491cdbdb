//! Delve Bridge Core
//!
//! A small async library for driving a headless Delve instance over its JSON-RPC
//! API. Every CLI invocation resolves the session handle written by `start`,
//! opens one connection, issues its requests and disconnects; nothing is kept
//! alive between invocations except the engine process itself.

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod ops;
pub mod rpclog;
pub mod types;

// Re-export commonly used types
pub use client::DelveClient;
pub use config::DelveConfig;
pub use error::DelveError;
pub use handle::{HandleStore, SessionHandle};

/// Result type alias using DelveError
pub type Result<T> = std::result::Result<T, DelveError>;
