//! One module per family of engine calls. Each op issues typed requests
//! through [`DelveClient::call`](crate::DelveClient::call) and returns the
//! engine's answer unrendered; formatting is the caller's concern.

pub mod breakpoints;
pub mod command;
pub mod eval;
pub mod stack;
pub mod state;
