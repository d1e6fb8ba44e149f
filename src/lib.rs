//! kube-torcx library exports.
//!
//! The binary in `main.rs` is a thin multicall wrapper around
//! [`multicall::Dispatcher`]; everything else lives here so it can be
//! exercised from the integration tests.

pub mod commands;
pub mod config;
pub mod error;
pub mod flags;
pub mod kube;
pub mod logging;
pub mod manifest;
pub mod multicall;
pub mod node;
pub mod preflight;
pub mod process;
pub mod validate;
pub mod versions;

pub use config::Config;
pub use error::{Error, Result};
