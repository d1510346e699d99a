//! Core configuration types and errors for the file-courier agent.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`AgentConfig`]: the JSON configuration file, immutable after load
//! - [`TransferConfig`] and [`WatchConfig`]: tuning sections with defaults
//!   matching the agent's fixed timing constants
//! - [`RemoteCredentials`]: network share credentials with a redacted `Debug`
//! - [`ConfigError`]: loading and validation failures

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{AgentConfig, RemoteCredentials, TransferConfig, WatchConfig};
pub use error::ConfigError;
