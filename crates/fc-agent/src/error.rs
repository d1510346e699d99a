//! Error types for the fc-agent crate.

use fc_core::ConfigError;
use fc_watcher::WatchError;

use crate::mount::MountError;

/// Errors that stop the agent before its run loop starts.
///
/// Every variant is a fatal startup error. Once the agent is running,
/// per-file and watcher-stream errors are logged instead of returned.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The configuration is invalid or a configured directory is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Mounting the remote target failed.
    #[error("failed to mount remote target: {0}")]
    Mount(#[from] MountError),

    /// The watch subscription could not be opened.
    #[error("failed to watch directory: {0}")]
    Watch(#[from] WatchError),
}

impl AgentError {
    /// Returns a short label for the startup phase that failed.
    #[must_use]
    pub const fn phase(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Mount(_) => "mount",
            Self::Watch(_) => "watch",
        }
    }
}
