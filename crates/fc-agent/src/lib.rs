//! The file-courier agent.
//!
//! Wires a [`DirectoryWatcher`](fc_watcher::DirectoryWatcher) to the
//! transfer pipeline and owns startup and shutdown:
//!
//! - [`Agent`]: validates, mounts, subscribes, then becomes a [`RunningAgent`]
//! - [`EventDispatcher`]: one transfer task per matching creation event
//! - [`RemoteMounter`]: makes a network share available at the target
//!
//! # Architecture
//!
//! ```text
//! AgentConfig
//!     │ validate ─► mount (if credentials) ─► validate_directories ─► subscribe
//!     ▼
//! RunningAgent::run ──────────────────────────────────────────────┐
//!     │ select! { cancelled, event, watcher error }               │
//!     ▼                                                           │
//! EventDispatcher::dispatch ──► JoinSet task ──► TransferPipeline │
//!                                                                 │
//! on cancel: close watcher ─► drain tasks ─► StatsSnapshot ◄──────┘
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod agent;
pub mod dispatcher;
pub mod error;
pub mod mount;

pub use agent::{Agent, RunningAgent};
pub use dispatcher::{Dispatch, EventDispatcher};
pub use error::AgentError;
pub use mount::{MountError, NetUseCommand, NetUseMounter, RemoteMounter};
