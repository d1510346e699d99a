//! Directory watcher with separate event and error streams.
//!
//! This crate subscribes to filesystem change notifications for a single
//! directory (non-recursive) via the `notify` crate and bridges them into
//! tokio channels for a single async consumer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 notify thread (RecommendedWatcher)           │
//! │  ┌──────────────────┐    ┌──────────────────────────────┐    │
//! │  │ inotify / FSEvents│ -> │ callback: classify + split   │    │
//! │  │ ReadDirectoryChanges│  │ one ChangeEvent per path     │    │
//! │  └──────────────────┘    └───────┬──────────────┬───────┘    │
//! └──────────────────────────────────│──────────────│────────────┘
//!                       blocking_send│              │blocking_send
//!                                    ▼              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Async Runtime (tokio)                    │
//! │   mpsc<ChangeEvent>            mpsc<WatchError>              │
//! │          └──────────► consumer select! loop ◄───────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a debounced watcher, events keep their operation kind so the
//! consumer can act on creations only.
//!
//! # Usage
//!
//! ```no_run
//! use fc_watcher::{ChangeKind, DirectoryWatcher, ExtensionFilter, FileFilter};
//! use fc_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), fc_watcher::WatchError> {
//! let mut watcher = DirectoryWatcher::subscribe(Utf8Path::new("/in"), &WatchConfig::default())?;
//! let filter = ExtensionFilter::new([".csv"]);
//!
//! let (events, errors) = watcher.streams();
//!
//! loop {
//!     tokio::select! {
//!         event = events.recv() => match event {
//!             Some(event) if event.kind == ChangeKind::Created && filter.should_process(&event.path) => {
//!                 println!("new file: {}", event.path);
//!             }
//!             Some(_) => {}
//!             None => break,
//!         },
//!         error = errors.recv() => match error {
//!             Some(error) => eprintln!("watcher error: {error}"),
//!             None => break,
//!         },
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export event types
pub use events::{ChangeEvent, ChangeKind};

// Re-export filter types
pub use filter::{ExtensionFilter, FileFilter, matching_extension};

// Re-export watcher types
pub use watcher::DirectoryWatcher;
