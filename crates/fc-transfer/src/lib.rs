//! Stabilize-then-copy transfer pipeline.
//!
//! This crate moves a single detected file from the watch directory to the
//! target directory:
//!
//! - [`StabilityDetector`]: waits until the file's size stops changing
//! - [`TransferGate`]: one stabilize+copy critical section at a time
//! - [`RetryingCopier`]: bounded, fixed-delay retries over a [`FileCopier`]
//! - [`TransferPipeline`]: runs a [`TransferJob`] through all of the above
//! - [`TransferStats`]: atomic outcome counters
//!
//! # Architecture
//!
//! ```text
//! TransferJob (Detected)
//!     │
//!     ▼
//! TransferGate::acquire ───────────────────────────┐ critical section
//!     │                                            │
//!     ├── StabilityDetector::wait_until_stable     │
//!     │       │ false ──► Unstable                 │
//!     │       ▼ true                               │
//!     └── RetryingCopier::copy_with_retry          │
//!             │ Ok ──► Succeeded                   │
//!             │ Err ─► Failed                      │
//!     TransferPermit dropped ◄─────────────────────┘
//!     │
//!     ▼
//! TransferReport ──► log + stats (+ optional observer channel)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fc_core::TransferConfig;
//! use fc_transfer::{FsCopier, TransferGate, TransferJob, TransferPipeline, TransferStats};
//! use camino::Utf8Path;
//!
//! # async fn example() {
//! let pipeline = TransferPipeline::new(
//!     Utf8Path::new("/out"),
//!     &TransferConfig::default(),
//!     FsCopier,
//!     TransferGate::new(),
//!     Arc::new(TransferStats::new()),
//! );
//!
//! let job = TransferJob::new(Utf8Path::new("/in/report.csv"), Utf8Path::new("/out")).unwrap();
//! let report = pipeline.run(job).await;
//! println!("{}: {}", report.job.source(), report.outcome);
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod copier;
pub mod error;
pub mod gate;
pub mod job;
pub mod pipeline;
pub mod stability;
pub mod stats;

pub use copier::{CopyReport, FileCopier, FsCopier, RetryingCopier};
pub use error::TransferError;
pub use gate::{TransferGate, TransferPermit};
pub use job::{JobState, TransferJob, TransferOutcome};
pub use pipeline::{CriticalSection, TransferPipeline, TransferReport};
pub use stability::StabilityDetector;
pub use stats::{StatsSnapshot, TransferStats};
