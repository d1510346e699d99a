//! Per-file transfer jobs and their lifecycle.
//!
//! # State Machine
//!
//! ```text
//! Detected ──► Stabilizing ──► Stable ──► Copying ──► Succeeded
//!                   │                        │
//!                   ▼                        ▼
//!                TimedOut                  Failed
//! ```
//!
//! `Copying` covers every retry attempt; `attempts` counts them. `TimedOut`,
//! `Succeeded` and `Failed` are terminal.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::TransferError;

/// Lifecycle state of a [`TransferJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Created from a matching creation event.
    Detected,
    /// Waiting for the file size to settle.
    Stabilizing,
    /// Size settled; ready to copy.
    Stable,
    /// Size never settled within the timeout.
    TimedOut,
    /// Copy attempts in progress.
    Copying,
    /// Destination written.
    Succeeded,
    /// Every copy attempt failed.
    Failed,
}

impl JobState {
    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TimedOut | Self::Succeeded | Self::Failed)
    }

    /// Returns `true` if moving from `self` to `next` is a legal step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Detected, Self::Stabilizing)
                | (Self::Stabilizing, Self::Stable | Self::TimedOut)
                | (Self::Stable, Self::Copying)
                | (Self::Copying, Self::Succeeded | Self::Failed)
        )
    }

    /// Returns a short lowercase label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Stabilizing => "stabilizing",
            Self::Stable => "stable",
            Self::TimedOut => "timed_out",
            Self::Copying => "copying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// A single file moving from the watch directory to the target directory.
///
/// Owned by its task for its whole life and discarded once its outcome is
/// logged. Two jobs for the same source may coexist if the watcher reports
/// the file twice; both copy to the same destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    source: Utf8PathBuf,
    destination: Utf8PathBuf,
    attempts: u32,
    state: JobState,
}

impl TransferJob {
    /// Creates a job copying `source` to `target_dir/<file name of source>`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NoFileName`] if `source` has no final
    /// file-name component (for example `/` or a path ending in `..`).
    ///
    /// # Examples
    ///
    /// ```
    /// use fc_transfer::{JobState, TransferJob};
    /// use camino::Utf8Path;
    ///
    /// let job = TransferJob::new(Utf8Path::new("/in/sub/report.csv"), Utf8Path::new("/out")).unwrap();
    /// assert_eq!(job.destination().as_str(), "/out/report.csv");
    /// assert_eq!(job.state(), JobState::Detected);
    /// ```
    pub fn new(source: &Utf8Path, target_dir: &Utf8Path) -> Result<Self, TransferError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| TransferError::NoFileName(source.to_owned()))?;

        Ok(Self {
            source: source.to_owned(),
            destination: target_dir.join(file_name),
            attempts: 0,
            state: JobState::Detected,
        })
    }

    /// Returns the file being transferred.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Returns where the file is copied to.
    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        &self.destination
    }

    /// Returns the number of copy attempts made so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    pub(crate) fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal job transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(
            source = %self.source,
            from = self.state.label(),
            to = next.label(),
            "Job state change"
        );
        self.state = next;
    }

    pub(crate) fn record_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
    }
}

/// How a job settled.
#[derive(Debug)]
pub enum TransferOutcome {
    /// The destination now holds a copy of the source.
    Succeeded {
        /// Bytes written by the successful attempt.
        bytes: u64,
    },
    /// Every attempt failed; carries the last error.
    Failed(TransferError),
    /// The file never stopped changing within the stabilization timeout.
    Unstable,
}

impl TransferOutcome {
    /// Returns `true` if the file was copied.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { bytes } => write!(f, "succeeded ({bytes} bytes)"),
            Self::Failed(error) => write!(f, "failed: {error}"),
            Self::Unstable => f.write_str("abandoned: file did not stabilize"),
        }
    }
}
