//! The per-file transfer pipeline.
//!
//! [`TransferPipeline::run`] takes one [`TransferJob`] through the gated
//! stabilize+copy critical section, logs the outcome, updates
//! [`TransferStats`] and returns a [`TransferReport`]. It never fails: every
//! per-file error is folded into the report's [`TransferOutcome`].

use std::sync::Arc;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::mpsc;

use fc_core::TransferConfig;

use crate::copier::{FileCopier, RetryingCopier};
use crate::gate::TransferGate;
use crate::job::{JobState, TransferJob, TransferOutcome};
use crate::stability::StabilityDetector;
use crate::stats::TransferStats;

/// When a job held the transfer gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalSection {
    /// Taken right after the gate was acquired.
    pub entered: Instant,
    /// Taken right before the gate was released.
    pub exited: Instant,
}

impl CriticalSection {
    /// Returns `true` if the two sections share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.entered < other.exited && other.entered < self.exited
    }
}

/// The settled result of one [`TransferJob`].
#[derive(Debug)]
pub struct TransferReport {
    /// The job in its terminal state.
    pub job: TransferJob,
    /// How it settled.
    pub outcome: TransferOutcome,
    /// When it held the gate.
    pub critical_section: CriticalSection,
}

/// Runs transfer jobs through stabilization and copying, one at a time.
///
/// Cheap to clone; clones share the gate, the copier and the stats.
#[derive(Debug)]
pub struct TransferPipeline<C> {
    detector: StabilityDetector,
    copier: RetryingCopier<C>,
    gate: TransferGate,
    stats: Arc<TransferStats>,
    target_dir: Utf8PathBuf,
    reports: Option<mpsc::UnboundedSender<TransferReport>>,
}

impl<C> Clone for TransferPipeline<C> {
    fn clone(&self) -> Self {
        Self {
            detector: self.detector,
            copier: self.copier.clone(),
            gate: self.gate.clone(),
            stats: Arc::clone(&self.stats),
            target_dir: self.target_dir.clone(),
            reports: self.reports.clone(),
        }
    }
}

impl<C: FileCopier> TransferPipeline<C> {
    /// Creates a pipeline copying into `target_dir`.
    #[must_use]
    pub fn new(
        target_dir: &Utf8Path,
        config: &TransferConfig,
        copier: C,
        gate: TransferGate,
        stats: Arc<TransferStats>,
    ) -> Self {
        Self {
            detector: StabilityDetector::from_config(config),
            copier: RetryingCopier::from_config(copier, config),
            gate,
            stats,
            target_dir: target_dir.to_owned(),
            reports: None,
        }
    }

    /// Sends a copy of every finished report to `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<TransferReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Returns the directory files are copied into.
    #[must_use]
    pub fn target_dir(&self) -> &Utf8Path {
        &self.target_dir
    }

    /// Returns the shared counters.
    #[must_use]
    pub fn stats(&self) -> &Arc<TransferStats> {
        &self.stats
    }

    /// Builds a job for `source` destined for this pipeline's target.
    ///
    /// # Errors
    ///
    /// See [`TransferJob::new`].
    pub fn job_for(&self, source: &Utf8Path) -> Result<TransferJob, crate::TransferError> {
        TransferJob::new(source, &self.target_dir)
    }

    /// Runs `job` to completion.
    ///
    /// Waits for the gate, then for the file to stabilize, then copies it
    /// with retries. The gate is held throughout and released before the
    /// report is published.
    pub async fn run(&self, mut job: TransferJob) -> TransferReport {
        let permit = self.gate.acquire().await;
        let entered = Instant::now();

        job.transition(JobState::Stabilizing);
        let outcome = if self.detector.wait_until_stable(job.source()).await {
            job.transition(JobState::Stable);
            job.transition(JobState::Copying);
            match self
                .copier
                .copy_with_retry(job.source(), job.destination())
                .await
            {
                Ok(report) => {
                    job.record_attempts(report.attempts);
                    job.transition(JobState::Succeeded);
                    TransferOutcome::Succeeded {
                        bytes: report.bytes,
                    }
                }
                Err(error) => {
                    if let crate::TransferError::CopyFailed { attempts, .. } = &error {
                        job.record_attempts(*attempts);
                    }
                    job.transition(JobState::Failed);
                    TransferOutcome::Failed(error)
                }
            }
        } else {
            job.transition(JobState::TimedOut);
            TransferOutcome::Unstable
        };

        let exited = Instant::now();
        drop(permit);

        self.record(&job, &outcome);

        let report = TransferReport {
            job,
            outcome,
            critical_section: CriticalSection { entered, exited },
        };
        self.publish(report)
    }

    fn record(&self, job: &TransferJob, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Succeeded { bytes } => {
                self.stats.record_succeeded(*bytes);
                tracing::info!(
                    source = %job.source(),
                    destination = %job.destination(),
                    bytes,
                    attempts = job.attempts(),
                    "File transferred"
                );
            }
            TransferOutcome::Failed(error) => {
                self.stats.record_failed();
                tracing::error!(
                    source = %job.source(),
                    destination = %job.destination(),
                    attempts = job.attempts(),
                    error = %error,
                    "File transfer failed"
                );
            }
            TransferOutcome::Unstable => {
                self.stats.record_unstable();
                tracing::warn!(
                    source = %job.source(),
                    timeout_ms = u64::try_from(self.detector.timeout().as_millis()).unwrap_or(u64::MAX),
                    "File did not stabilize in time, skipping"
                );
            }
        }
    }

    fn publish(&self, report: TransferReport) -> TransferReport {
        let Some(reports) = &self.reports else {
            return report;
        };
        // The observer gets its own copy; the caller keeps this one.
        let copy = TransferReport {
            job: report.job.clone(),
            outcome: match &report.outcome {
                TransferOutcome::Succeeded { bytes } => TransferOutcome::Succeeded { bytes: *bytes },
                TransferOutcome::Unstable => TransferOutcome::Unstable,
                TransferOutcome::Failed(error) => TransferOutcome::Failed(error.duplicate()),
            },
            critical_section: report.critical_section,
        };
        if reports.send(copy).is_err() {
            tracing::trace!("Report observer closed");
        }
        report
    }
}
