//! Write-completion detection by polling file size.
//!
//! A file is considered fully written once two consecutive size reads, one
//! poll interval apart, return the same value. This needs no platform
//! "file closed" notification. It can be fooled by a writer that pauses for
//! exactly one interval mid-write, which is accepted.
//!
//! ```text
//! t=0      t=1·poll   t=2·poll   t=3·poll
//!  │          │          │          │
//! start     read s1    read s2    read s3 ...
//!                        │
//!                 s2 == s1 ─► stable
//! ```

use std::time::Duration;

use camino::Utf8Path;
use tokio::time::{Instant, MissedTickBehavior};

use fc_core::TransferConfig;

/// Polls a file's size until it stops changing or a timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityDetector {
    poll_interval: Duration,
    timeout: Duration,
}

impl StabilityDetector {
    /// Creates a detector with explicit timing.
    ///
    /// A zero poll interval is raised to one millisecond.
    #[must_use]
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            timeout,
        }
    }

    /// Creates a detector from the transfer configuration.
    #[must_use]
    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.poll_interval(), config.stabilization_timeout())
    }

    /// Returns the interval between size reads.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns how long to wait before giving up.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits until `path` has the same size on two consecutive polls.
    ///
    /// Returns `true` as soon as the second equal read happens, and `false`
    /// if the timeout elapses first or if reading the size fails (the file
    /// was removed or became unreadable). A failed read is not retried.
    pub async fn wait_until_stable(&self, path: &Utf8Path) -> bool {
        let start = Instant::now();
        let deadline = tokio::time::sleep_until(start + self.timeout);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval_at(start + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_size: Option<u64> = None;
        let mut polls = 0_u32;

        loop {
            tokio::select! {
                biased;

                // When a tick and the deadline are ready together, the deadline wins.
                () = &mut deadline => {
                    tracing::debug!(path = %path, polls, last_size, "Stabilization deadline reached");
                    return false;
                }
                _ = ticker.tick() => {
                    polls += 1;
                    let size = match tokio::fs::metadata(path).await {
                        Ok(metadata) => metadata.len(),
                        Err(error) => {
                            tracing::warn!(path = %path, error = %error, "Failed to read file size");
                            return false;
                        }
                    };

                    if last_size == Some(size) {
                        tracing::debug!(
                            path = %path,
                            size,
                            polls,
                            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                            "File is stable"
                        );
                        return true;
                    }
                    last_size = Some(size);
                }
            }
        }
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}
