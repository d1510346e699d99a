//! Transfer outcome counters.
//!
//! [`TransferStats`] is shared between the dispatcher and every transfer task
//! behind an `Arc`. All counters use [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering; they feed the shutdown summary and nothing synchronizes on them.
//!
//! # Examples
//!
//! ```
//! use fc_transfer::TransferStats;
//!
//! let stats = TransferStats::new();
//! stats.record_detected();
//! stats.record_succeeded(2048);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.succeeded, 1);
//! assert_eq!(snapshot.bytes_copied, 2048);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for transfer outcomes.
#[derive(Debug, Default)]
pub struct TransferStats {
    /// Matching creation events accepted for transfer.
    detected: AtomicU64,
    /// Jobs whose copy succeeded.
    succeeded: AtomicU64,
    /// Jobs that exhausted their copy attempts.
    failed: AtomicU64,
    /// Jobs abandoned because the file never stabilized.
    unstable: AtomicU64,
    /// Matching events dropped because no task could be started.
    dropped: AtomicU64,
    /// Total bytes written by successful copies.
    bytes_copied: AtomicU64,
}

impl TransferStats {
    /// Creates a new [`TransferStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a matching event that was handed to a transfer task.
    #[inline]
    pub fn record_detected(&self) {
        self.detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a successful copy of `bytes` bytes.
    #[inline]
    pub fn record_succeeded(&self, bytes: u64) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Counts a job whose copy attempts were exhausted.
    #[inline]
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a job abandoned by the stability check.
    #[inline]
    pub fn record_unstable(&self) {
        self.unstable.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a matching event that was dropped before a task started.
    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            detected: self.detected.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unstable: self.unstable.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`TransferStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Matching events accepted for transfer.
    pub detected: u64,
    /// Successful copies.
    pub succeeded: u64,
    /// Jobs that exhausted their attempts.
    pub failed: u64,
    /// Jobs abandoned as unstable.
    pub unstable: u64,
    /// Matching events dropped before a task started.
    pub dropped: u64,
    /// Bytes written by successful copies.
    pub bytes_copied: u64,
}

impl StatsSnapshot {
    /// Returns the number of jobs that reached a terminal outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use fc_transfer::StatsSnapshot;
    ///
    /// let snap = StatsSnapshot {
    ///     detected: 10,
    ///     succeeded: 6,
    ///     failed: 1,
    ///     unstable: 2,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(snap.settled(), 9);
    /// assert_eq!(snap.in_flight(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub const fn settled(&self) -> u64 {
        self.succeeded + self.failed + self.unstable
    }

    /// Returns the number of accepted jobs that have not settled yet.
    #[inline]
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.detected.saturating_sub(self.settled())
    }

    /// Returns `true` if no transfer failed or was dropped or abandoned.
    #[inline]
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0 && self.unstable == 0 && self.dropped == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_is_zeroed() {
        let snap = TransferStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
        assert!(snap.is_clean());
        assert_eq!(snap.in_flight(), 0);
    }

    #[test]
    fn test_record_each_outcome() {
        let stats = TransferStats::new();
        stats.record_detected();
        stats.record_detected();
        stats.record_detected();
        stats.record_detected();
        stats.record_succeeded(100);
        stats.record_succeeded(23);
        stats.record_failed();
        stats.record_dropped();

        let snap = stats.snapshot();
        assert_eq!(snap.detected, 4);
        assert_eq!(snap.succeeded, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.unstable, 0);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.bytes_copied, 123);
        assert_eq!(snap.settled(), 3);
        assert_eq!(snap.in_flight(), 1);
        assert!(!snap.is_clean());
    }

    #[test]
    fn test_unstable_is_not_clean() {
        let stats = TransferStats::new();
        stats.record_detected();
        stats.record_unstable();
        let snap = stats.snapshot();
        assert!(!snap.is_clean());
        assert_eq!(snap.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = Arc::new(TransferStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        stats.record_detected();
                        stats.record_succeeded(2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.detected, 1000);
        assert_eq!(snap.succeeded, 1000);
        assert_eq!(snap.bytes_copied, 2000);
    }
}
