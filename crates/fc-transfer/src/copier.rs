//! File copying with bounded, fixed-delay retries.
//!
//! [`FileCopier`] is the single-attempt seam: [`FsCopier`] performs a real
//! overwrite-copy, tests substitute fakes. [`RetryingCopier`] runs a copier on
//! the blocking pool up to `max_attempts` times, sleeping `retry_delay` between
//! failed attempts but not after the last one.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use fc_core::TransferConfig;

use crate::error::TransferError;

/// Copies one file once.
///
/// Implementations are blocking and run under
/// [`tokio::task::spawn_blocking`]. They must overwrite an existing
/// destination and return the number of bytes written.
pub trait FileCopier: Send + Sync + 'static {
    /// Copies `source` to `destination`, replacing it if present.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error of this attempt.
    fn copy(&self, source: &Utf8Path, destination: &Utf8Path) -> io::Result<u64>;
}

/// Copies through the local filesystem with [`std::fs::copy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, source: &Utf8Path, destination: &Utf8Path) -> io::Result<u64> {
        std::fs::copy(source, destination)
    }
}

impl<C: FileCopier> FileCopier for Arc<C> {
    fn copy(&self, source: &Utf8Path, destination: &Utf8Path) -> io::Result<u64> {
        (**self).copy(source, destination)
    }
}

/// Result of a successful [`RetryingCopier::copy_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    /// Bytes written by the successful attempt.
    pub bytes: u64,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Retries a [`FileCopier`] a bounded number of times.
#[derive(Debug)]
pub struct RetryingCopier<C> {
    copier: Arc<C>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<C> Clone for RetryingCopier<C> {
    fn clone(&self) -> Self {
        Self {
            copier: Arc::clone(&self.copier),
            max_attempts: self.max_attempts,
            retry_delay: self.retry_delay,
        }
    }
}

impl<C: FileCopier> RetryingCopier<C> {
    /// Creates a retrying copier. `max_attempts` below one is treated as one.
    #[must_use]
    pub fn new(copier: C, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            copier: Arc::new(copier),
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Creates a retrying copier using the configured attempt limit and delay.
    #[must_use]
    pub fn from_config(copier: C, config: &TransferConfig) -> Self {
        Self::new(copier, config.max_attempts, config.retry_delay())
    }

    /// Returns the attempt limit.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the pause between failed attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Copies `source` to `destination`, retrying on failure.
    ///
    /// Stops at the first success. A panic inside the copier counts as a
    /// failed attempt.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::CopyFailed`] carrying the last attempt's
    /// error once every attempt has failed.
    pub async fn copy_with_retry(
        &self,
        source: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<CopyReport, TransferError> {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            tracing::info!(
                source = %source,
                destination = %destination,
                attempt,
                max_attempts = self.max_attempts,
                "Copying file"
            );

            match self.attempt(source, destination).await {
                Ok(bytes) => {
                    return Ok(CopyReport {
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(error) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        source = %source,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Copy attempt failed, no attempts left"
                    );
                    return Err(TransferError::CopyFailed {
                        source_path: source.to_owned(),
                        destination: destination.to_owned(),
                        attempts: attempt,
                        source: error,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        source = %source,
                        attempt,
                        max_attempts = self.max_attempts,
                        retry_in_ms = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Copy attempt failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn attempt(&self, source: &Utf8Path, destination: &Utf8Path) -> io::Result<u64> {
        let copier = Arc::clone(&self.copier);
        let source: Utf8PathBuf = source.to_owned();
        let destination: Utf8PathBuf = destination.to_owned();

        tokio::task::spawn_blocking(move || copier.copy(&source, &destination))
            .await
            .unwrap_or_else(|join_error| Err(io::Error::other(join_error)))
    }
}
