//! Mutual exclusion for the stabilize+copy critical section.
//!
//! Every transfer task in one agent shares a single [`TransferGate`]. A task
//! holds the [`TransferPermit`] from before its stabilization wait until its
//! last copy attempt has settled, so at most one file is being stabilized or
//! copied at any moment. Release happens in `Drop`, which covers the timeout
//! path, the retry-exhaustion path and early returns alike.
//!
//! The gate is a `tokio::sync::Mutex`, whose waiters are served in FIFO
//! order, so no task starves while others keep arriving.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A cloneable handle to the shared transfer gate.
///
/// # Examples
///
/// ```
/// use fc_transfer::TransferGate;
///
/// # async fn example() {
/// let gate = TransferGate::new();
/// {
///     let _permit = gate.acquire().await;
///     assert!(gate.is_held());
/// }
/// assert!(!gate.is_held());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransferGate {
    inner: Arc<Mutex<()>>,
}

impl TransferGate {
    /// Creates a new, unheld gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds the gate, then takes it.
    ///
    /// The gate is released when the returned permit is dropped.
    pub async fn acquire(&self) -> TransferPermit {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        TransferPermit { _guard: guard }
    }

    /// Takes the gate only if it is free right now.
    pub fn try_acquire(&self) -> Option<TransferPermit> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .ok()
            .map(|guard| TransferPermit { _guard: guard })
    }

    /// Returns `true` while some task holds a permit.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

/// Proof of holding the [`TransferGate`]. Dropping it releases the gate.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct TransferPermit {
    _guard: OwnedMutexGuard<()>,
}
