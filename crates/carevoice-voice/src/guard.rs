//! Processing guard: keeps one clip from entering transcription twice.
//!
//! Stop can be requested more than once for the same recording (a double
//! click, a toggle racing a cancel). The guard is a shared atomic latch; the
//! first hand-off takes a [`ProcessingPermit`] and every other attempt is
//! turned away until that permit is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Latch value meaning "no hand-off in progress".
const FREE: u64 = 0;

/// Shared in-progress latch for transcription hand-offs.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ProcessingGuard {
    /// `FREE`, or the id of the permit currently holding the latch.
    holder: Arc<AtomicU64>,

    /// Source of permit ids.
    next_id: Arc<AtomicU64>,
}

impl ProcessingGuard {
    /// Create a new guard (initially free).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the latch. `None` if a hand-off is already in progress.
    pub fn try_begin(&self) -> Option<ProcessingPermit> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.holder
            .compare_exchange(FREE, id, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        tracing::trace!(permit = id, "Processing guard taken");
        Some(ProcessingPermit {
            id,
            holder: Arc::clone(&self.holder),
        })
    }

    /// Whether a hand-off currently holds the latch.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.holder.load(Ordering::SeqCst) != FREE
    }

    /// Force the latch free (turn reset). A permit outstanding from before
    /// the reset no longer owns the latch and will not clear a newer one.
    pub fn reset(&self) {
        self.holder.store(FREE, Ordering::SeqCst);
    }
}

/// Proof of an in-progress hand-off. Dropping it frees the guard.
#[derive(Debug)]
pub struct ProcessingPermit {
    id: u64,
    holder: Arc<AtomicU64>,
}

impl Drop for ProcessingPermit {
    fn drop(&mut self) {
        // Only clear the latch if it is still ours.
        let _ = self
            .holder
            .compare_exchange(self.id, FREE, Ordering::SeqCst, Ordering::SeqCst);
    }
}
