//! Debounced save coordination
//!
//! Tracks which notes hold unsaved edits and owns the one quiet-period
//! timer each of them may have. Bursts of edits re-arm the same timer, so a
//! typing session produces a single write once the user pauses.
//!
//! The coordinator never touches storage itself. The store hands it a
//! callback when scheduling and asks it to `claim`, `begin_flush` and
//! `complete` around each write. It also remembers deletes whose backend
//! removal failed so the next flush can retry them.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Save state of a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Everything in memory has been written
    Idle,
    /// Edits are waiting for a timer, a flush, or a retry
    Pending,
}

struct PendingSave {
    /// Bumped on every edit; a write only clears the entry if no newer edit arrived
    generation: u64,
    /// Sleeping timer task, `None` once claimed or after a failed write
    timer: Option<JoinHandle<()>>,
}

/// Per-note debounce timers and dirty tracking
pub struct SaveCoordinator {
    delay: Mutex<Duration>,
    pending: Mutex<HashMap<String, PendingSave>>,
    /// Notes gone from memory whose stored row still has to be removed
    removals: Mutex<HashSet<String>>,
    next_generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SaveCoordinator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: Mutex::new(delay),
            pending: Mutex::new(HashMap::new()),
            removals: Mutex::new(HashSet::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn delay(&self) -> Duration {
        *lock(&self.delay)
    }

    /// Change the quiet period. Timers already running keep their old deadline.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
        tracing::debug!("Auto-save delay set to {:?}", delay);
    }

    /// Arm or re-arm the timer for `id`.
    ///
    /// `fire` receives the generation of this edit and runs once the quiet
    /// period passes without another `schedule` for the same note. Must be
    /// called from within a Tokio runtime.
    pub fn schedule<F, Fut>(&self, id: &str, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay();

        let mut pending = lock(&self.pending);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation).await;
        });

        let previous = pending.insert(
            id.to_string(),
            PendingSave {
                generation,
                timer: Some(timer),
            },
        );

        match previous.and_then(|p| p.timer) {
            Some(stale) => {
                stale.abort();
                tracing::trace!("Re-armed auto-save timer for note {}", id);
            }
            None => tracing::trace!("Armed auto-save timer for note {}", id),
        }

        generation
    }

    /// Mark `id` dirty without a timer, cancelling any timer it had.
    ///
    /// Used before a synchronous write so the next flush picks it up.
    pub fn mark_dirty(&self, id: &str) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let previous = lock(&self.pending).insert(
            id.to_string(),
            PendingSave {
                generation,
                timer: None,
            },
        );

        if let Some(stale) = previous.and_then(|p| p.timer) {
            stale.abort();
        }

        generation
    }

    /// Called by a timer when it wakes. True if it is still the current
    /// timer for the note and should write.
    pub fn claim(&self, id: &str, generation: u64) -> bool {
        let mut pending = lock(&self.pending);

        match pending.get_mut(id) {
            Some(entry) if entry.generation == generation && entry.timer.is_some() => {
                entry.timer = None;
                true
            }
            _ => false,
        }
    }

    /// Stop the timer for `id` ahead of an immediate write.
    ///
    /// Returns the generation to pass to `complete`, or `None` when there is
    /// nothing to write.
    pub fn begin_flush(&self, id: &str) -> Option<u64> {
        let mut pending = lock(&self.pending);
        let entry = pending.get_mut(id)?;

        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }

        Some(entry.generation)
    }

    /// Record a successful write. The note returns to `Idle` unless it was
    /// edited again while the write was in flight.
    pub fn complete(&self, id: &str, generation: u64) -> SaveState {
        let mut pending = lock(&self.pending);

        match pending.get(id) {
            Some(entry) if entry.generation == generation => {
                pending.remove(id);
                SaveState::Idle
            }
            Some(_) => SaveState::Pending,
            None => SaveState::Idle,
        }
    }

    /// Drop any pending save for `id`. Returns whether one existed.
    pub fn cancel(&self, id: &str) -> bool {
        match lock(&self.pending).remove(id) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                tracing::debug!("Cancelled pending save for note {}", id);
                true
            }
            None => false,
        }
    }

    pub fn state(&self, id: &str) -> SaveState {
        if lock(&self.pending).contains_key(id) {
            SaveState::Pending
        } else {
            SaveState::Idle
        }
    }

    pub fn pending_ids(&self) -> Vec<String> {
        lock(&self.pending).keys().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Remember that `id` was deleted but its stored row is still there
    pub fn defer_removal(&self, id: &str) {
        if lock(&self.removals).insert(id.to_string()) {
            tracing::debug!("Deferred removal of note {}", id);
        }
    }

    pub fn removal_pending(&self, id: &str) -> bool {
        lock(&self.removals).contains(id)
    }

    /// Forget a deferred removal once the backend has dropped the row
    pub fn removal_done(&self, id: &str) {
        lock(&self.removals).remove(id);
    }

    pub fn pending_removals(&self) -> Vec<String> {
        lock(&self.removals).iter().cloned().collect()
    }
}

impl Drop for SaveCoordinator {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.pending).drain() {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }
}
