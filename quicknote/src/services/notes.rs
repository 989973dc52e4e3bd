//! Notes service
//!
//! High-level business logic for notes operations.
//! Handles autosave coordination and note lifecycle.
//!
//! `NoteStore` owns the in-memory snapshot of every live note and is the
//! only path to the durable backend. Text edits are applied in memory and
//! written after a quiet period; creation, flag toggles and deletion are
//! written before the call returns. Every committed change is broadcast as a
//! `StoreEvent` so open surfaces can refresh.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::STORE_EVENT_CAPACITY;
use crate::database::{Note, NoteBackend, NoteEdit, NoteFlag};
use crate::error::{AppError, Result};
use crate::services::autosave::{SaveCoordinator, SaveState};

/// Change notification fired after every committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A note was created and written
    Created { id: String },
    /// A note changed in memory
    Changed { id: String },
    /// A note's current state reached the backend
    Saved { id: String },
    /// A note was removed
    Deleted { id: String },
    /// The snapshot was refreshed from the backend
    Reloaded { count: usize },
    /// A write failed; the edit is kept in memory and retried later
    SaveFailed { id: String, message: String },
}

struct StoreInner {
    backend: Arc<dyn NoteBackend>,
    notes: Mutex<HashMap<String, Note>>,
    autosave: SaveCoordinator,
    /// Serializes backend writes so one note's writes land in order
    write_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

/// Single source of truth for the note collection.
///
/// Cheap to clone; every clone shares the same snapshot.
#[derive(Clone)]
pub struct NoteStore {
    inner: Arc<StoreInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NoteStore {
    /// Load every note from `backend` and build the store.
    ///
    /// A backend that cannot be read at startup is unrecoverable.
    pub async fn open(backend: Arc<dyn NoteBackend>, auto_save_delay: Duration) -> Result<Self> {
        let loaded = backend.load_all().await.map_err(|e| {
            tracing::error!("Failed to load notes: {}", e);
            AppError::Unresolvable(format!("Failed to load notes: {}", e))
        })?;

        tracing::info!("Loaded {} notes", loaded.len());

        let notes = loaded.into_iter().map(|n| (n.id.clone(), n)).collect();
        let (events, _) = broadcast::channel(STORE_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(StoreInner {
                backend,
                notes: Mutex::new(notes),
                autosave: SaveCoordinator::new(auto_save_delay),
                write_lock: tokio::sync::Mutex::new(()),
                events,
            }),
        })
    }

    /// Receive a `StoreEvent` for every committed change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// All live notes, most recently updated first
    pub fn fetch_all(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = lock(&self.inner.notes).values().cloned().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        notes
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        lock(&self.inner.notes).get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.inner.notes).contains_key(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.notes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refresh the snapshot from the backend.
    ///
    /// Notes with unsaved edits keep their in-memory state and notes whose
    /// delete has not reached the backend stay gone. If the backend cannot be
    /// read the current snapshot is kept. Returns the note count.
    pub async fn reload(&self) -> usize {
        // No create, flush or delete may land between the read and the swap
        let _write = self.inner.write_lock.lock().await;

        let loaded = match self.inner.backend.load_all().await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Reload failed, keeping current snapshot: {}", e);
                return self.len();
            }
        };

        let count = {
            let mut notes = lock(&self.inner.notes);
            let mut fresh: HashMap<String, Note> = loaded
                .into_iter()
                .filter(|n| !self.inner.autosave.removal_pending(&n.id))
                .map(|n| (n.id.clone(), n))
                .collect();

            // Edits mark the note pending while holding the snapshot lock
            for id in self.inner.autosave.pending_ids() {
                if let Some(local) = notes.remove(&id) {
                    fresh.insert(id, local);
                }
            }

            *notes = fresh;
            notes.len()
        };

        tracing::debug!("Reloaded {} notes", count);
        self.emit(StoreEvent::Reloaded { count });
        count
    }

    /// Create an empty note and write it before returning
    pub async fn create(&self) -> Result<Note> {
        let note = Note::new();

        {
            let _write = self.inner.write_lock.lock().await;

            self.inner.backend.insert(&note).await.map_err(|e| {
                tracing::error!("Failed to create note {}: {}", note.id, e);
                e
            })?;

            lock(&self.inner.notes).insert(note.id.clone(), note.clone());
        }

        tracing::info!("Created note: {}", note.id);
        self.emit(StoreEvent::Created {
            id: note.id.clone(),
        });

        Ok(note)
    }

    /// Apply an edit in memory and arm the auto-save timer.
    ///
    /// Edits that leave every field unchanged do not bump `updated_at` and
    /// do not schedule a write. Must be called from within a Tokio runtime.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<Note>
    where
        F: FnOnce(&mut NoteEdit<'_>),
    {
        let updated = {
            let mut notes = lock(&self.inner.notes);
            let note = notes
                .get_mut(id)
                .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;

            let mut edit = NoteEdit::new(note);
            mutate(&mut edit);
            if !edit.changed() {
                return Ok(note.clone());
            }

            note.touch();
            self.schedule_save(id);
            note.clone()
        };

        self.emit(StoreEvent::Changed { id: id.to_string() });

        Ok(updated)
    }

    /// Set a pinned/archived flag and write it before returning.
    ///
    /// Any pending text edits for the note are written in the same call.
    /// If the write fails the flag stays set in memory and the note is
    /// retried on the next flush.
    pub async fn set_flag(&self, id: &str, flag: NoteFlag, value: bool) -> Result<Note> {
        let (note, changed) = {
            let mut notes = lock(&self.inner.notes);
            let note = notes
                .get_mut(id)
                .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;

            let mut edit = NoteEdit::new(note);
            edit.set_flag(flag, value);
            let changed = edit.changed();
            if changed {
                note.touch();
                self.inner.autosave.mark_dirty(id);
            }
            (note.clone(), changed)
        };

        if changed {
            tracing::debug!("Set {:?}={} on note {}", flag, value, id);
            self.emit(StoreEvent::Changed { id: id.to_string() });
        }

        self.flush(id).await?;

        Ok(note)
    }

    /// Remove a note from memory and from the backend.
    ///
    /// Any pending save for it is dropped. If the backend removal fails the
    /// note stays gone from memory and the removal is retried by the next
    /// flush or delete of that id. Deleting an id that is already gone
    /// succeeds without doing anything, since two surfaces can race to
    /// delete the same note.
    pub async fn delete(&self, id: &str) -> Result<()> {
        // Waits out any write already in flight for this note
        let _write = self.inner.write_lock.lock().await;

        self.inner.autosave.cancel(id);

        if lock(&self.inner.notes).remove(id).is_some() {
            self.emit(StoreEvent::Deleted { id: id.to_string() });
        } else if !self.inner.autosave.removal_pending(id) {
            tracing::debug!("Note {} already deleted", id);
            return Ok(());
        }

        self.remove_stored(id).await
    }

    /// Write a note's pending edits now. A note with nothing pending is left alone.
    pub async fn flush(&self, id: &str) -> Result<()> {
        if self.inner.autosave.removal_pending(id) {
            return self.retry_removal(id).await;
        }

        let Some(generation) = self.inner.autosave.begin_flush(id) else {
            return Ok(());
        };

        self.finish_write(id, generation).await
    }

    /// Flush every note with pending edits or a pending delete. Returns how
    /// many were written.
    pub async fn flush_all(&self) -> Result<usize> {
        let removals = self.inner.autosave.pending_removals();
        let pending = self.inner.autosave.pending_ids();
        if removals.is_empty() && pending.is_empty() {
            return Ok(0);
        }

        tracing::info!(
            "Flushing {} notes with pending edits, {} pending deletes",
            pending.len(),
            removals.len()
        );

        let mut written = 0;
        let mut failed = 0;
        for id in removals {
            match self.retry_removal(&id).await {
                Ok(()) => written += 1,
                Err(_) => failed += 1,
            }
        }
        for id in pending {
            match self.flush(&id).await {
                Ok(()) => written += 1,
                Err(_) => failed += 1,
            }
        }

        if failed > 0 {
            return Err(AppError::Persistence(format!(
                "Failed to flush {} notes",
                failed
            )));
        }

        Ok(written)
    }

    pub fn save_state(&self, id: &str) -> SaveState {
        self.inner.autosave.state(id)
    }

    pub fn pending_saves(&self) -> usize {
        self.inner.autosave.pending_count()
    }

    /// Deleted notes whose stored row could not be removed yet
    pub fn pending_deletes(&self) -> usize {
        self.inner.autosave.pending_removals().len()
    }

    pub fn auto_save_delay(&self) -> Duration {
        self.inner.autosave.delay()
    }

    pub fn set_auto_save_delay(&self, delay: Duration) {
        self.inner.autosave.set_delay(delay);
    }

    fn schedule_save(&self, id: &str) {
        let store = Arc::downgrade(&self.inner);
        let key = id.to_string();

        self.inner.autosave.schedule(id, move |generation| async move {
            save_on_timer(store, key, generation).await;
        });
    }

    async fn retry_removal(&self, id: &str) -> Result<()> {
        let _write = self.inner.write_lock.lock().await;

        if !self.inner.autosave.removal_pending(id) {
            return Ok(());
        }

        self.remove_stored(id).await
    }

    /// Drop the stored row. Caller holds the write lock.
    async fn remove_stored(&self, id: &str) -> Result<()> {
        match self.inner.backend.remove(id).await {
            Ok(()) => {
                self.inner.autosave.removal_done(id);
                tracing::info!("Deleted note: {}", id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete note {} from storage: {}", id, e);
                self.inner.autosave.defer_removal(id);
                self.emit(StoreEvent::SaveFailed {
                    id: id.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Write the note's current state and settle the coordinator
    async fn finish_write(&self, id: &str, generation: u64) -> Result<()> {
        match self.write_through(id).await {
            Ok(saved) => {
                self.inner.autosave.complete(id, generation);
                if saved {
                    self.emit(StoreEvent::Saved { id: id.to_string() });
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save note {}: {}", id, e);
                self.emit(StoreEvent::SaveFailed {
                    id: id.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Snapshot the note under the write lock and replace its stored copy.
    /// Returns false if the note no longer exists.
    async fn write_through(&self, id: &str) -> Result<bool> {
        let _write = self.inner.write_lock.lock().await;

        let Some(note) = self.get(id) else {
            return Ok(false);
        };

        self.inner.backend.replace(&note).await?;
        tracing::debug!("Saved note: {}", id);

        Ok(true)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

async fn save_on_timer(store: Weak<StoreInner>, id: String, generation: u64) {
    let Some(inner) = store.upgrade() else {
        return;
    };

    if !inner.autosave.claim(&id, generation) {
        return;
    }

    let store = NoteStore { inner };
    if store.finish_write(&id, generation).await.is_err() {
        tracing::warn!("Auto-save for note {} will retry on the next edit or flush", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::RecordingBackend;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(30);
    const SETTLE: Duration = Duration::from_millis(150);

    async fn create_test_store() -> (NoteStore, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::default());
        let store = NoteStore::open(backend.clone(), DELAY).await.unwrap();
        (store, backend)
    }

    #[tokio::test]
    async fn test_create_then_fetch_all() {
        let (store, backend) = create_test_store().await;

        let note = store.create().await.unwrap();

        let all = store.fetch_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, note.id);
        assert!(all[0].title.is_empty());
        assert!(all[0].body.is_empty());
        assert!(!all[0].pinned);
        assert!(!all[0].archived);
        assert_eq!(all[0].created_at, all[0].updated_at);

        // Written synchronously, not debounced
        assert_eq!(backend.stored(&note.id), Some(note));
    }

    #[tokio::test]
    async fn test_open_loads_existing_notes() {
        let backend = Arc::new(RecordingBackend::default());
        let existing = Note::new();
        backend.seed(existing.clone());

        let store = NoteStore::open(backend, DELAY).await.unwrap();

        assert_eq!(store.get(&existing.id), Some(existing));
    }

    #[tokio::test]
    async fn test_open_fails_when_backend_unreadable() {
        let backend = Arc::new(RecordingBackend::default());
        backend.set_failing(true);

        let result = NoteStore::open(backend, DELAY).await;

        assert!(matches!(result, Err(AppError::Unresolvable(_))));
    }

    #[tokio::test]
    async fn test_burst_of_edits_writes_once() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        for i in 0..10 {
            store
                .update(&note.id, |edit| {
                    edit.set_body(format!("draft {}", i));
                })
                .unwrap();
        }
        assert_eq!(store.save_state(&note.id), SaveState::Pending);

        sleep(SETTLE).await;

        let writes = backend.replaces_for(&note.id);
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].body, "draft 9");
        assert_eq!(store.save_state(&note.id), SaveState::Idle);
    }

    #[tokio::test]
    async fn test_flush_writes_last_edit_immediately() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store
            .update(&note.id, |edit| {
                edit.set_title("Groceries");
            })
            .unwrap();
        store
            .update(&note.id, |edit| {
                edit.set_body("eggs\nmilk");
            })
            .unwrap();

        store.flush(&note.id).await.unwrap();

        let stored = backend.stored(&note.id).unwrap();
        assert_eq!(stored.title, "Groceries");
        assert_eq!(stored.body, "eggs\nmilk");
        assert_eq!(store.save_state(&note.id), SaveState::Idle);

        // The cancelled timer must not write again
        sleep(SETTLE).await;
        assert_eq!(backend.replaces_for(&note.id).len(), 1);
    }

    #[tokio::test]
    async fn test_flush_without_edits_is_noop() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store.flush(&note.id).await.unwrap();
        store.flush("missing").await.unwrap();

        assert!(backend.replaces_for(&note.id).is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_edit_does_not_touch_or_schedule() {
        let (store, _backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        let same = store
            .update(&note.id, |edit| {
                edit.set_title("");
            })
            .unwrap();

        assert_eq!(same.updated_at, note.updated_at);
        assert_eq!(store.pending_saves(), 0);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let (store, _backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        let updated = store
            .update(&note.id, |edit| {
                edit.set_body("x");
            })
            .unwrap();

        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(updated.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_note() {
        let (store, _backend) = create_test_store().await;

        let result = store.update("missing", |edit| {
            edit.set_title("x");
        });

        assert!(matches!(result, Err(AppError::NoteNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_delete_cancels_pending_save() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store
            .update(&note.id, |edit| {
                edit.set_body("never written");
            })
            .unwrap();
        store.delete(&note.id).await.unwrap();

        sleep(SETTLE).await;

        assert!(backend.replaces_for(&note.id).is_empty());
        assert!(backend.stored(&note.id).is_none());
        assert!(store.fetch_all().iter().all(|n| n.id != note.id));
        assert_eq!(store.pending_saves(), 0);
    }

    #[tokio::test]
    async fn test_double_delete_is_tolerated() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store.delete(&note.id).await.unwrap();
        store.delete(&note.id).await.unwrap();

        assert_eq!(backend.removals_for(&note.id), 1);
    }

    #[tokio::test]
    async fn test_set_flag_is_immediately_visible_and_durable() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store.set_flag(&note.id, NoteFlag::Pinned, true).await.unwrap();

        assert!(store.fetch_all()[0].pinned);
        assert!(backend.stored(&note.id).unwrap().pinned);
        assert_eq!(store.save_state(&note.id), SaveState::Idle);
    }

    #[tokio::test]
    async fn test_set_flag_includes_pending_text() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        store
            .update(&note.id, |edit| {
                edit.set_body("typed just before archiving");
            })
            .unwrap();
        store
            .set_flag(&note.id, NoteFlag::Archived, true)
            .await
            .unwrap();

        let stored = backend.stored(&note.id).unwrap();
        assert!(stored.archived);
        assert_eq!(stored.body, "typed just before archiving");

        sleep(SETTLE).await;
        assert_eq!(backend.replaces_for(&note.id).len(), 1);
    }

    #[tokio::test]
    async fn test_set_flag_missing_note() {
        let (store, _backend) = create_test_store().await;

        let result = store.set_flag("missing", NoteFlag::Archived, true).await;

        assert!(matches!(result, Err(AppError::NoteNotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edit_and_retries() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();
        let mut events = store.subscribe();

        backend.set_failing(true);
        store
            .update(&note.id, |edit| {
                edit.set_body("important");
            })
            .unwrap();
        sleep(SETTLE).await;

        assert_eq!(store.get(&note.id).unwrap().body, "important");
        assert_eq!(store.save_state(&note.id), SaveState::Pending);
        assert!(backend.replaces_for(&note.id).is_empty());

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, StoreEvent::SaveFailed { .. }) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);

        backend.set_failing(false);
        store.flush(&note.id).await.unwrap();

        assert_eq!(backend.stored(&note.id).unwrap().body, "important");
        assert_eq!(store.save_state(&note.id), SaveState::Idle);
    }

    #[tokio::test]
    async fn test_failed_delete_is_retried_on_flush() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        backend.set_failing(true);
        assert!(store.delete(&note.id).await.unwrap_err().is_persistence());
        assert!(!store.contains(&note.id));
        assert_eq!(store.pending_deletes(), 1);

        backend.set_failing(false);
        assert_eq!(store.flush_all().await.unwrap(), 1);

        assert!(backend.stored(&note.id).is_none());
        assert_eq!(store.pending_deletes(), 0);

        let reopened = NoteStore::open(backend, DELAY).await.unwrap();
        assert!(!reopened.contains(&note.id));
    }

    #[tokio::test]
    async fn test_second_delete_retries_failed_removal() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        backend.set_failing(true);
        assert!(store.delete(&note.id).await.is_err());
        backend.set_failing(false);

        store.delete(&note.id).await.unwrap();

        assert!(backend.stored(&note.id).is_none());
        assert_eq!(backend.removals_for(&note.id), 1);
        assert_eq!(store.pending_deletes(), 0);
    }

    #[tokio::test]
    async fn test_reload_does_not_resurrect_undeleted_row() {
        let (store, backend) = create_test_store().await;
        let note = store.create().await.unwrap();

        backend.set_failing(true);
        assert!(store.delete(&note.id).await.is_err());
        backend.set_failing(false);

        store.reload().await;
        assert!(!store.contains(&note.id));

        store.flush(&note.id).await.unwrap();
        assert!(backend.stored(&note.id).is_none());
    }

    #[tokio::test]
    async fn test_create_during_reload_is_kept() {
        let (store, backend) = create_test_store().await;
        backend.set_load_delay(Duration::from_millis(100));

        let reloading = tokio::spawn({
            let store = store.clone();
            async move { store.reload().await }
        });
        sleep(Duration::from_millis(20)).await;

        let note = store.create().await.unwrap();
        reloading.await.unwrap();

        assert!(store.contains(&note.id));
        assert!(backend.stored(&note.id).is_some());
    }

    #[tokio::test]
    async fn test_flush_during_reload_keeps_latest_text() {
        let (store, backend) = create_test_store().await;
        store.set_auto_save_delay(Duration::from_secs(60));
        let note = store.create().await.unwrap();
        store
            .update(&note.id, |edit| {
                edit.set_body("v1");
            })
            .unwrap();

        backend.set_load_delay(Duration::from_millis(100));
        let reloading = tokio::spawn({
            let store = store.clone();
            async move { store.reload().await }
        });
        sleep(Duration::from_millis(20)).await;

        store.flush(&note.id).await.unwrap();
        reloading.await.unwrap();

        assert_eq!(store.get(&note.id).unwrap().body, "v1");
        assert_eq!(backend.stored(&note.id).unwrap().body, "v1");

        let next = store
            .update(&note.id, |edit| {
                edit.set_title("title");
            })
            .unwrap();
        assert_eq!(next.body, "v1");
    }

    #[tokio::test]
    async fn test_edit_during_reload_is_kept() {
        let (store, backend) = create_test_store().await;
        store.set_auto_save_delay(Duration::from_secs(60));
        let note = store.create().await.unwrap();

        backend.set_load_delay(Duration::from_millis(100));
        let reloading = tokio::spawn({
            let store = store.clone();
            async move { store.reload().await }
        });
        sleep(Duration::from_millis(20)).await;

        store
            .update(&note.id, |edit| {
                edit.set_body("typed while reloading");
            })
            .unwrap();
        reloading.await.unwrap();

        assert_eq!(store.get(&note.id).unwrap().body, "typed while reloading");
        assert_eq!(store.save_state(&note.id), SaveState::Pending);
    }

    #[tokio::test]
    async fn test_create_failure_is_reported() {
        let (store, backend) = create_test_store().await;
        backend.set_failing(true);

        let result = store.create().await;

        assert!(result.unwrap_err().is_persistence());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_flush_all_writes_every_pending_note() {
        let (store, backend) = create_test_store().await;
        store.set_auto_save_delay(Duration::from_secs(60));

        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        store
            .update(&a.id, |edit| {
                edit.set_body("a");
            })
            .unwrap();
        store
            .update(&b.id, |edit| {
                edit.set_body("b");
            })
            .unwrap();

        assert_eq!(store.flush_all().await.unwrap(), 2);
        assert_eq!(backend.stored(&a.id).unwrap().body, "a");
        assert_eq!(backend.stored(&b.id).unwrap().body, "b");
        assert_eq!(store.pending_saves(), 0);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let (store, _backend) = create_test_store().await;
        let mut events = store.subscribe();

        let note = store.create().await.unwrap();
        store
            .update(&note.id, |edit| {
                edit.set_title("t");
            })
            .unwrap();
        store.flush(&note.id).await.unwrap();
        store.delete(&note.id).await.unwrap();

        let id = note.id.clone();
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Created { id: id.clone() });
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Changed { id: id.clone() });
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Saved { id: id.clone() });
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Deleted { id });
    }

    #[tokio::test]
    async fn test_reload_keeps_unsaved_edits() {
        let (store, backend) = create_test_store().await;
        store.set_auto_save_delay(Duration::from_secs(60));

        let note = store.create().await.unwrap();
        store
            .update(&note.id, |edit| {
                edit.set_body("unsaved");
            })
            .unwrap();

        let external = Note::new();
        backend.seed(external.clone());

        assert_eq!(store.reload().await, 2);
        assert_eq!(store.get(&note.id).unwrap().body, "unsaved");
        assert!(store.contains(&external.id));
    }

    #[tokio::test]
    async fn test_fetch_all_orders_newest_first() {
        let (store, _backend) = create_test_store().await;

        let older = store.create().await.unwrap();
        let newer = store.create().await.unwrap();
        sleep(Duration::from_millis(5)).await;
        store
            .update(&older.id, |edit| {
                edit.set_body("bumped");
            })
            .unwrap();

        let ids: Vec<_> = store.fetch_all().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }
}
