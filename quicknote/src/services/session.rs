//! Editing sessions
//!
//! A session is the link between one open editor surface and the note it
//! is editing. Surfaces keep transient text buffers of their own and push
//! them through the session, which routes every change through the store.

use crate::database::{Note, NoteEdit};
use crate::error::{AppError, Result};
use crate::services::autosave::SaveState;
use crate::services::notes::NoteStore;
use crate::services::settings::SettingsService;

/// One open editor surface and the note bound to it
pub struct EditingSession {
    store: NoteStore,
    note_id: Option<String>,
}

impl EditingSession {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            note_id: None,
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    /// Current state of the bound note, if it still exists
    pub fn note(&self) -> Option<Note> {
        self.note_id.as_deref().and_then(|id| self.store.get(id))
    }

    /// Bind to another note (or none), flushing the current one first
    pub async fn bind(&mut self, note_id: Option<String>) -> Result<()> {
        if self.note_id == note_id {
            return Ok(());
        }

        self.flush().await?;
        self.note_id = note_id;
        Ok(())
    }

    /// Create a note and switch the session to it
    pub async fn start_new_note(&mut self) -> Result<Note> {
        self.flush().await?;

        let note = self.store.create().await?;
        self.note_id = Some(note.id.clone());
        Ok(note)
    }

    /// Apply an edit to the bound note. The write is debounced.
    pub fn edit<F>(&self, mutate: F) -> Result<Note>
    where
        F: FnOnce(&mut NoteEdit<'_>),
    {
        let id = self
            .note_id
            .as_deref()
            .ok_or_else(|| AppError::Generic("No note is open in this editor".to_string()))?;

        self.store.update(id, mutate)
    }

    pub fn set_title(&self, title: &str) -> Result<Note> {
        self.edit(|note| {
            note.set_title(title);
        })
    }

    pub fn set_body(&self, body: &str) -> Result<Note> {
        self.edit(|note| {
            note.set_body(body);
        })
    }

    /// Whether the bound note has edits that have not reached storage
    pub fn has_pending_save(&self) -> bool {
        self.note_id
            .as_deref()
            .is_some_and(|id| self.store.save_state(id) == SaveState::Pending)
    }

    /// Write pending edits now. Nothing to do when unbound or already saved.
    pub async fn flush(&self) -> Result<()> {
        match self.note_id.as_deref() {
            Some(id) => self.store.flush(id).await,
            None => Ok(()),
        }
    }

    /// Flush and tear down the session
    pub async fn close(self) -> Result<()> {
        self.flush().await
    }
}

/// Editing session behind the quick capture panel.
///
/// Remembers its note across show/hide cycles and, through the settings
/// file, across restarts. If the remembered note has been deleted the next
/// `show` starts a fresh one.
pub struct QuickCaptureSession {
    session: EditingSession,
    settings: SettingsService,
}

impl QuickCaptureSession {
    /// Restore the binding saved in settings, dropping it if the note is gone
    pub async fn restore(store: NoteStore, settings: SettingsService) -> Result<Self> {
        let saved = settings.get_quick_capture_note().await?;

        let note_id = match saved {
            Some(id) if store.contains(&id) => Some(id),
            Some(id) => {
                tracing::info!("Quick capture note {} no longer exists", id);
                None
            }
            None => None,
        };

        Ok(Self {
            session: EditingSession {
                store,
                note_id,
            },
            settings,
        })
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    /// Panel is about to appear: return the note to edit, creating one if needed
    pub async fn show(&mut self) -> Result<Note> {
        if let Some(note) = self.session.note() {
            return Ok(note);
        }

        self.start_new_note().await
    }

    /// Explicit "new note" from the panel
    pub async fn start_new_note(&mut self) -> Result<Note> {
        let note = self.session.start_new_note().await?;
        self.remember(&note.id).await;
        tracing::info!("Quick capture bound to new note {}", note.id);
        Ok(note)
    }

    pub fn edit<F>(&self, mutate: F) -> Result<Note>
    where
        F: FnOnce(&mut NoteEdit<'_>),
    {
        self.session.edit(mutate)
    }

    /// Panel was hidden: write whatever is pending
    pub async fn hide(&self) -> Result<()> {
        self.session.flush().await
    }

    async fn remember(&self, note_id: &str) {
        // The note itself is already durable; a lost binding only means a fresh note next launch
        if let Err(e) = self
            .settings
            .set_quick_capture_note(Some(note_id.to_string()))
            .await
        {
            tracing::warn!("Failed to remember quick capture note: {}", e);
        }
    }
}
