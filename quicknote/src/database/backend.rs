//! Durable collection contract
//!
//! The note store only ever talks to persistence through this trait.
//! `Repository` implements it over SQLite.

use async_trait::async_trait;

use super::models::Note;
use crate::error::Result;

/// Durable home of the note collection.
///
/// Writes for the same id may arrive in quick succession; the last one wins.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// Every stored note, in no particular order
    async fn load_all(&self) -> Result<Vec<Note>>;

    /// Store a note that does not exist yet
    async fn insert(&self, note: &Note) -> Result<()>;

    /// Overwrite the stored copy of an existing note
    async fn replace(&self, note: &Note) -> Result<()>;

    /// Drop a note. Removing an absent id is not an error.
    async fn remove(&self, id: &str) -> Result<()>;
}
