//! In-memory backend that records every write, for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::database::{Note, NoteBackend};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub enum Write {
    Insert(Note),
    Replace(Note),
    Remove(String),
}

#[derive(Default)]
pub struct RecordingBackend {
    rows: Mutex<HashMap<String, Note>>,
    writes: Mutex<Vec<Write>>,
    failing: AtomicBool,
    load_delay: Mutex<Duration>,
}

impl RecordingBackend {
    /// Put a row in storage without recording a write
    pub fn seed(&self, note: Note) {
        self.rows.lock().unwrap().insert(note.id.clone(), note);
    }

    /// Make every call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `load_all` read the rows, then wait this long before returning them
    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = delay;
    }

    pub fn stored(&self, id: &str) -> Option<Note> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn replaces_for(&self, id: &str) -> Vec<Note> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Replace(note) if note.id == id => Some(note),
                _ => None,
            })
            .collect()
    }

    pub fn removals_for(&self, id: &str) -> usize {
        self.writes()
            .iter()
            .filter(|w| matches!(w, Write::Remove(removed) if removed == id))
            .count()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteBackend for RecordingBackend {
    async fn load_all(&self) -> Result<Vec<Note>> {
        self.check()?;
        let rows: Vec<Note> = self.rows.lock().unwrap().values().cloned().collect();

        let delay = *self.load_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(rows)
    }

    async fn insert(&self, note: &Note) -> Result<()> {
        self.check()?;
        self.rows.lock().unwrap().insert(note.id.clone(), note.clone());
        self.writes.lock().unwrap().push(Write::Insert(note.clone()));
        Ok(())
    }

    async fn replace(&self, note: &Note) -> Result<()> {
        self.check()?;
        self.rows.lock().unwrap().insert(note.id.clone(), note.clone());
        self.writes.lock().unwrap().push(Write::Replace(note.clone()));
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.check()?;
        self.rows.lock().unwrap().remove(id);
        self.writes.lock().unwrap().push(Write::Remove(id.to_string()));
        Ok(())
    }
}
