//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to UI surfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::UNTITLED;

/// A short plain-text note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pinned: bool,
    pub archived: bool,
}

impl Note {
    /// Create an empty note with a fresh id and both timestamps set to now
    pub fn new() -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            body: String::new(),
            created_at: now,
            updated_at: now,
            pinned: false,
            archived: false,
        }
    }

    /// Title for list rows: the title, else the first body line, else "Untitled".
    ///
    /// Empty lines before the first text are skipped.
    pub fn display_title(&self) -> &str {
        if !self.title.trim().is_empty() {
            return &self.title;
        }

        self.body
            .split('\n')
            .find(|line| !line.is_empty())
            .unwrap_or(UNTITLED)
    }

    /// First non-blank line of the body, for the secondary row text
    pub fn preview(&self) -> Option<&str> {
        self.body.lines().map(str::trim).find(|line| !line.is_empty())
    }

    /// Bump `updated_at`. Never moves it before `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn flag(&self, flag: NoteFlag) -> bool {
        match flag {
            NoteFlag::Pinned => self.pinned,
            NoteFlag::Archived => self.archived,
        }
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Boolean flags a user toggles deliberately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteFlag {
    Pinned,
    Archived,
}

/// Mutable view over a note's editable fields.
///
/// Only title, body and the two flags are reachable, so `id` and
/// `created_at` cannot be changed by an editing surface. Setters record
/// whether anything actually changed.
pub struct NoteEdit<'a> {
    note: &'a mut Note,
    changed: bool,
}

impl<'a> NoteEdit<'a> {
    pub(crate) fn new(note: &'a mut Note) -> Self {
        Self {
            note,
            changed: false,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        let title = title.into();
        if self.note.title != title {
            self.note.title = title;
            self.changed = true;
        }
        self
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        let body = body.into();
        if self.note.body != body {
            self.note.body = body;
            self.changed = true;
        }
        self
    }

    pub fn set_pinned(&mut self, pinned: bool) -> &mut Self {
        self.set_flag(NoteFlag::Pinned, pinned)
    }

    pub fn set_archived(&mut self, archived: bool) -> &mut Self {
        self.set_flag(NoteFlag::Archived, archived)
    }

    pub fn set_flag(&mut self, flag: NoteFlag, value: bool) -> &mut Self {
        let slot = match flag {
            NoteFlag::Pinned => &mut self.note.pinned,
            NoteFlag::Archived => &mut self.note.archived,
        };
        if *slot != value {
            *slot = value;
            self.changed = true;
        }
        self
    }

    pub fn changed(&self) -> bool {
        self.changed
    }
}
