//! Filtering, search and ordering of note lists
//!
//! Everything here is a pure function of its inputs. Views recompute their
//! lists from `NoteStore::fetch_all` whenever the selection, the search
//! text, or the collection changes.

use std::cmp::Ordering;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::database::Note;

/// Named sidebar views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteFilter {
    /// Every note that is not archived
    #[default]
    All,
    /// Not archived and updated on the current calendar day
    Today,
    /// Pinned and not archived
    Pinned,
    /// Archived only
    Archived,
}

impl NoteFilter {
    pub const ALL: [NoteFilter; 4] = [
        NoteFilter::All,
        NoteFilter::Today,
        NoteFilter::Pinned,
        NoteFilter::Archived,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NoteFilter::All => "All Notes",
            NoteFilter::Today => "Today",
            NoteFilter::Pinned => "Pinned",
            NoteFilter::Archived => "Archived",
        }
    }

    /// Whether `note` belongs in this view. "Today" is judged in the time
    /// zone of `now`.
    pub fn matches_at<Tz: TimeZone>(self, note: &Note, now: &DateTime<Tz>) -> bool {
        match self {
            NoteFilter::All => !note.archived,
            NoteFilter::Today => !note.archived && is_same_day(&note.updated_at, now),
            NoteFilter::Pinned => note.pinned && !note.archived,
            NoteFilter::Archived => note.archived,
        }
    }
}

fn is_same_day<A: TimeZone, B: TimeZone>(at: &DateTime<A>, now: &DateTime<B>) -> bool {
    at.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

/// List ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSort {
    /// Most recently updated first
    #[default]
    UpdatedNewest,
    UpdatedOldest,
    CreatedNewest,
    /// Alphabetical by display title, ignoring case
    Title,
}

impl NoteSort {
    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        match self {
            NoteSort::UpdatedNewest => b.updated_at.cmp(&a.updated_at),
            NoteSort::UpdatedOldest => a.updated_at.cmp(&b.updated_at),
            NoteSort::CreatedNewest => b.created_at.cmp(&a.created_at),
            NoteSort::Title => a
                .display_title()
                .to_lowercase()
                .cmp(&b.display_title().to_lowercase()),
        }
    }
}

/// Selection state of a list view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteQuery {
    #[serde(default)]
    pub filter: NoteFilter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: NoteSort,
}

impl NoteQuery {
    pub fn new(filter: NoteFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort(mut self, sort: NoteSort) -> Self {
        self.sort = sort;
        self
    }

    /// Lowercased search text, or `None` when blank
    fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        if term.is_empty() {
            None
        } else {
            Some(term.to_lowercase())
        }
    }
}

fn matches_search(note: &Note, term: &str) -> bool {
    note.title.to_lowercase().contains(term) || note.body.to_lowercase().contains(term)
}

/// Filter, search and sort `notes` as of the local current time
pub fn apply(notes: &[Note], query: &NoteQuery) -> Vec<Note> {
    apply_at(notes, query, &Local::now())
}

/// Filter, search and sort `notes` as of `now`.
///
/// The sort is stable, so notes that compare equal keep their input order.
pub fn apply_at<Tz: TimeZone>(notes: &[Note], query: &NoteQuery, now: &DateTime<Tz>) -> Vec<Note> {
    let term = query.search_term();

    let mut result: Vec<Note> = notes
        .iter()
        .filter(|note| query.filter.matches_at(note, now))
        .filter(|note| term.as_deref().map_or(true, |t| matches_search(note, t)))
        .cloned()
        .collect();

    result.sort_by(|a, b| query.sort.compare(a, b));
    result
}

/// Number of notes in each named view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub today: usize,
    pub pinned: usize,
    pub archived: usize,
}

impl FilterCounts {
    pub fn tally(notes: &[Note]) -> Self {
        Self::tally_at(notes, &Local::now())
    }

    pub fn tally_at<Tz: TimeZone>(notes: &[Note], now: &DateTime<Tz>) -> Self {
        let mut counts = Self::default();

        for note in notes {
            for filter in NoteFilter::ALL {
                if filter.matches_at(note, now) {
                    *counts.slot(filter) += 1;
                }
            }
        }

        counts
    }

    pub fn get(&self, filter: NoteFilter) -> usize {
        match filter {
            NoteFilter::All => self.all,
            NoteFilter::Today => self.today,
            NoteFilter::Pinned => self.pinned,
            NoteFilter::Archived => self.archived,
        }
    }

    fn slot(&mut self, filter: NoteFilter) -> &mut usize {
        match filter {
            NoteFilter::All => &mut self.all,
            NoteFilter::Today => &mut self.today,
            NoteFilter::Pinned => &mut self.pinned,
            NoteFilter::Archived => &mut self.archived,
        }
    }
}
