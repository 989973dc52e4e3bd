//! Services module
//!
//! Business logic that sits between editor surfaces and the database.

pub mod autosave;
pub mod notes;
pub mod query;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use autosave::{SaveCoordinator, SaveState};
pub use notes::{NoteStore, StoreEvent};
pub use query::{FilterCounts, NoteFilter, NoteQuery, NoteSort};
pub use session::{EditingSession, QuickCaptureSession};
pub use settings::{AppSettings, EditorSettings, QuickCaptureSettings, SettingsService};
