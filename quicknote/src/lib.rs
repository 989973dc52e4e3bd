//! QuickNote library
//!
//! Note store core for a menu-bar quick capture app: the note model, the
//! SQLite-backed store with debounced autosave, list filtering, and the
//! editing sessions UI surfaces drive.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
