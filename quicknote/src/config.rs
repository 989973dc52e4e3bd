//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Auto-save Limits =====

/// Default quiet period before a burst of edits is written, in milliseconds.
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 250;

/// Minimum auto-save delay in milliseconds.
/// Zero would turn every keystroke into a write.
pub const MIN_AUTO_SAVE_DELAY_MS: u32 = 10;

/// Maximum auto-save delay in milliseconds (5 minutes).
/// Values above this risk data loss on unexpected shutdown.
pub const MAX_AUTO_SAVE_DELAY_MS: u32 = 300_000;

// ===== Store =====

/// Buffered store events per subscriber before slow receivers start lagging
pub const STORE_EVENT_CAPACITY: usize = 256;

/// Title shown for notes with neither a title nor any body text
pub const UNTITLED: &str = "Untitled";

/// Upper bound on how long shutdown waits for pending writes, in seconds
pub const SHUTDOWN_FLUSH_TIMEOUT_SECS: u64 = 5;

// ===== Database =====

/// Connections in the application pool
pub const DB_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits on a locked database before failing, in seconds
pub const DB_BUSY_TIMEOUT_SECS: u64 = 5;

// ===== Files =====

/// SQLite database file inside the app data directory
pub const DATABASE_FILE_NAME: &str = "quicknote.db";

/// Preferences file inside the app data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";
