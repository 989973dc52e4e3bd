//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! Every service is constructed once here and handed to the surfaces that
//! need it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;

use crate::config::{DATABASE_FILE_NAME, SHUTDOWN_FLUSH_TIMEOUT_SECS};
use crate::database::open_repository;
use crate::error::{AppError, Result};
use crate::services::{
    EditingSession, EditorSettings, NoteStore, QuickCaptureSession, SettingsService,
};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub store: NoteStore,
    pub settings: SettingsService,
}

impl AppState {
    /// Platform data directory, e.g. `~/Library/Application Support/...` on macOS
    pub fn default_data_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "QuickNote", "QuickNote")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| AppError::Generic("Failed to determine app data dir".to_string()))
    }

    /// Open the database and settings under `app_data_dir`.
    ///
    /// Fails with `Unresolvable` if the note database cannot be opened.
    pub async fn initialize(app_data_dir: &Path) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", app_data_dir);

        std::fs::create_dir_all(app_data_dir)?;

        let settings = SettingsService::new(app_data_dir.to_path_buf());
        let editor = settings.get_editor().await?;

        let repository = open_repository(&app_data_dir.join(DATABASE_FILE_NAME)).await?;
        let store = NoteStore::open(Arc::new(repository), editor.auto_save_delay()).await?;

        tracing::info!(
            "Application initialized with {} notes, auto-save delay {:?}",
            store.len(),
            store.auto_save_delay()
        );

        Ok(Self {
            app_data_dir: app_data_dir.to_path_buf(),
            store,
            settings,
        })
    }

    /// A fresh editing session for a main-window editor pane
    pub fn editor_session(&self) -> EditingSession {
        EditingSession::new(self.store.clone())
    }

    /// The quick capture panel's session, restored from settings
    pub async fn quick_capture_session(&self) -> Result<QuickCaptureSession> {
        QuickCaptureSession::restore(self.store.clone(), self.settings.clone()).await
    }

    /// Validate, persist and apply a new auto-save delay
    pub async fn set_auto_save_delay(&self, delay_ms: u32) -> Result<()> {
        let editor = EditorSettings {
            auto_save_delay: delay_ms,
        };

        self.settings.update_editor(editor.clone()).await?;
        self.store.set_auto_save_delay(editor.auto_save_delay());
        Ok(())
    }

    /// Write every pending edit before the process exits
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down, flushing pending edits");

        let timeout = Duration::from_secs(SHUTDOWN_FLUSH_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, self.store.flush_all()).await {
            Ok(Ok(written)) => {
                tracing::info!("Shutdown complete, {} notes flushed", written);
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!("Shutdown flush failed: {}", e);
                Err(e)
            }
            Err(_) => {
                tracing::error!("Timed out flushing pending edits");
                Err(AppError::Persistence(
                    "Timed out flushing pending edits".to_string(),
                ))
            }
        }
    }
}
