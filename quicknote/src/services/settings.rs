//! Settings service
//!
//! Manages application settings persistence using JSON file storage.
//! Lives outside the note database, so it also carries the quick capture
//! session's note binding across restarts.

use crate::config::{
    DEFAULT_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS, MIN_AUTO_SAVE_DELAY_MS,
    SETTINGS_FILE_NAME,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Editor behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Auto-save delay in milliseconds
    #[serde(default = "default_auto_save_delay")]
    pub auto_save_delay: u32,
}

fn default_auto_save_delay() -> u32 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            auto_save_delay: default_auto_save_delay(),
        }
    }
}

impl EditorSettings {
    pub fn auto_save_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.auto_save_delay))
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_AUTO_SAVE_DELAY_MS..=MAX_AUTO_SAVE_DELAY_MS).contains(&self.auto_save_delay) {
            return Err(AppError::InvalidSetting(format!(
                "auto_save_delay must be between {} and {} ms, got {}",
                MIN_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS, self.auto_save_delay
            )));
        }
        Ok(())
    }
}

/// Quick capture panel state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCaptureSettings {
    /// Note the panel was last editing
    #[serde(default)]
    pub note_id: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub quick_capture: QuickCaptureSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        if let Err(e) = settings.editor.validate() {
            tracing::warn!("Ignoring stored editor settings: {}", e);
            return Ok(AppSettings {
                editor: EditorSettings::default(),
                ..settings
            });
        }

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::debug!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Get editor settings (auto-save delay)
    pub async fn get_editor(&self) -> Result<EditorSettings> {
        let settings = self.load().await?;
        Ok(settings.editor)
    }

    /// Update editor settings. Rejects out-of-range values without writing.
    pub async fn update_editor(&self, editor: EditorSettings) -> Result<()> {
        editor.validate()?;

        let mut settings = self.load().await?;
        settings.editor = editor;
        self.save(&settings).await?;
        Ok(())
    }

    /// Note the quick capture panel is bound to, if any
    pub async fn get_quick_capture_note(&self) -> Result<Option<String>> {
        let settings = self.load().await?;
        Ok(settings.quick_capture.note_id)
    }

    /// Bind the quick capture panel to a note, or clear the binding
    pub async fn set_quick_capture_note(&self, note_id: Option<String>) -> Result<()> {
        let mut settings = self.load().await?;
        settings.quick_capture.note_id = note_id;
        self.save(&settings).await?;
        Ok(())
    }
}
