use crate::{
    error::Result,
    models::{DisplaySettings, DisplayState, DisplayUpdate, ImageRecord},
    storage::StorageManager,
};
use tokio::sync::Mutex;

pub const DISPLAY_KEY: &str = "display-image";

/// The single "currently displayed" record and its visibility flags.
pub struct DisplaySelector {
    storage: StorageManager,
    write_lock: Mutex<()>,
}

impl DisplaySelector {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Current state; the document is created with defaults on first read.
    pub async fn read(&self) -> Result<DisplayState> {
        if let Some(state) = self.storage.load::<DisplayState>(DISPLAY_KEY).await? {
            return Ok(state);
        }
        let _guard = self.write_lock.lock().await;
        self.load_or_init().await
    }

    /// Replaces the state wholesale; fields left out take their defaults.
    pub async fn write(&self, update: DisplayUpdate) -> Result<DisplayState> {
        let defaults = DisplayState::default();
        let state = DisplayState {
            url: update.url.unwrap_or(defaults.url),
            created_by: update.created_by.unwrap_or(defaults.created_by),
            show_created_by: update.show_created_by.unwrap_or(defaults.show_created_by),
            show_details: update.show_details.unwrap_or(defaults.show_details),
            auto_display: update.auto_display.unwrap_or(defaults.auto_display),
        };

        let _guard = self.write_lock.lock().await;
        self.storage.save(DISPLAY_KEY, &state).await?;
        log::info!("Display image set to {:?}", state.url);
        Ok(state)
    }

    pub async fn toggle_creator_visibility(&self, show: bool) -> Result<DisplayState> {
        self.modify(|state| state.show_created_by = show).await
    }

    pub async fn toggle_auto_display(&self, enabled: bool) -> Result<DisplayState> {
        let state = self.modify(|state| state.auto_display = enabled).await?;
        log::info!(
            "Auto-display {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(state)
    }

    pub async fn update_settings(&self, settings: DisplaySettings) -> Result<DisplayState> {
        self.modify(|state| {
            if let Some(show) = settings.show_created_by {
                state.show_created_by = show;
            }
            if let Some(show) = settings.show_details {
                state.show_details = show;
            }
            if let Some(enabled) = settings.auto_display {
                state.auto_display = enabled;
            }
        })
        .await
    }

    /// Shows `record` if auto-display is on, keeping the existing flags.
    /// Returns whether the display changed.
    pub async fn promote_if_auto(&self, record: &ImageRecord) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_init().await?;
        if !state.auto_display {
            log::debug!("Auto-display is off, leaving display untouched");
            return Ok(false);
        }

        state.url = record.display_url().to_string();
        state.created_by = record.created_by.clone();
        self.storage.save(DISPLAY_KEY, &state).await?;
        log::info!("Auto-displaying {}", state.url);
        Ok(true)
    }

    /// Clears the display when it shows `record`. Flags other than
    /// `showCreatedBy` survive the reset.
    pub async fn clear_if_showing(&self, record: &ImageRecord) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_init().await?;
        if state.url.is_empty() || !record.matches(&state.url) {
            return Ok(false);
        }

        self.clear(state).await
    }

    /// Clears the display when its url is not among `records`.
    pub async fn clear_unless_listed(&self, records: &[ImageRecord]) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let state = self.load_or_init().await?;
        if state.url.is_empty() || records.iter().any(|record| record.matches(&state.url)) {
            return Ok(false);
        }
        self.clear(state).await
    }

    /// Keeps the displayed creator name in step with an edited record.
    pub async fn rename_if_showing(&self, record: &ImageRecord) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_init().await?;
        if state.url.is_empty() || !record.matches(&state.url) {
            return Ok(false);
        }

        state.created_by = record.created_by.clone();
        self.storage.save(DISPLAY_KEY, &state).await?;
        Ok(true)
    }

    /// Callers must hold `write_lock`.
    async fn clear(&self, mut state: DisplayState) -> Result<bool> {
        log::info!("Cleared display image {}", state.url);
        state.url.clear();
        state.created_by.clear();
        state.show_created_by = true;
        self.storage.save(DISPLAY_KEY, &state).await?;
        Ok(true)
    }

    async fn modify<F>(&self, apply: F) -> Result<DisplayState>
    where
        F: FnOnce(&mut DisplayState),
    {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_or_init().await?;
        apply(&mut state);
        self.storage.save(DISPLAY_KEY, &state).await?;
        Ok(state)
    }

    /// Callers must hold `write_lock`.
    async fn load_or_init(&self) -> Result<DisplayState> {
        match self.storage.load::<DisplayState>(DISPLAY_KEY).await? {
            Some(state) => Ok(state),
            None => {
                let state = DisplayState::default();
                self.storage.save(DISPLAY_KEY, &state).await?;
                Ok(state)
            }
        }
    }
}
