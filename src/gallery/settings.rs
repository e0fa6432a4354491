use crate::{
    error::{AppError, Result},
    storage::StorageManager,
};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

pub const SETTINGS_KEY: &str = "admin-settings";

/// Free-form admin settings, merged key by key on update.
pub struct SettingsStore {
    storage: StorageManager,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn read(&self) -> Result<Map<String, Value>> {
        let _guard = self.write_lock.lock().await;
        self.load_or_init().await
    }

    pub async fn update(&self, patch: Map<String, Value>) -> Result<Map<String, Value>> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.load_or_init().await?;
        settings.extend(patch);
        self.storage.save(SETTINGS_KEY, &settings).await?;
        Ok(settings)
    }

    async fn load_or_init(&self) -> Result<Map<String, Value>> {
        match self.storage.get_raw(SETTINGS_KEY).await? {
            Some(Value::Object(settings)) => Ok(settings),
            Some(_) => Err(AppError::Storage(format!(
                "{} must be a JSON object",
                SETTINGS_KEY
            ))),
            None => {
                let mut defaults = Map::new();
                defaults.insert("autoDisplayNew".to_string(), json!(false));
                self.storage.save(SETTINGS_KEY, &defaults).await?;
                Ok(defaults)
            }
        }
    }
}
