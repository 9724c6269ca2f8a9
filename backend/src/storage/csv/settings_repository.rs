use anyhow::Result;
use shared::AppSettings;
use std::path::PathBuf;
use tracing::debug;

use super::connection::CsvConnection;
use crate::storage::traits::SettingsStorage;

/// Settings blob stored as `settings.yaml`
#[derive(Clone)]
pub struct SettingsRepository {
    connection: CsvConnection,
}

impl SettingsRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_settings_path(&self) -> PathBuf {
        self.connection.base_directory().join("settings.yaml")
    }
}

impl SettingsStorage for SettingsRepository {
    fn load_settings(&self) -> Result<Option<AppSettings>> {
        let settings = self.connection.read_yaml(&self.get_settings_path())?;
        debug!("Loaded settings: present={}", settings.is_some());
        Ok(settings)
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        self.connection.write_yaml(&self.get_settings_path(), settings)
    }
}
