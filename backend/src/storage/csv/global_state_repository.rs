//! # Global State Repository
//!
//! `global_state.yaml` at the root of the data directory:
//!
//! ```yaml
//! active_baby_id: "9a1e4c3e-0000-4000-8000-000000000000"
//! data_format_version: "1.0"
//! created_at: "2025-01-21T19:30:00Z"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use super::connection::CsvConnection;
use crate::storage::traits::GlobalStateStorage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// Currently selected baby, if any
    pub active_baby_id: Option<String>,
    pub data_format_version: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for GlobalState {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            active_baby_id: None,
            data_format_version: "1.0".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Clone)]
pub struct GlobalStateRepository {
    connection: CsvConnection,
}

impl GlobalStateRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_global_state_path(&self) -> PathBuf {
        self.connection.base_directory().join("global_state.yaml")
    }

    fn load_global_state(&self) -> Result<GlobalState> {
        Ok(self
            .connection
            .read_yaml(&self.get_global_state_path())?
            .unwrap_or_default())
    }
}

impl GlobalStateStorage for GlobalStateRepository {
    fn get_active_baby(&self) -> Result<Option<Uuid>> {
        let state = self.load_global_state()?;
        Ok(state.active_baby_id.and_then(|id| Uuid::parse_str(&id).ok()))
    }

    fn set_active_baby(&self, baby_id: Option<Uuid>) -> Result<()> {
        let mut state = self.load_global_state()?;
        state.active_baby_id = baby_id.map(|id| id.to_string());
        state.updated_at = Utc::now().to_rfc3339();
        self.connection.write_yaml(&self.get_global_state_path(), &state)?;

        match baby_id {
            Some(id) => info!("Set active baby to {}", id),
            None => info!("Cleared active baby"),
        }
        Ok(())
    }
}
