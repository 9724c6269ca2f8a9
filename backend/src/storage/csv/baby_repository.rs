use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::Gender;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::CsvConnection;
use crate::domain::models::baby::Baby;
use crate::storage::traits::BabyStorage;

/// YAML form of a baby profile with string dates
#[derive(Debug, Clone, Serialize, Deserialize)]
struct YamlBaby {
    id: String,
    name: String,
    birth_date: String,
    gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile_image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    created_at: String,
    updated_at: String,
}

impl From<&Baby> for YamlBaby {
    fn from(baby: &Baby) -> Self {
        Self {
            id: baby.id.to_string(),
            name: baby.name.clone(),
            birth_date: baby.birth_date.format("%Y-%m-%d").to_string(),
            gender: baby.gender,
            profile_image_path: baby.profile_image_path.clone(),
            weight: baby.weight,
            height: baby.height,
            created_at: baby.created_at.to_rfc3339(),
            updated_at: baby.updated_at.to_rfc3339(),
        }
    }
}

impl TryFrom<YamlBaby> for Baby {
    type Error = anyhow::Error;

    fn try_from(yaml: YamlBaby) -> Result<Self> {
        Ok(Baby {
            id: Uuid::parse_str(&yaml.id)
                .map_err(|e| anyhow::anyhow!("Failed to parse baby id: {}", e))?,
            name: yaml.name,
            birth_date: NaiveDate::parse_from_str(&yaml.birth_date, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("Failed to parse birth_date: {}", e))?,
            gender: yaml.gender,
            profile_image_path: yaml.profile_image_path,
            weight: yaml.weight,
            height: yaml.height,
            created_at: DateTime::parse_from_rfc3339(&yaml.created_at)
                .map_err(|e| anyhow::anyhow!("Failed to parse created_at: {}", e))?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&yaml.updated_at)
                .map_err(|e| anyhow::anyhow!("Failed to parse updated_at: {}", e))?
                .with_timezone(&Utc),
        })
    }
}

/// Baby repository discovering profiles from `babies/{id}/baby.yaml`
#[derive(Clone)]
pub struct BabyRepository {
    connection: CsvConnection,
}

impl BabyRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_baby_yaml_path(&self, baby_id: Uuid) -> PathBuf {
        self.connection.get_baby_directory(&baby_id.to_string()).join("baby.yaml")
    }

    fn load_baby(&self, baby_id: Uuid) -> Result<Option<Baby>> {
        let path = self.get_baby_yaml_path(baby_id);
        match self.connection.read_yaml::<YamlBaby>(&path)? {
            Some(yaml) => Ok(Some(Baby::try_from(yaml)?)),
            None => Ok(None),
        }
    }

    fn save_baby(&self, baby: &Baby) -> Result<()> {
        let path = self.get_baby_yaml_path(baby.id);
        self.connection.write_yaml(&path, &YamlBaby::from(baby))?;
        info!("Saved baby {} ({})", baby.name, baby.id);
        Ok(())
    }

    /// Scan the babies directory for profiles, skipping unreadable ones
    fn discover_babies(&self) -> Result<Vec<Baby>> {
        let babies_dir = self.connection.babies_directory();
        if !babies_dir.exists() {
            debug!("Babies directory doesn't exist, returning empty list");
            return Ok(Vec::new());
        }

        let mut babies = Vec::new();
        for entry in fs::read_dir(&babies_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            let Some(baby_id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| Uuid::parse_str(n).ok())
            else {
                warn!("Skipping directory with invalid name: {:?}", path);
                continue;
            };

            match self.load_baby(baby_id) {
                Ok(Some(baby)) => babies.push(baby),
                Ok(None) => debug!("Directory {:?} doesn't contain a baby profile", path),
                Err(e) => warn!("Error loading baby from {:?}: {}", path, e),
            }
        }

        babies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Discovered {} babies", babies.len());
        Ok(babies)
    }
}

impl BabyStorage for BabyRepository {
    fn store_baby(&self, baby: &Baby) -> Result<()> {
        if self.get_baby_yaml_path(baby.id).exists() {
            return Err(anyhow::anyhow!("Baby already exists: {}", baby.id));
        }
        self.save_baby(baby)
    }

    fn get_baby(&self, baby_id: Uuid) -> Result<Option<Baby>> {
        self.load_baby(baby_id)
    }

    fn list_babies(&self) -> Result<Vec<Baby>> {
        self.discover_babies()
    }

    fn update_baby(&self, baby: &Baby) -> Result<()> {
        if !self.get_baby_yaml_path(baby.id).exists() {
            return Err(anyhow::anyhow!("Baby not found: {}", baby.id));
        }
        self.save_baby(baby)
    }

    fn delete_baby(&self, baby_id: Uuid) -> Result<bool> {
        let baby_dir = self.connection.get_baby_directory(&baby_id.to_string());
        if !baby_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&baby_dir)?;
        info!("Deleted baby directory {:?}", baby_dir);
        Ok(true)
    }
}
