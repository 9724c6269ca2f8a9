use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::commands::baby::{CreateBabyCommand, DeleteBabyResult, UpdateBabyCommand};
use crate::domain::events::{EventBus, StoreEvent};
use crate::domain::models::baby::{Baby, BabyAge};
use crate::storage::csv::{ActivityRepository, BabyRepository, CsvConnection, GlobalStateRepository};
use crate::storage::traits::{ActivityStorage, BabyStorage, GlobalStateStorage};

/// Service for managing baby profiles and the active baby selection
#[derive(Clone)]
pub struct BabyService {
    baby_repository: BabyRepository,
    activity_repository: ActivityRepository,
    global_state_repository: GlobalStateRepository,
    events: EventBus,
}

impl BabyService {
    pub fn new(csv_conn: Arc<CsvConnection>, events: EventBus) -> Self {
        Self {
            baby_repository: BabyRepository::new((*csv_conn).clone()),
            activity_repository: ActivityRepository::new((*csv_conn).clone()),
            global_state_repository: GlobalStateRepository::new((*csv_conn).clone()),
            events,
        }
    }

    pub fn create_baby(&self, command: CreateBabyCommand) -> Result<Baby> {
        info!("Creating baby: name={}, birth_date={}", command.name, command.birth_date);

        let now = Utc::now();
        let mut baby = Baby::new(&command.name, command.birth_date, command.gender, now)?;
        baby.profile_image_path = command.profile_image_path;
        baby.weight = command.weight;
        baby.height = command.height;
        baby.validate(now.date_naive())?;

        self.baby_repository.store_baby(&baby)?;
        info!("Created baby: {} with ID: {}", baby.name, baby.id);

        self.events.publish(StoreEvent::BabyChanged { baby_id: baby.id });
        Ok(baby)
    }

    pub fn get_baby(&self, baby_id: Uuid) -> Result<Option<Baby>> {
        debug!("Getting baby: {}", baby_id);
        let baby = self.baby_repository.get_baby(baby_id)?;
        if baby.is_none() {
            warn!("Baby not found: {}", baby_id);
        }
        Ok(baby)
    }

    /// All babies, newest first
    pub fn list_babies(&self) -> Result<Vec<Baby>> {
        let babies = self.baby_repository.list_babies()?;
        debug!("Found {} babies", babies.len());
        Ok(babies)
    }

    pub fn update_baby(&self, baby_id: Uuid, command: UpdateBabyCommand) -> Result<Baby> {
        info!("Updating baby: {}", baby_id);

        let mut baby = self
            .baby_repository
            .get_baby(baby_id)?
            .ok_or_else(|| anyhow::anyhow!("Baby not found: {}", baby_id))?;

        if let Some(name) = command.name {
            baby.name = name.trim().to_string();
        }
        if let Some(birth_date) = command.birth_date {
            baby.birth_date = birth_date;
        }
        if let Some(gender) = command.gender {
            baby.gender = gender;
        }
        if let Some(path) = command.profile_image_path {
            baby.profile_image_path = Some(path);
        }
        if let Some(weight) = command.weight {
            baby.weight = Some(weight);
        }
        if let Some(height) = command.height {
            baby.height = Some(height);
        }

        let now = Utc::now();
        baby.validate(now.date_naive())?;
        baby.updated_at = now;

        self.baby_repository.update_baby(&baby)?;
        info!("Updated baby: {} with ID: {}", baby.name, baby.id);

        self.events.publish(StoreEvent::BabyChanged { baby_id: baby.id });
        Ok(baby)
    }

    /// Delete a baby together with its activity log
    pub fn delete_baby(&self, baby_id: Uuid) -> Result<DeleteBabyResult> {
        info!("Deleting baby: {}", baby_id);

        let baby = self
            .baby_repository
            .get_baby(baby_id)?
            .ok_or_else(|| anyhow::anyhow!("Baby not found: {}", baby_id))?;
        let deleted_activities = self.activity_repository.list_activities(baby_id)?.len();

        self.baby_repository.delete_baby(baby_id)?;

        if self.global_state_repository.get_active_baby()? == Some(baby_id) {
            self.global_state_repository.set_active_baby(None)?;
            self.events.publish(StoreEvent::ActiveBabyChanged { baby_id: None });
        }

        info!("Deleted baby {} and {} activities", baby.name, deleted_activities);
        self.events.publish(StoreEvent::BabyDeleted { baby_id });

        Ok(DeleteBabyResult {
            deleted_activities,
            success_message: format!("Baby '{}' deleted successfully", baby.name),
        })
    }

    /// Case-insensitive name search; an empty query returns every baby
    pub fn search_babies(&self, query: &str) -> Result<Vec<Baby>> {
        let babies = self.list_babies()?;
        if query.is_empty() {
            return Ok(babies);
        }
        let query = query.to_lowercase();
        Ok(babies
            .into_iter()
            .filter(|b| b.name.to_lowercase().contains(&query))
            .collect())
    }

    pub fn set_active_baby(&self, baby_id: Uuid) -> Result<Baby> {
        info!("Setting active baby: {}", baby_id);
        let baby = self
            .baby_repository
            .get_baby(baby_id)?
            .ok_or_else(|| anyhow::anyhow!("Baby not found: {}", baby_id))?;

        self.global_state_repository.set_active_baby(Some(baby_id))?;
        self.events.publish(StoreEvent::ActiveBabyChanged { baby_id: Some(baby_id) });
        Ok(baby)
    }

    /// The selected baby, or the newest baby when nothing valid is selected
    pub fn get_active_baby(&self) -> Result<Option<Baby>> {
        if let Some(baby_id) = self.global_state_repository.get_active_baby()? {
            match self.baby_repository.get_baby(baby_id)? {
                Some(baby) => return Ok(Some(baby)),
                None => warn!("Active baby {} no longer exists", baby_id),
            }
        }
        Ok(self.list_babies()?.into_iter().next())
    }

    pub fn get_age_info(&self, baby_id: Uuid, today: NaiveDate) -> Result<BabyAge> {
        let baby = self
            .baby_repository
            .get_baby(baby_id)?
            .ok_or_else(|| anyhow::anyhow!("Baby not found: {}", baby_id))?;
        Ok(baby.age(today))
    }

    /// JSON export of a single profile
    pub fn export_baby(&self, baby_id: Uuid) -> Result<String> {
        let baby = self
            .baby_repository
            .get_baby(baby_id)?
            .ok_or_else(|| anyhow::anyhow!("Baby not found: {}", baby_id))?;
        serde_json::to_string_pretty(&baby).context("Failed to export baby")
    }
}
