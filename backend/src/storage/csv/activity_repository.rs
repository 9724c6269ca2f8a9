//! # Activity Repository
//!
//! One `activities.csv` per baby. The type specific payload is stored as a
//! JSON document in the `details` column.
//!
//! ```csv
//! id,baby_id,activity_type,start_time,end_time,duration,details,notes,created_by,created_at,updated_at
//! 5f0c...,9a1e...,feeding,2024-01-15T07:00:00+00:00,,,"{""type"":""feeding"",...}",,0000...,...
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use super::connection::CsvConnection;
use crate::domain::models::activity::ActivityRecord;
use crate::storage::traits::ActivityStorage;

/// Flat CSV row for an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityCsvRecord {
    id: String,
    baby_id: String,
    activity_type: String,
    start_time: String,
    end_time: String,
    duration: String,
    details: String,
    notes: String,
    created_by: String,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Failed to parse {} '{}': {}", field, value, e))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl TryFrom<ActivityCsvRecord> for ActivityRecord {
    type Error = anyhow::Error;

    fn try_from(row: ActivityCsvRecord) -> Result<Self> {
        let end_time = match non_empty(row.end_time) {
            Some(value) => Some(parse_timestamp(&value, "end_time")?),
            None => None,
        };
        let duration = match non_empty(row.duration) {
            Some(value) => Some(value.parse::<f64>()?),
            None => None,
        };

        let record = ActivityRecord {
            id: Uuid::parse_str(&row.id)?,
            baby_id: Uuid::parse_str(&row.baby_id)?,
            activity_type: row.activity_type.parse().map_err(anyhow::Error::msg)?,
            start_time: parse_timestamp(&row.start_time, "start_time")?,
            end_time,
            duration,
            details: serde_json::from_str(&row.details)?,
            notes: non_empty(row.notes),
            created_by: Uuid::parse_str(&row.created_by)?,
            created_at: parse_timestamp(&row.created_at, "created_at")?,
            updated_at: parse_timestamp(&row.updated_at, "updated_at")?,
        };
        record.validate()?;
        Ok(record)
    }
}

impl TryFrom<&ActivityRecord> for ActivityCsvRecord {
    type Error = anyhow::Error;

    fn try_from(activity: &ActivityRecord) -> Result<Self> {
        Ok(Self {
            id: activity.id.to_string(),
            baby_id: activity.baby_id.to_string(),
            activity_type: activity.activity_type.to_string(),
            start_time: activity.start_time.to_rfc3339(),
            end_time: activity.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            duration: activity.duration.map(|d| d.to_string()).unwrap_or_default(),
            details: serde_json::to_string(&activity.details)?,
            notes: activity.notes.clone().unwrap_or_default(),
            created_by: activity.created_by.to_string(),
            created_at: activity.created_at.to_rfc3339(),
            updated_at: activity.updated_at.to_rfc3339(),
        })
    }
}

/// CSV-based activity repository
#[derive(Clone)]
pub struct ActivityRepository {
    connection: CsvConnection,
}

impl ActivityRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_activities_file_path(&self, baby_id: Uuid) -> PathBuf {
        self.connection
            .get_baby_directory(&baby_id.to_string())
            .join("activities.csv")
    }

    /// Read a baby's activities in file order. Rows that fail to parse are skipped.
    fn read_activities(&self, baby_id: Uuid) -> Result<Vec<ActivityRecord>> {
        let file_path = self.get_activities_file_path(baby_id);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut activities = Vec::new();
        for result in csv_reader.deserialize::<ActivityCsvRecord>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("Failed to read activity row in {:?}: {}. Skipping.", file_path, e);
                    continue;
                }
            };
            match ActivityRecord::try_from(row) {
                Ok(activity) => activities.push(activity),
                Err(e) => warn!("Failed to parse activity record: {}. Skipping.", e),
            }
        }
        Ok(activities)
    }

    fn write_activities(&self, baby_id: Uuid, activities: &[ActivityRecord]) -> Result<()> {
        let file_path = self.get_activities_file_path(baby_id);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_file_path = file_path.with_extension("csv.tmp");

        {
            let temp_file = File::create(&temp_file_path)?;
            let mut csv_writer = Writer::from_writer(BufWriter::new(temp_file));
            for activity in activities {
                csv_writer.serialize(ActivityCsvRecord::try_from(activity)?)?;
            }
            csv_writer.flush()?;
        }

        fs::rename(&temp_file_path, &file_path)?;
        debug!("Wrote {} activities to {:?}", activities.len(), file_path);
        Ok(())
    }

    fn baby_ids_with_activities(&self) -> Result<Vec<Uuid>> {
        let babies_dir = self.connection.babies_directory();
        if !babies_dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(babies_dir)? {
            let path = entry?.path();
            if let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| Uuid::parse_str(n).ok())
            {
                if path.join("activities.csv").exists() {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }
}

impl ActivityStorage for ActivityRepository {
    fn store_activity(&self, activity: &ActivityRecord) -> Result<()> {
        let mut activities = self.read_activities(activity.baby_id)?;
        if activities.iter().any(|a| a.id == activity.id) {
            return Err(anyhow::anyhow!("Activity already exists: {}", activity.id));
        }
        activities.push(activity.clone());
        self.write_activities(activity.baby_id, &activities)
    }

    fn find_activity(&self, activity_id: Uuid) -> Result<Option<ActivityRecord>> {
        for baby_id in self.baby_ids_with_activities()? {
            if let Some(activity) = self
                .read_activities(baby_id)?
                .into_iter()
                .find(|a| a.id == activity_id)
            {
                return Ok(Some(activity));
            }
        }
        Ok(None)
    }

    fn list_activities(&self, baby_id: Uuid) -> Result<Vec<ActivityRecord>> {
        let mut activities = self.read_activities(baby_id)?;
        activities.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(activities)
    }

    fn update_activity(&self, activity: &ActivityRecord) -> Result<()> {
        let mut activities = self.read_activities(activity.baby_id)?;
        let existing = activities
            .iter_mut()
            .find(|a| a.id == activity.id)
            .ok_or_else(|| anyhow::anyhow!("Activity not found: {}", activity.id))?;
        *existing = activity.clone();
        self.write_activities(activity.baby_id, &activities)
    }

    fn delete_activity(&self, baby_id: Uuid, activity_id: Uuid) -> Result<bool> {
        let mut activities = self.read_activities(baby_id)?;
        let before = activities.len();
        activities.retain(|a| a.id != activity_id);
        if activities.len() == before {
            return Ok(false);
        }
        self.write_activities(baby_id, &activities)?;
        Ok(true)
    }
}
