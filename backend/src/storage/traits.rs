//! # Storage Traits
//!
//! Storage abstractions used by the domain services. All operations are
//! synchronous file operations; async callers wrap them as needed.

use anyhow::Result;
use shared::AppSettings;
use uuid::Uuid;

use crate::domain::models::activity::ActivityRecord;
use crate::domain::models::analysis::AnalysisResult;
use crate::domain::models::baby::Baby;
use crate::storage::csv::media_repository::MediaRecord;

/// Baby profile storage
pub trait BabyStorage: Send + Sync {
    /// Store a new baby
    fn store_baby(&self, baby: &Baby) -> Result<()>;

    /// Retrieve a specific baby by ID
    fn get_baby(&self, baby_id: Uuid) -> Result<Option<Baby>>;

    /// List all babies, newest first
    fn list_babies(&self) -> Result<Vec<Baby>>;

    /// Update an existing baby
    fn update_baby(&self, baby: &Baby) -> Result<()>;

    /// Delete a baby and everything stored in its directory.
    /// Returns false if the baby did not exist.
    fn delete_baby(&self, baby_id: Uuid) -> Result<bool>;
}

/// Activity log storage, one file per baby
pub trait ActivityStorage: Send + Sync {
    /// Store a new activity
    fn store_activity(&self, activity: &ActivityRecord) -> Result<()>;

    /// Retrieve an activity by ID without knowing its baby
    fn find_activity(&self, activity_id: Uuid) -> Result<Option<ActivityRecord>>;

    /// List all activities of a baby, most recent start time first
    fn list_activities(&self, baby_id: Uuid) -> Result<Vec<ActivityRecord>>;

    /// Update an existing activity
    fn update_activity(&self, activity: &ActivityRecord) -> Result<()>;

    /// Delete a single activity.
    /// Returns true if the activity was found and deleted.
    fn delete_activity(&self, baby_id: Uuid, activity_id: Uuid) -> Result<bool>;
}

/// Process-wide state that is not part of the settings blob
pub trait GlobalStateStorage: Send + Sync {
    fn get_active_baby(&self) -> Result<Option<Uuid>>;

    fn set_active_baby(&self, baby_id: Option<Uuid>) -> Result<()>;
}

/// Persisted application settings
pub trait SettingsStorage: Send + Sync {
    /// Load the stored settings, `None` when nothing has been saved yet
    fn load_settings(&self) -> Result<Option<AppSettings>>;

    fn save_settings(&self, settings: &AppSettings) -> Result<()>;
}

/// Metadata that cannot be recovered from the media files themselves
pub trait MediaIndexStorage: Send + Sync {
    fn load_media_index(&self) -> Result<Vec<MediaRecord>>;

    fn save_media_index(&self, records: &[MediaRecord]) -> Result<()>;
}

/// Cloud analysis results
pub trait AnalysisStorage: Send + Sync {
    fn store_result(&self, result: &AnalysisResult) -> Result<()>;

    fn list_results(&self) -> Result<Vec<AnalysisResult>>;
}
