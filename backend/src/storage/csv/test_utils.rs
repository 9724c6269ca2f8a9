//! Test utilities providing temporary data directories that are removed when
//! the environment is dropped, even if the test panics.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use shared::{ActivityDetails, ActivityType, FeedingDetails, FeedingType, Gender};
use tempfile::TempDir;
use uuid::Uuid;

use super::activity_repository::ActivityRepository;
use super::baby_repository::BabyRepository;
use super::connection::CsvConnection;
use crate::domain::models::activity::ActivityRecord;
use crate::domain::models::baby::Baby;
use crate::storage::traits::{ActivityStorage, BabyStorage};

/// Temporary data directory plus a connection rooted in it
pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// Repositories over a fresh test environment
pub struct RepositoryTestHelper {
    pub env: TestEnvironment,
    pub baby_repo: BabyRepository,
    pub activity_repo: ActivityRepository,
}

impl RepositoryTestHelper {
    pub fn new() -> Result<Self> {
        let env = TestEnvironment::new()?;
        let baby_repo = BabyRepository::new(env.connection.clone());
        let activity_repo = ActivityRepository::new(env.connection.clone());
        Ok(Self { env, baby_repo, activity_repo })
    }

    /// Store a baby born 60 days ago
    pub fn create_test_baby(&self, name: &str) -> Result<Baby> {
        let now = Utc::now();
        let baby = Baby::new(name, now.date_naive() - Duration::days(60), Gender::Female, now)?;
        self.baby_repo.store_baby(&baby)?;
        Ok(baby)
    }

    /// Store a bottle feeding of `amount` ml starting at `start`
    pub fn create_test_feeding(&self, baby_id: Uuid, start: DateTime<Utc>, amount: f64) -> Result<ActivityRecord> {
        let activity = ActivityRecord::new(
            baby_id,
            ActivityType::Feeding,
            start,
            None,
            None,
            ActivityDetails::Feeding(FeedingDetails {
                feeding_type: FeedingType::Bottle,
                amount: Some(amount),
                unit: "ml".to_string(),
                side: None,
                duration_secs: None,
            }),
            Uuid::nil(),
            Utc::now(),
        )?;
        self.activity_repo.store_activity(&activity)?;
        Ok(activity)
    }
}
