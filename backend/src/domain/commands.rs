//! Domain-level command and query types.
//! These are used by the services and are not exposed over the API; the REST
//! layer maps the `shared` DTOs onto them.

pub mod baby {
    use chrono::NaiveDate;
    use shared::Gender;

    #[derive(Debug, Clone)]
    pub struct CreateBabyCommand {
        pub name: String,
        pub birth_date: NaiveDate,
        pub gender: Gender,
        pub profile_image_path: Option<String>,
        pub weight: Option<f64>,
        pub height: Option<f64>,
    }

    /// Fields left as `None` keep their stored value
    #[derive(Debug, Clone, Default)]
    pub struct UpdateBabyCommand {
        pub name: Option<String>,
        pub birth_date: Option<NaiveDate>,
        pub gender: Option<Gender>,
        pub profile_image_path: Option<String>,
        pub weight: Option<f64>,
        pub height: Option<f64>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteBabyResult {
        pub deleted_activities: usize,
        pub success_message: String,
    }
}

pub mod activity {
    use chrono::{DateTime, Utc};
    use shared::{ActivityDetails, ActivityType};
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    pub struct CreateActivityCommand {
        pub baby_id: Uuid,
        pub activity_type: ActivityType,
        /// Defaults to the current time
        pub start_time: Option<DateTime<Utc>>,
        pub end_time: Option<DateTime<Utc>>,
        pub duration: Option<f64>,
        pub details: ActivityDetails,
        pub notes: Option<String>,
        pub created_by: Option<Uuid>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateActivityCommand {
        pub start_time: Option<DateTime<Utc>>,
        pub end_time: Option<DateTime<Utc>>,
        pub duration: Option<f64>,
        pub details: Option<ActivityDetails>,
        pub notes: Option<String>,
    }

    /// Filters for listing a baby's activities
    #[derive(Debug, Clone, Default)]
    pub struct ActivityQuery {
        pub activity_type: Option<ActivityType>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub limit: Option<usize>,
    }
}

pub mod media {
    use uuid::Uuid;

    #[derive(Debug, Clone, Default)]
    pub struct UpdateMediaCommand {
        pub description: Option<String>,
        pub tags: Option<Vec<String>>,
        pub is_favorite: Option<bool>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct MediaQuery {
        pub query: String,
        pub media_type: Option<shared::MediaType>,
        pub baby_id: Option<Uuid>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MediaStatistics {
        pub photo_count: usize,
        pub video_count: usize,
        pub total_size: u64,
    }
}
