//! backend/src/domain/models/pattern.rs
//!
//! Learned daily rhythms of a baby. Times are minutes since local midnight.

use chrono::{DateTime, Local};
use shared::ActivityType;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BabyPattern {
    pub sleep: Option<SleepPattern>,
    pub feeding: Option<FeedingPattern>,
    pub diaper: Option<DiaperPattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepPattern {
    pub typical_sleep_times: Vec<u32>,
    /// Seconds
    pub average_duration: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedingPattern {
    pub typical_feeding_times: Vec<u32>,
    /// Seconds between consecutive feedings
    pub average_interval: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiaperPattern {
    pub average_interval: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSuggestion {
    pub activity_type: ActivityType,
    pub suggested_time: DateTime<Local>,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedEvent {
    pub activity_type: ActivityType,
    pub predicted_time: DateTime<Local>,
    pub confidence: f64,
}
