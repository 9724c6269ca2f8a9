//! backend/src/domain/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{ActivityDetails, ActivityType, StatisticsPeriod, TrendDirection};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// A single logged care activity.
///
/// `details` always carries the payload matching `activity_type`; records are
/// built through [`ActivityRecord::new`] or checked with [`ActivityRecord::validate`]
/// before they reach storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub activity_type: ActivityType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: Option<f64>,
    pub details: ActivityDetails,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivityValidationError {
    #[error("Activity type {activity_type} does not match {details_type} details")]
    TypeMismatch {
        activity_type: ActivityType,
        details_type: ActivityType,
    },
    #[error("End time cannot be before start time")]
    EndBeforeStart,
    #[error("Duration cannot be negative")]
    NegativeDuration,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

impl ActivityRecord {
    /// Create a validated record. When an end time is given without a
    /// duration, the duration is derived from the two timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        baby_id: Uuid,
        activity_type: ActivityType,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        duration: Option<f64>,
        details: ActivityDetails,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, ActivityValidationError> {
        let mut record = Self {
            id: Uuid::new_v4(),
            baby_id,
            activity_type,
            start_time,
            end_time,
            duration,
            details,
            notes: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        record.fill_duration();
        record.validate()?;
        Ok(record)
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Derive the duration from start and end when it was not given
    pub fn fill_duration(&mut self) {
        if self.duration.is_none() {
            if let Some(end) = self.end_time {
                let secs = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
                if secs >= 0.0 {
                    self.duration = Some(secs);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        let details_type = self.details.activity_type();
        if details_type != self.activity_type {
            return Err(ActivityValidationError::TypeMismatch {
                activity_type: self.activity_type,
                details_type,
            });
        }

        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(ActivityValidationError::EndBeforeStart);
            }
        }

        if self.duration.is_some_and(|d| d < 0.0) {
            return Err(ActivityValidationError::NegativeDuration);
        }

        match &self.details {
            ActivityDetails::Feeding(feeding) => {
                if feeding.amount.is_some_and(|a| a < 0.0) {
                    return Err(ActivityValidationError::NegativeAmount);
                }
                if feeding.duration_secs.is_some_and(|d| d < 0.0) {
                    return Err(ActivityValidationError::NegativeDuration);
                }
            }
            ActivityDetails::Bath(bath) => {
                if bath.duration_secs.is_some_and(|d| d < 0.0) {
                    return Err(ActivityValidationError::NegativeDuration);
                }
            }
            ActivityDetails::Medicine(medicine) if medicine.name.trim().is_empty() => {
                return Err(ActivityValidationError::EmptyField("Medicine name"));
            }
            ActivityDetails::Milestone(milestone) if milestone.title.trim().is_empty() => {
                return Err(ActivityValidationError::EmptyField("Milestone title"));
            }
            ActivityDetails::Custom(custom) if custom.title.trim().is_empty() => {
                return Err(ActivityValidationError::EmptyField("Custom activity title"));
            }
            _ => {}
        }

        Ok(())
    }

    /// Feeding amount, if this is a feeding with a recorded amount
    pub fn feeding_amount(&self) -> Option<f64> {
        match &self.details {
            ActivityDetails::Feeding(feeding) => feeding.amount,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
    pub description: Option<String>,
}

/// Aggregated view over the activities of one statistics period
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStatistics {
    pub period: StatisticsPeriod,
    pub activity_counts: BTreeMap<ActivityType, usize>,
    pub total_duration: BTreeMap<ActivityType, f64>,
    pub averages: BTreeMap<String, f64>,
    pub trends: BTreeMap<String, Trend>,
    pub generated_at: DateTime<Utc>,
}

const FEEDINGS_PER_DAY_BASELINE: f64 = 8.0;
const SLEEP_SECONDS_BASELINE: f64 = 28_800.0;

impl ActivityStatistics {
    /// Compute counts, duration totals, averages and the feeding/sleep trends
    pub fn compute(
        activities: &[ActivityRecord],
        period: StatisticsPeriod,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut activity_counts: BTreeMap<ActivityType, usize> = BTreeMap::new();
        let mut total_duration: BTreeMap<ActivityType, f64> = BTreeMap::new();

        for activity in activities {
            *activity_counts.entry(activity.activity_type).or_default() += 1;
            if let Some(duration) = activity.duration {
                *total_duration.entry(activity.activity_type).or_default() += duration;
            }
        }

        let mut averages = BTreeMap::new();
        for (activity_type, count) in &activity_counts {
            if let Some(total) = total_duration.get(activity_type) {
                averages.insert(
                    format!("{}_average_duration", activity_type),
                    total / *count as f64,
                );
            }
            averages.insert(
                format!("{}_daily_count", activity_type),
                *count as f64 / period.days() as f64,
            );
        }

        let feeding_count = activity_counts.get(&ActivityType::Feeding).copied().unwrap_or(0);
        let sleep_duration = total_duration.get(&ActivityType::Sleep).copied().unwrap_or(0.0);

        let mut trends = BTreeMap::new();
        trends.insert(
            "feeding_trend".to_string(),
            Trend {
                direction: if feeding_count > 6 { TrendDirection::Up } else { TrendDirection::Stable },
                percentage: feeding_count as f64 / FEEDINGS_PER_DAY_BASELINE * 100.0,
                description: Some("Feeding frequency".to_string()),
            },
        );
        trends.insert(
            "sleep_trend".to_string(),
            Trend {
                direction: if sleep_duration > SLEEP_SECONDS_BASELINE {
                    TrendDirection::Up
                } else {
                    TrendDirection::Down
                },
                percentage: sleep_duration / SLEEP_SECONDS_BASELINE * 100.0,
                description: Some("Sleep time".to_string()),
            },
        );

        Self {
            period,
            activity_counts,
            total_duration,
            averages,
            trends,
            generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::{FeedingDetails, FeedingType, MedicineDetails, SleepDetails};

    fn bottle(amount: f64) -> ActivityDetails {
        ActivityDetails::Feeding(FeedingDetails {
            feeding_type: FeedingType::Bottle,
            amount: Some(amount),
            unit: "ml".to_string(),
            side: None,
            duration_secs: None,
        })
    }

    fn sleep() -> ActivityDetails {
        ActivityDetails::Sleep(SleepDetails { quality: None, location: None })
    }

    #[test]
    fn test_new_rejects_mismatched_details() {
        let now = Utc::now();
        let err = ActivityRecord::new(
            Uuid::new_v4(),
            ActivityType::Sleep,
            now,
            None,
            None,
            bottle(90.0),
            Uuid::nil(),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, ActivityValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_end_before_start_and_negative_amount() {
        let now = Utc::now();
        let err = ActivityRecord::new(
            Uuid::new_v4(),
            ActivityType::Sleep,
            now,
            Some(now - Duration::minutes(5)),
            None,
            sleep(),
            Uuid::nil(),
            now,
        )
        .unwrap_err();
        assert_eq!(err, ActivityValidationError::EndBeforeStart);

        let err = ActivityRecord::new(
            Uuid::new_v4(),
            ActivityType::Feeding,
            now,
            None,
            None,
            bottle(-1.0),
            Uuid::nil(),
            now,
        )
        .unwrap_err();
        assert_eq!(err, ActivityValidationError::NegativeAmount);
    }

    #[test]
    fn test_new_rejects_blank_medicine_name() {
        let now = Utc::now();
        let details = ActivityDetails::Medicine(MedicineDetails {
            name: " ".to_string(),
            dosage: None,
            unit: None,
            reason: None,
        });
        let err = ActivityRecord::new(
            Uuid::new_v4(),
            ActivityType::Medicine,
            now,
            None,
            None,
            details,
            Uuid::nil(),
            now,
        )
        .unwrap_err();
        assert_eq!(err, ActivityValidationError::EmptyField("Medicine name"));
    }

    #[test]
    fn test_duration_derived_from_end_time() {
        let now = Utc::now();
        let record = ActivityRecord::new(
            Uuid::new_v4(),
            ActivityType::Sleep,
            now - Duration::hours(2),
            Some(now),
            None,
            sleep(),
            Uuid::nil(),
            now,
        )
        .unwrap();
        assert_eq!(record.duration, Some(7200.0));
    }

    #[test]
    fn test_statistics_trends() {
        let now = Utc::now();
        let baby = Uuid::new_v4();
        let mut activities = Vec::new();
        for i in 0..7 {
            activities.push(
                ActivityRecord::new(baby, ActivityType::Feeding, now - Duration::hours(i), None, None, bottle(100.0), Uuid::nil(), now)
                    .unwrap(),
            );
        }
        activities.push(
            ActivityRecord::new(baby, ActivityType::Sleep, now - Duration::hours(10), None, Some(36_000.0), sleep(), Uuid::nil(), now)
                .unwrap(),
        );

        let stats = ActivityStatistics::compute(&activities, StatisticsPeriod::Day, now);
        assert_eq!(stats.activity_counts[&ActivityType::Feeding], 7);
        assert_eq!(stats.trends["feeding_trend"].direction, TrendDirection::Up);
        assert_eq!(stats.trends["feeding_trend"].percentage, 87.5);
        assert_eq!(stats.trends["sleep_trend"].direction, TrendDirection::Up);
        assert_eq!(stats.averages["sleep_average_duration"], 36_000.0);
        assert_eq!(stats.averages["feeding_daily_count"], 7.0);
        assert!(!stats.averages.contains_key("feeding_average_duration"));
    }
}
