//! Activity log operations: recording, querying, summaries, statistics and
//! the "time since last" suggestions.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use shared::{ActivityType, StatisticsPeriod};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::commands::activity::{ActivityQuery, CreateActivityCommand, UpdateActivityCommand};
use crate::domain::events::{EventBus, StoreEvent};
use crate::domain::models::activity::{ActivityRecord, ActivityStatistics};
use crate::storage::csv::{ActivityRepository, BabyRepository, CsvConnection};
use crate::storage::traits::{ActivityStorage, BabyStorage};

const FEEDING_SUGGESTION_SECS: f64 = 10_800.0;
const DIAPER_SUGGESTION_SECS: f64 = 7_200.0;
const AWAKE_SUGGESTION_SECS: f64 = 14_400.0;

#[derive(Clone)]
pub struct ActivityService {
    activity_repository: ActivityRepository,
    baby_repository: BabyRepository,
    events: EventBus,
}

impl ActivityService {
    pub fn new(csv_conn: Arc<CsvConnection>, events: EventBus) -> Self {
        Self {
            activity_repository: ActivityRepository::new((*csv_conn).clone()),
            baby_repository: BabyRepository::new((*csv_conn).clone()),
            events,
        }
    }

    pub fn add_activity(&self, command: CreateActivityCommand) -> Result<ActivityRecord> {
        info!(
            "Adding {} activity for baby {}",
            command.activity_type, command.baby_id
        );

        if self.baby_repository.get_baby(command.baby_id)?.is_none() {
            return Err(anyhow!("Baby not found: {}", command.baby_id));
        }

        let now = Utc::now();
        let activity = ActivityRecord::new(
            command.baby_id,
            command.activity_type,
            command.start_time.unwrap_or(now),
            command.end_time,
            command.duration,
            command.details,
            command.created_by.unwrap_or_else(Uuid::nil),
            now,
        )?
        .with_notes(command.notes);

        self.activity_repository.store_activity(&activity)?;
        info!("Stored activity {} ({})", activity.id, activity.activity_type);

        self.events.publish(StoreEvent::ActivityChanged {
            baby_id: activity.baby_id,
            activity_id: activity.id,
        });
        Ok(activity)
    }

    pub fn get_activity(&self, activity_id: Uuid) -> Result<Option<ActivityRecord>> {
        self.activity_repository.find_activity(activity_id)
    }

    pub fn update_activity(&self, activity_id: Uuid, command: UpdateActivityCommand) -> Result<ActivityRecord> {
        info!("Updating activity: {}", activity_id);

        let mut activity = self
            .activity_repository
            .find_activity(activity_id)?
            .ok_or_else(|| anyhow!("Activity not found: {}", activity_id))?;

        if let Some(start_time) = command.start_time {
            activity.start_time = start_time;
        }
        if let Some(end_time) = command.end_time {
            activity.end_time = Some(end_time);
            if command.duration.is_none() {
                activity.duration = None;
            }
        }
        if let Some(duration) = command.duration {
            activity.duration = Some(duration);
        }
        if let Some(details) = command.details {
            activity.details = details;
        }
        if command.notes.is_some() {
            activity = activity.with_notes(command.notes);
        }

        activity.fill_duration();
        activity.validate()?;
        activity.updated_at = Utc::now();

        self.activity_repository.update_activity(&activity)?;
        self.events.publish(StoreEvent::ActivityChanged {
            baby_id: activity.baby_id,
            activity_id: activity.id,
        });
        Ok(activity)
    }

    /// Returns false when no such activity exists
    pub fn delete_activity(&self, activity_id: Uuid) -> Result<bool> {
        info!("Deleting activity: {}", activity_id);

        let Some(activity) = self.activity_repository.find_activity(activity_id)? else {
            warn!("Activity not found for deletion: {}", activity_id);
            return Ok(false);
        };

        let deleted = self
            .activity_repository
            .delete_activity(activity.baby_id, activity_id)?;
        if deleted {
            self.events.publish(StoreEvent::ActivityChanged {
                baby_id: activity.baby_id,
                activity_id,
            });
        }
        Ok(deleted)
    }

    /// All activities of a baby, most recent first
    pub fn load_activities(&self, baby_id: Uuid) -> Result<Vec<ActivityRecord>> {
        let activities = self.activity_repository.list_activities(baby_id)?;
        debug!("Loaded {} activities for baby {}", activities.len(), baby_id);
        Ok(activities)
    }

    /// Activities starting on the local calendar day of `now`
    pub fn load_today_activities<Tz: TimeZone>(&self, baby_id: Uuid, now: DateTime<Tz>) -> Result<Vec<ActivityRecord>> {
        let (from, to) = day_bounds(now.date_naive(), &now.timezone())?;
        self.list_by_date_range(baby_id, from, to)
    }

    pub fn list_activities(&self, baby_id: Uuid, query: &ActivityQuery) -> Result<Vec<ActivityRecord>> {
        let mut activities: Vec<ActivityRecord> = self
            .load_activities(baby_id)?
            .into_iter()
            .filter(|a| query.activity_type.map_or(true, |t| a.activity_type == t))
            .filter(|a| query.from.map_or(true, |from| a.start_time >= from))
            .filter(|a| query.to.map_or(true, |to| a.start_time < to))
            .collect();
        if let Some(limit) = query.limit {
            activities.truncate(limit);
        }
        Ok(activities)
    }

    /// Activities starting in `[from, to)`
    pub fn list_by_date_range(&self, baby_id: Uuid, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ActivityRecord>> {
        self.list_activities(
            baby_id,
            &ActivityQuery { from: Some(from), to: Some(to), ..Default::default() },
        )
    }

    pub fn list_by_type(&self, baby_id: Uuid, activity_type: ActivityType) -> Result<Vec<ActivityRecord>> {
        self.list_activities(
            baby_id,
            &ActivityQuery { activity_type: Some(activity_type), ..Default::default() },
        )
    }

    /// Case-insensitive match against notes and the type's display name
    pub fn search_activities(
        &self,
        baby_id: Uuid,
        query: &str,
        activity_type: Option<ActivityType>,
    ) -> Result<Vec<ActivityRecord>> {
        let needle = query.to_lowercase();
        Ok(self
            .list_activities(baby_id, &ActivityQuery { activity_type, ..Default::default() })?
            .into_iter()
            .filter(|a| {
                needle.is_empty()
                    || a.notes.as_deref().is_some_and(|n| n.to_lowercase().contains(&needle))
                    || a.activity_type.display_name().to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub fn last_activity(&self, baby_id: Uuid, activity_type: ActivityType) -> Result<Option<ActivityRecord>> {
        Ok(self.list_by_type(baby_id, activity_type)?.into_iter().next())
    }

    /// Seconds elapsed since the latest activity of a type started
    pub fn time_since_last(&self, baby_id: Uuid, activity_type: ActivityType, now: DateTime<Utc>) -> Result<Option<f64>> {
        Ok(self
            .last_activity(baby_id, activity_type)?
            .map(|a| (now - a.start_time).num_milliseconds() as f64 / 1000.0))
    }

    /// Count per type of the activities starting on `date` in `tz`
    pub fn daily_summary<Tz: TimeZone>(
        &self,
        baby_id: Uuid,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<BTreeMap<ActivityType, usize>> {
        let (from, to) = day_bounds(date, tz)?;
        let mut summary = BTreeMap::new();
        for activity in self.list_by_date_range(baby_id, from, to)? {
            *summary.entry(activity.activity_type).or_default() += 1;
        }
        Ok(summary)
    }

    /// Statistics over the activities of the last `period.days()` days
    pub fn statistics(&self, baby_id: Uuid, period: StatisticsPeriod, now: DateTime<Utc>) -> Result<ActivityStatistics> {
        info!("Generating {:?} statistics for baby {}", period, baby_id);
        let from = now - Duration::days(i64::from(period.days()));
        let activities = self.list_activities(
            baby_id,
            &ActivityQuery { from: Some(from), to: Some(now), ..Default::default() },
        )?;
        Ok(ActivityStatistics::compute(&activities, period, now))
    }

    pub fn suggestions(&self, baby_id: Uuid, now: DateTime<Utc>) -> Result<Vec<String>> {
        let mut suggestions = Vec::new();

        if self
            .time_since_last(baby_id, ActivityType::Feeding, now)?
            .is_some_and(|secs| secs > FEEDING_SUGGESTION_SECS)
        {
            suggestions.push("It has been more than 3 hours since the last feeding".to_string());
        }
        if self
            .time_since_last(baby_id, ActivityType::Diaper, now)?
            .is_some_and(|secs| secs > DIAPER_SUGGESTION_SECS)
        {
            suggestions.push("It has been more than 2 hours since the last diaper change".to_string());
        }
        if self
            .time_since_last(baby_id, ActivityType::Sleep, now)?
            .is_some_and(|secs| secs > AWAKE_SUGGESTION_SECS)
        {
            suggestions.push("Baby has been awake for more than 4 hours and may need rest".to_string());
        }

        Ok(suggestions)
    }

    /// Pretty JSON of every activity of a baby
    pub fn export_activities(&self, baby_id: Uuid) -> Result<String> {
        let activities = self.load_activities(baby_id)?;
        info!("Exporting {} activities for baby {}", activities.len(), baby_id);
        serde_json::to_string_pretty(&activities).context("Failed to export activities")
    }
}

/// UTC bounds of a local calendar day
fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_of = |d: NaiveDate| {
        d.and_hms_opt(0, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| anyhow!("Cannot resolve start of day for {}", d))
    };
    let next = date
        .succ_opt()
        .ok_or_else(|| anyhow!("Date out of range: {}", date))?;
    Ok((start_of(date)?, start_of(next)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::activity::ActivityValidationError;
    use crate::storage::csv::test_utils::RepositoryTestHelper;
    use chrono::FixedOffset;
    use shared::{ActivityDetails, DiaperDetails, DiaperType, FeedingDetails, FeedingType, SleepDetails};

    fn setup() -> (RepositoryTestHelper, ActivityService) {
        let helper = RepositoryTestHelper::new().unwrap();
        let service = ActivityService::new(Arc::new(helper.env.connection.clone()), EventBus::new());
        (helper, service)
    }

    fn feeding_command(baby_id: Uuid, start: DateTime<Utc>, amount: f64) -> CreateActivityCommand {
        CreateActivityCommand {
            baby_id,
            activity_type: ActivityType::Feeding,
            start_time: Some(start),
            end_time: None,
            duration: None,
            details: ActivityDetails::Feeding(FeedingDetails {
                feeding_type: FeedingType::Bottle,
                amount: Some(amount),
                unit: "ml".to_string(),
                side: None,
                duration_secs: None,
            }),
            notes: None,
            created_by: None,
        }
    }

    fn sleep_command(baby_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateActivityCommand {
        CreateActivityCommand {
            baby_id,
            activity_type: ActivityType::Sleep,
            start_time: Some(start),
            end_time: Some(end),
            duration: None,
            details: ActivityDetails::Sleep(SleepDetails { quality: None, location: None }),
            notes: Some("Nap in the stroller".to_string()),
            created_by: None,
        }
    }

    #[test]
    fn test_add_feeding_shows_up_in_today() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let start = (now - Duration::hours(1)).with_timezone(&Utc);

        service.add_activity(feeding_command(baby.id, start, 120.0)).unwrap();
        service
            .add_activity(feeding_command(baby.id, start - Duration::days(1), 80.0))
            .unwrap();

        let today = service.load_today_activities(baby.id, now).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].activity_type, ActivityType::Feeding);
        assert_eq!(today[0].feeding_amount(), Some(120.0));
    }

    #[test]
    fn test_add_requires_existing_baby() {
        let (_helper, service) = setup();
        let result = service.add_activity(feeding_command(Uuid::new_v4(), Utc::now(), 90.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_recomputes_duration_and_checks_details() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let start = Utc::now() - Duration::hours(3);
        let sleep = service
            .add_activity(sleep_command(baby.id, start, start + Duration::hours(1)))
            .unwrap();
        assert_eq!(sleep.duration, Some(3600.0));

        let updated = service
            .update_activity(
                sleep.id,
                UpdateActivityCommand { end_time: Some(start + Duration::hours(2)), ..Default::default() },
            )
            .unwrap();
        assert_eq!(updated.duration, Some(7200.0));

        let err = service
            .update_activity(
                sleep.id,
                UpdateActivityCommand {
                    details: Some(ActivityDetails::Diaper(DiaperDetails {
                        diaper_type: DiaperType::Wet,
                        condition: None,
                    })),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActivityValidationError>(),
            Some(ActivityValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_delete_activity() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let feeding = service.add_activity(feeding_command(baby.id, Utc::now(), 90.0)).unwrap();

        assert!(service.delete_activity(feeding.id).unwrap());
        assert!(!service.delete_activity(feeding.id).unwrap());
        assert!(service.get_activity(feeding.id).unwrap().is_none());
    }

    #[test]
    fn test_search_matches_notes_and_type_name() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let now = Utc::now();
        service.add_activity(feeding_command(baby.id, now, 90.0)).unwrap();
        service
            .add_activity(sleep_command(baby.id, now - Duration::hours(2), now - Duration::hours(1)))
            .unwrap();

        assert_eq!(service.search_activities(baby.id, "STROLLER", None).unwrap().len(), 1);
        assert_eq!(service.search_activities(baby.id, "feed", None).unwrap().len(), 1);
        assert!(service
            .search_activities(baby.id, "stroller", Some(ActivityType::Feeding))
            .unwrap()
            .is_empty());
        assert_eq!(service.search_activities(baby.id, "", None).unwrap().len(), 2);
    }

    #[test]
    fn test_suggestions_after_long_gaps() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let now = Utc::now();
        assert!(service.suggestions(baby.id, now).unwrap().is_empty());

        service
            .add_activity(feeding_command(baby.id, now - Duration::hours(4), 90.0))
            .unwrap();
        service
            .add_activity(sleep_command(baby.id, now - Duration::hours(1), now))
            .unwrap();

        let suggestions = service.suggestions(baby.id, now).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].contains("feeding"));
        assert!(service
            .time_since_last(baby.id, ActivityType::Feeding, now)
            .unwrap()
            .is_some_and(|secs| secs > FEEDING_SUGGESTION_SECS));
    }

    #[test]
    fn test_daily_summary_and_statistics() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        let now = Utc::now();
        for hours in [1, 4, 7] {
            service
                .add_activity(feeding_command(baby.id, now - Duration::hours(hours), 100.0))
                .unwrap();
        }
        service
            .add_activity(feeding_command(baby.id, now - Duration::days(10), 100.0))
            .unwrap();

        let stats = service.statistics(baby.id, StatisticsPeriod::Week, now).unwrap();
        assert_eq!(stats.activity_counts.get(&ActivityType::Feeding), Some(&3));

        let summary = service
            .daily_summary(baby.id, (now - Duration::days(10)).date_naive(), &Utc)
            .unwrap();
        assert_eq!(summary.get(&ActivityType::Feeding), Some(&1));
    }

    #[test]
    fn test_export_is_json_array() {
        let (helper, service) = setup();
        let baby = helper.create_test_baby("Ava").unwrap();
        service.add_activity(feeding_command(baby.id, Utc::now(), 90.0)).unwrap();

        let json = service.export_activities(baby.id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }
}
