//! # Pattern Learner
//!
//! Derives typical sleep and feeding times from a baby's activity history and
//! turns them into a daily schedule or a prediction of the next event.
//!
//! The approach is deliberately simple: start times are reduced to minutes
//! since local midnight, sorted, and merged in a single pass whenever two
//! consecutive values are at most [`CLUSTER_GAP_MINUTES`] apart. Each cluster
//! collapses to its integer mean. Confidence is derived from the population
//! variance of the raw minute values.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};
use shared::ActivityType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::models::activity::ActivityRecord;
use crate::domain::models::pattern::{
    BabyPattern, DiaperPattern, FeedingPattern, PredictedEvent, ScheduleSuggestion, SleepPattern,
};

/// Consecutive sorted times within this many minutes belong to the same cluster
pub const CLUSTER_GAP_MINUTES: u32 = 60;
/// Variance at which confidence bottoms out
const MAX_VARIANCE: f64 = 3600.0;
const MIN_CONFIDENCE: f64 = 0.1;
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DIAPER_CONFIDENCE: f64 = 0.7;

/// Merge sorted minute-of-day values into cluster means
pub fn cluster_times(times: &[u32]) -> Vec<u32> {
    if times.is_empty() {
        return Vec::new();
    }

    let mut sorted = times.to_vec();
    sorted.sort_unstable();

    let mut clusters: Vec<Vec<u32>> = Vec::new();
    let mut current = vec![sorted[0]];
    for pair in sorted.windows(2) {
        if pair[1] - pair[0] <= CLUSTER_GAP_MINUTES {
            current.push(pair[1]);
        } else {
            clusters.push(std::mem::replace(&mut current, vec![pair[1]]));
        }
    }
    clusters.push(current);

    clusters
        .iter()
        .map(|cluster| cluster.iter().sum::<u32>() / cluster.len() as u32)
        .collect()
}

/// Population variance; zero for fewer than two values
pub fn calculate_variance(values: &[u32]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

/// Confidence in [0.1, 1.0]; fixed at 0.5 with fewer than three samples
pub fn calculate_confidence(times: &[u32]) -> f64 {
    if times.len() <= 2 {
        return DEFAULT_CONFIDENCE;
    }
    (1.0 - calculate_variance(times) / MAX_VARIANCE).max(MIN_CONFIDENCE)
}

/// Minutes since local midnight of an activity's start
pub fn minute_of_day<Tz: TimeZone>(activity: &ActivityRecord, tz: &Tz) -> u32 {
    let local = activity.start_time.with_timezone(tz);
    local.hour() * 60 + local.minute()
}

/// Mean of the recorded durations, zero when none were recorded
pub fn average_duration(activities: &[&ActivityRecord]) -> f64 {
    let durations: Vec<f64> = activities.iter().filter_map(|a| a.duration).collect();
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<f64>() / durations.len() as f64
}

/// Mean gap in seconds between consecutive start times
pub fn average_interval(activities: &[&ActivityRecord]) -> f64 {
    if activities.len() < 2 {
        return 0.0;
    }
    let mut starts: Vec<_> = activities.iter().map(|a| a.start_time).collect();
    starts.sort();
    let total: f64 = starts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
        .sum();
    total / (starts.len() - 1) as f64
}

fn of_type(activities: &[ActivityRecord], activity_type: ActivityType) -> Vec<&ActivityRecord> {
    activities.iter().filter(|a| a.activity_type == activity_type).collect()
}

/// Build a pattern from an activity history, reading times in `tz`
pub fn analyze_patterns<Tz: TimeZone>(activities: &[ActivityRecord], tz: &Tz) -> BabyPattern {
    let sleeps = of_type(activities, ActivityType::Sleep);
    let sleep = (!sleeps.is_empty()).then(|| {
        let times: Vec<u32> = sleeps.iter().map(|a| minute_of_day(a, tz)).collect();
        SleepPattern {
            typical_sleep_times: cluster_times(&times),
            average_duration: average_duration(&sleeps),
            confidence: calculate_confidence(&times),
        }
    });

    let feedings = of_type(activities, ActivityType::Feeding);
    let feeding = (!feedings.is_empty()).then(|| {
        let times: Vec<u32> = feedings.iter().map(|a| minute_of_day(a, tz)).collect();
        FeedingPattern {
            typical_feeding_times: cluster_times(&times),
            average_interval: average_interval(&feedings),
            confidence: calculate_confidence(&times),
        }
    });

    let diapers = of_type(activities, ActivityType::Diaper);
    let diaper = (!diapers.is_empty()).then(|| DiaperPattern {
        average_interval: average_interval(&diapers),
        confidence: DIAPER_CONFIDENCE,
    });

    BabyPattern { sleep, feeding, diaper }
}

/// Local time `minutes` after midnight of `date`. `None` inside a DST gap.
fn at_minute(date: NaiveDate, minutes: u32) -> Option<DateTime<Local>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&(midnight + Duration::minutes(minutes as i64)))
        .earliest()
}

/// Schedule used until a pattern has been learned
pub fn default_schedule(date: NaiveDate) -> Vec<ScheduleSuggestion> {
    [
        (ActivityType::Feeding, 7, 0.8, "Suggested breakfast time"),
        (ActivityType::Sleep, 9, 0.7, "Suggested morning nap"),
        (ActivityType::Feeding, 12, 0.8, "Suggested lunch time"),
    ]
    .into_iter()
    .filter_map(|(activity_type, hour, confidence, reason)| {
        at_minute(date, hour * 60).map(|suggested_time| ScheduleSuggestion {
            activity_type,
            suggested_time,
            confidence,
            reason: reason.to_string(),
        })
    })
    .collect()
}

/// Caches learned patterns per baby
#[derive(Clone, Default)]
pub struct PatternLearner {
    patterns: Arc<Mutex<HashMap<Uuid, BabyPattern>>>,
}

impl PatternLearner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze `activities` and replace the cached pattern for `baby_id`
    pub fn learn_patterns(&self, baby_id: Uuid, activities: &[ActivityRecord]) -> BabyPattern {
        info!("Learning patterns for baby {} from {} activities", baby_id, activities.len());

        let pattern = analyze_patterns(activities, &Local);
        debug!("Learned pattern for {}: {:?}", baby_id, pattern);

        match self.patterns.lock() {
            Ok(mut patterns) => {
                patterns.insert(baby_id, pattern.clone());
            }
            Err(e) => warn!("Pattern cache lock poisoned, pattern not cached: {}", e),
        }
        pattern
    }

    pub fn pattern_for(&self, baby_id: Uuid) -> Option<BabyPattern> {
        self.patterns.lock().ok().and_then(|p| p.get(&baby_id).cloned())
    }

    /// One suggestion per learned sleep and feeding time on `date`, sorted by time.
    /// Falls back to the default schedule when nothing has been learned.
    pub fn generate_daily_schedule(&self, baby_id: Uuid, date: NaiveDate) -> Vec<ScheduleSuggestion> {
        let Some(pattern) = self.pattern_for(baby_id) else {
            debug!("No learned pattern for {}, using default schedule", baby_id);
            return default_schedule(date);
        };

        let mut suggestions = Vec::new();
        if let Some(sleep) = &pattern.sleep {
            for &minutes in &sleep.typical_sleep_times {
                if let Some(suggested_time) = at_minute(date, minutes) {
                    suggestions.push(ScheduleSuggestion {
                        activity_type: ActivityType::Sleep,
                        suggested_time,
                        confidence: sleep.confidence,
                        reason: "Based on past sleep rhythm".to_string(),
                    });
                }
            }
        }
        if let Some(feeding) = &pattern.feeding {
            for &minutes in &feeding.typical_feeding_times {
                if let Some(suggested_time) = at_minute(date, minutes) {
                    suggestions.push(ScheduleSuggestion {
                        activity_type: ActivityType::Feeding,
                        suggested_time,
                        confidence: feeding.confidence,
                        reason: "Based on past feeding rhythm".to_string(),
                    });
                }
            }
        }

        suggestions.sort_by_key(|s| s.suggested_time);
        suggestions
    }

    /// Earliest learned sleep or feeding time still ahead of `now` today.
    /// Returns `None` once every learned time has passed.
    pub fn next_predicted_event(&self, baby_id: Uuid, now: DateTime<Local>) -> Option<PredictedEvent> {
        let pattern = self.pattern_for(baby_id)?;
        let current = now.hour() * 60 + now.minute();

        let sleep_times = pattern.sleep.iter().flat_map(|s| {
            s.typical_sleep_times.iter().map(move |&t| (ActivityType::Sleep, t, s.confidence))
        });
        let feeding_times = pattern.feeding.iter().flat_map(|f| {
            f.typical_feeding_times.iter().map(move |&t| (ActivityType::Feeding, t, f.confidence))
        });

        let (activity_type, minutes, confidence) = sleep_times
            .chain(feeding_times)
            .filter(|(_, t, _)| *t > current)
            .min_by_key(|(_, t, _)| *t)?;

        Some(PredictedEvent {
            activity_type,
            predicted_time: now + Duration::minutes((minutes - current) as i64),
            confidence,
        })
    }
}
