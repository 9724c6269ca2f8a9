//! # Analysis Rate Limiter
//!
//! Sliding-window request counters for cloud analysis, one timestamp list per
//! analysis category. A request is allowed while its own category has fewer
//! than `hourly_limit` requests in the last hour and fewer than `daily_limit`
//! in the last 24 hours. Usage reported to clients is summed across
//! categories.
//!
//! `allow_request` and `record_request` are separate calls; a caller that
//! checks and then records is not atomic with other callers.

use chrono::{DateTime, Duration, Utc};
use shared::{AnalysisRequestType, QuotaStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub const DEFAULT_HOURLY_LIMIT: u32 = 10;
pub const DEFAULT_DAILY_LIMIT: u32 = 30;

type Timestamps = HashMap<AnalysisRequestType, Vec<DateTime<Utc>>>;

#[derive(Clone)]
pub struct RateLimiter {
    timestamps: Arc<Mutex<Timestamps>>,
    hourly_limit: u32,
    daily_limit: u32,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_HOURLY_LIMIT, DEFAULT_DAILY_LIMIT)
    }
}

impl RateLimiter {
    pub fn new(hourly_limit: u32, daily_limit: u32) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(HashMap::new())),
            hourly_limit,
            daily_limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timestamps> {
        // the map stays consistent even if a holder panicked
        self.timestamps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Prune entries older than a day for `category`, then check both windows
    pub fn allow_request(&self, category: AnalysisRequestType, now: DateTime<Utc>) -> bool {
        let one_hour_ago = now - Duration::hours(1);
        let one_day_ago = now - Duration::days(1);

        let mut timestamps = self.lock();
        let Some(entries) = timestamps.get_mut(&category) else {
            return true;
        };
        entries.retain(|t| *t > one_day_ago);

        let hourly = entries.iter().filter(|t| **t > one_hour_ago).count() as u32;
        let daily = entries.len() as u32;
        let allowed = hourly < self.hourly_limit && daily < self.daily_limit;

        if !allowed {
            warn!(
                "Rate limit reached for {}: {} in the last hour, {} in the last day",
                category.as_str(),
                hourly,
                daily
            );
        }
        allowed
    }

    pub fn record_request(&self, category: AnalysisRequestType, now: DateTime<Utc>) {
        debug!("Recording {} analysis request at {}", category.as_str(), now);
        self.lock().entry(category).or_default().push(now);
    }

    fn usage_since(&self, since: DateTime<Utc>) -> u32 {
        self.lock()
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|t| **t > since)
            .count() as u32
    }

    /// Requests across all categories in the last hour
    pub fn hourly_usage(&self, now: DateTime<Utc>) -> u32 {
        self.usage_since(now - Duration::hours(1))
    }

    /// Requests across all categories in the last 24 hours
    pub fn daily_usage(&self, now: DateTime<Utc>) -> u32 {
        self.usage_since(now - Duration::days(1))
    }

    pub fn quota_status(&self, now: DateTime<Utc>) -> QuotaStatus {
        QuotaStatus {
            hourly_remaining: self.hourly_limit.saturating_sub(self.hourly_usage(now)),
            daily_remaining: self.daily_limit.saturating_sub(self.daily_usage(now)),
        }
    }

    /// Whether the remaining quota admits a request of `category`.
    /// Milestone checks only need daily headroom.
    pub fn has_available_quota(&self, category: AnalysisRequestType, now: DateTime<Utc>) -> bool {
        let status = self.quota_status(now);
        match category {
            AnalysisRequestType::Emotion | AnalysisRequestType::Development => {
                status.hourly_remaining > 0 && status.daily_remaining > 0
            }
            AnalysisRequestType::MilestoneCheck => status.daily_remaining > 0,
        }
    }
}
