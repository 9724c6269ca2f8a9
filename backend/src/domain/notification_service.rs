//! Local reminder scheduling.
//!
//! The platform notification center sits behind [`NotificationCenter`];
//! [`InMemoryNotificationCenter`] keeps pending requests in process so the
//! scheduling rules can run headless. Reminders are silently skipped when
//! notifications (or the specific reminder kind) are disabled in settings.

use anyhow::{bail, Result};
use async_trait::async_trait;
use shared::{NotificationRequest, NotificationTrigger};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::settings_service::SettingsService;

pub const FEEDING_REMINDER: &str = "FEEDING_REMINDER";
pub const SLEEP_REMINDER: &str = "SLEEP_REMINDER";
pub const DIAPER_REMINDER: &str = "DIAPER_REMINDER";
pub const MEDICINE_REMINDER: &str = "MEDICINE_REMINDER";
pub const MILESTONE_CHECK: &str = "MILESTONE_CHECK";
pub const SMART_SUGGESTION: &str = "SMART_SUGGESTION";

pub const FEEDING_DONE: &str = "FEEDING_DONE";
pub const SLEEP_DONE: &str = "SLEEP_DONE";
pub const DIAPER_CHANGED: &str = "DIAPER_CHANGED";
pub const MEDICINE_TAKEN: &str = "MEDICINE_TAKEN";
pub const MILESTONE_CHECKED: &str = "MILESTONE_CHECKED";
pub const SUGGESTION_VIEWED: &str = "SUGGESTION_VIEWED";

const DEFAULT_SUGGESTION_DELAY_SECS: f64 = 3600.0;
/// Repeating interval triggers shorter than this are rejected
const MIN_REPEAT_INTERVAL_SECS: f64 = 60.0;
/// Milestone checks fire right after scheduling
const MILESTONE_DELAY_SECS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub identifier: &'static str,
    pub title: &'static str,
    /// Opens the app when chosen
    pub foreground: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCategory {
    pub identifier: &'static str,
    pub actions: Vec<NotificationAction>,
}

#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Add a request; an existing request with the same identifier is replaced
    async fn add(&self, request: NotificationRequest) -> Result<()>;

    async fn remove_pending(&self, identifiers: &[String]);

    async fn pending(&self) -> Vec<NotificationRequest>;

    async fn remove_all_pending(&self);

    async fn set_categories(&self, categories: Vec<NotificationCategory>);

    async fn set_badge_count(&self, count: u32);
}

#[derive(Default)]
struct CenterState {
    pending: Vec<NotificationRequest>,
    categories: Vec<NotificationCategory>,
    badge_count: u32,
}

/// Notification center that only records what would be delivered
#[derive(Clone, Default)]
pub struct InMemoryNotificationCenter {
    state: Arc<Mutex<CenterState>>,
}

impl InMemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CenterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        self.lock().categories.clone()
    }

    pub fn badge_count(&self) -> u32 {
        self.lock().badge_count
    }
}

fn check_trigger(trigger: &NotificationTrigger) -> Result<()> {
    match trigger {
        NotificationTrigger::Interval { seconds, repeats } => {
            if *seconds <= 0.0 {
                bail!("Interval must be positive, got {}", seconds);
            }
            if *repeats && *seconds < MIN_REPEAT_INTERVAL_SECS {
                bail!("Repeating interval must be at least 60 seconds, got {}", seconds);
            }
        }
        NotificationTrigger::Calendar { hour, minute, weekday, .. } => {
            if *hour > 23 || *minute > 59 {
                bail!("Invalid time {:02}:{:02}", hour, minute);
            }
            if weekday.is_some_and(|d| !(1..=7).contains(&d)) {
                bail!("Weekday must be between 1 (Sunday) and 7 (Saturday)");
            }
        }
    }
    Ok(())
}

#[async_trait]
impl NotificationCenter for InMemoryNotificationCenter {
    async fn add(&self, request: NotificationRequest) -> Result<()> {
        check_trigger(&request.trigger)?;
        let mut state = self.lock();
        state.pending.retain(|r| r.identifier != request.identifier);
        debug!("Pending notification added: {}", request.identifier);
        state.pending.push(request);
        Ok(())
    }

    async fn remove_pending(&self, identifiers: &[String]) {
        self.lock()
            .pending
            .retain(|r| !identifiers.contains(&r.identifier));
    }

    async fn pending(&self) -> Vec<NotificationRequest> {
        self.lock().pending.clone()
    }

    async fn remove_all_pending(&self) {
        self.lock().pending.clear();
    }

    async fn set_categories(&self, categories: Vec<NotificationCategory>) {
        self.lock().categories = categories;
    }

    async fn set_badge_count(&self, count: u32) {
        self.lock().badge_count = count;
    }
}

/// Milestones to look out for at a given age; empty for ages without a check
pub fn expected_milestones(age_in_months: u32) -> &'static [&'static str] {
    match age_in_months {
        1 => &["Lifts head", "Responds to sounds", "Follows objects with eyes"],
        2 => &["Social smile", "Cooing sounds", "Holds head up briefly"],
        3 => &[
            "Raises head 45 degrees on tummy",
            "Starts to unclench fists",
            "Responds to familiar voices",
        ],
        4 => &["Rolls over", "Grasps toys", "Laughs out loud"],
        6 => &["Sits without support", "Starts solid food", "Recognises familiar faces"],
        9 => &["Crawls", "Picks up small objects with fingers", "Says simple words"],
        12 => &["Walks independently", "Says first word", "Drinks from a cup"],
        _ => &[],
    }
}

fn category(
    identifier: &'static str,
    action: &'static str,
    title: &'static str,
    foreground: bool,
) -> NotificationCategory {
    NotificationCategory {
        identifier,
        actions: vec![NotificationAction { identifier: action, title, foreground }],
    }
}

pub fn default_categories() -> Vec<NotificationCategory> {
    vec![
        category(FEEDING_REMINDER, FEEDING_DONE, "Fed", false),
        category(SLEEP_REMINDER, SLEEP_DONE, "Asleep", false),
        category(DIAPER_REMINDER, DIAPER_CHANGED, "Changed", false),
        category(MEDICINE_REMINDER, MEDICINE_TAKEN, "Taken", false),
        category(MILESTONE_CHECK, MILESTONE_CHECKED, "Checked", false),
        category(SMART_SUGGESTION, SUGGESTION_VIEWED, "View", true),
    ]
}

#[derive(Clone)]
pub struct NotificationService {
    center: Arc<dyn NotificationCenter>,
    settings_service: SettingsService,
}

impl NotificationService {
    pub fn new(center: Arc<dyn NotificationCenter>, settings_service: SettingsService) -> Self {
        Self { center, settings_service }
    }

    pub async fn register_categories(&self) {
        info!("Registering notification categories");
        self.center.set_categories(default_categories()).await;
    }

    fn enabled(&self, kind: impl FnOnce(&shared::NotificationSettings) -> bool) -> bool {
        let settings = self.settings_service.get_settings().notifications;
        settings.enabled && kind(&settings)
    }

    fn request(
        identifier: String,
        category: &str,
        title: &str,
        body: String,
        trigger: NotificationTrigger,
    ) -> NotificationRequest {
        NotificationRequest {
            identifier,
            category: category.to_string(),
            title: title.to_string(),
            body,
            trigger,
            user_info: BTreeMap::new(),
        }
    }

    /// Returns the identifiers scheduled; empty when skipped by settings
    pub async fn schedule_feeding_reminder(&self, baby_id: Uuid, interval_secs: f64) -> Result<Vec<String>> {
        if !self.enabled(|n| n.feeding_reminders) {
            debug!("Feeding reminders disabled, skipping");
            return Ok(Vec::new());
        }
        let identifier = format!("feeding_reminder_{}", baby_id);
        info!("Scheduling feeding reminder every {}s for {}", interval_secs, baby_id);
        self.center
            .add(Self::request(
                identifier.clone(),
                FEEDING_REMINDER,
                "Feeding reminder",
                "Time to feed the baby".to_string(),
                NotificationTrigger::Interval { seconds: interval_secs, repeats: true },
            ))
            .await?;
        Ok(vec![identifier])
    }

    pub async fn cancel_feeding_reminder(&self, baby_id: Uuid) {
        self.center
            .remove_pending(&[format!("feeding_reminder_{}", baby_id)])
            .await;
    }

    pub async fn schedule_sleep_reminder(&self, baby_id: Uuid, hour: u32, minute: u32) -> Result<Vec<String>> {
        if !self.enabled(|n| n.sleep_reminders) {
            debug!("Sleep reminders disabled, skipping");
            return Ok(Vec::new());
        }
        let identifier = format!("sleep_reminder_{}", baby_id);
        info!("Scheduling sleep reminder at {:02}:{:02} for {}", hour, minute, baby_id);
        self.center
            .add(Self::request(
                identifier.clone(),
                SLEEP_REMINDER,
                "Sleep reminder",
                "Time to get the baby ready for sleep".to_string(),
                NotificationTrigger::Calendar { hour, minute, weekday: None, repeats: true },
            ))
            .await?;
        Ok(vec![identifier])
    }

    pub async fn cancel_sleep_reminder(&self, baby_id: Uuid) {
        self.center
            .remove_pending(&[format!("sleep_reminder_{}", baby_id)])
            .await;
    }

    pub async fn schedule_diaper_reminder(&self, baby_id: Uuid, interval_secs: f64) -> Result<Vec<String>> {
        if !self.enabled(|_| true) {
            return Ok(Vec::new());
        }
        let identifier = format!("diaper_reminder_{}", baby_id);
        info!("Scheduling diaper reminder every {}s for {}", interval_secs, baby_id);
        self.center
            .add(Self::request(
                identifier.clone(),
                DIAPER_REMINDER,
                "Diaper reminder",
                "Time to check the baby's diaper".to_string(),
                NotificationTrigger::Interval { seconds: interval_secs, repeats: true },
            ))
            .await?;
        Ok(vec![identifier])
    }

    pub async fn cancel_diaper_reminder(&self, baby_id: Uuid) {
        self.center
            .remove_pending(&[format!("diaper_reminder_{}", baby_id)])
            .await;
    }

    /// One-off reminder when `repeat_days` is empty, otherwise one weekly
    /// request per weekday (1 = Sunday)
    pub async fn schedule_medicine_reminder(
        &self,
        baby_id: Uuid,
        medicine_name: &str,
        hour: u32,
        minute: u32,
        repeat_days: &[u32],
    ) -> Result<Vec<String>> {
        if !self.enabled(|n| n.medicine_reminders) {
            debug!("Medicine reminders disabled, skipping");
            return Ok(Vec::new());
        }
        if medicine_name.trim().is_empty() {
            bail!("Medicine name cannot be empty");
        }
        info!("Scheduling {} reminder for {}", medicine_name, baby_id);

        let body = format!("Time for the baby's {}", medicine_name);
        let mut user_info = BTreeMap::new();
        user_info.insert("medicine_name".to_string(), medicine_name.to_string());
        user_info.insert("baby_id".to_string(), baby_id.to_string());

        let prefix = medicine_prefix(baby_id, medicine_name);
        let schedule: Vec<(String, Option<u32>, bool)> = if repeat_days.is_empty() {
            vec![(format!("{}_{}", prefix, Uuid::new_v4()), None, false)]
        } else {
            repeat_days
                .iter()
                .map(|day| (format!("{}_day{}", prefix, day), Some(*day), true))
                .collect()
        };

        let mut identifiers = Vec::with_capacity(schedule.len());
        for (identifier, weekday, repeats) in schedule {
            let mut request = Self::request(
                identifier.clone(),
                MEDICINE_REMINDER,
                "Medicine reminder",
                body.clone(),
                NotificationTrigger::Calendar { hour, minute, weekday, repeats },
            );
            request.user_info = user_info.clone();
            self.center.add(request).await?;
            identifiers.push(identifier);
        }
        Ok(identifiers)
    }

    /// Cancel every pending reminder for this medicine
    pub async fn cancel_medicine_reminder(&self, baby_id: Uuid, medicine_name: &str) {
        let prefix = medicine_prefix(baby_id, medicine_name);
        let identifiers: Vec<String> = self
            .center
            .pending()
            .await
            .into_iter()
            .map(|r| r.identifier)
            .filter(|id| id.starts_with(&prefix))
            .collect();
        debug!("Cancelling {} medicine reminders", identifiers.len());
        self.center.remove_pending(&identifiers).await;
    }

    /// Milestone check for the given age; nothing is scheduled for ages
    /// without expected milestones
    pub async fn schedule_milestone_check(&self, baby_id: Uuid, age_in_months: u32) -> Result<Vec<String>> {
        if !self.enabled(|n| n.milestone_alerts) {
            return Ok(Vec::new());
        }
        let milestones = expected_milestones(age_in_months);
        if milestones.is_empty() {
            debug!("No milestones expected at {} months", age_in_months);
            return Ok(Vec::new());
        }

        let identifier = format!("milestone_{}_{}months", baby_id, age_in_months);
        self.center
            .add(Self::request(
                identifier.clone(),
                MILESTONE_CHECK,
                "Milestone check",
                format!(
                    "Baby is now {} months old. Check for: {}",
                    age_in_months,
                    milestones.join(", ")
                ),
                NotificationTrigger::Interval { seconds: MILESTONE_DELAY_SECS, repeats: false },
            ))
            .await?;
        Ok(vec![identifier])
    }

    pub async fn schedule_smart_suggestion(
        &self,
        title: &str,
        body: &str,
        delay_secs: Option<f64>,
    ) -> Result<Vec<String>> {
        if !self.enabled(|_| true) {
            return Ok(Vec::new());
        }
        let identifier = format!("smart_suggestion_{}", Uuid::new_v4());
        self.center
            .add(Self::request(
                identifier.clone(),
                SMART_SUGGESTION,
                title,
                body.to_string(),
                NotificationTrigger::Interval {
                    seconds: delay_secs.unwrap_or(DEFAULT_SUGGESTION_DELAY_SECS),
                    repeats: false,
                },
            ))
            .await?;
        Ok(vec![identifier])
    }

    pub async fn pending(&self) -> Vec<NotificationRequest> {
        self.center.pending().await
    }

    pub async fn remove_pending(&self, identifiers: &[String]) {
        self.center.remove_pending(identifiers).await;
    }

    pub async fn remove_all_pending(&self) {
        info!("Removing all pending notifications");
        self.center.remove_all_pending().await;
    }

    pub async fn update_badge_count(&self, count: u32) {
        self.center.set_badge_count(count).await;
    }

    pub async fn clear_badge(&self) {
        self.update_badge_count(0).await;
    }

    /// Route a notification action. Returns `None` for unknown actions.
    pub fn handle_action(&self, action_identifier: &str, request_identifier: &str) -> Option<&'static str> {
        let message = match action_identifier {
            FEEDING_DONE => "Feeding recorded",
            SLEEP_DONE => "Sleep recorded",
            DIAPER_CHANGED => "Diaper change recorded",
            MEDICINE_TAKEN => "Medicine marked as taken",
            MILESTONE_CHECKED => "Milestone checked",
            SUGGESTION_VIEWED => "Suggestion viewed",
            _ => {
                debug!("Ignoring unknown notification action {}", action_identifier);
                return None;
            }
        };
        info!("{} ({})", message, request_identifier);
        Some(message)
    }
}

fn medicine_prefix(baby_id: Uuid, medicine_name: &str) -> String {
    format!("medicine_{}_{}", baby_id, medicine_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventBus;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn setup() -> (TestEnvironment, InMemoryNotificationCenter, NotificationService, SettingsService) {
        let env = TestEnvironment::new().unwrap();
        let settings = SettingsService::new(Arc::new(env.connection.clone()), EventBus::new());
        let center = InMemoryNotificationCenter::new();
        let service = NotificationService::new(Arc::new(center.clone()), settings.clone());
        (env, center, service, settings)
    }

    #[tokio::test]
    async fn test_categories_registered() {
        let (_env, center, service, _settings) = setup();
        service.register_categories().await;
        let categories = center.categories();
        assert_eq!(categories.len(), 6);
        let suggestion = categories.iter().find(|c| c.identifier == SMART_SUGGESTION).unwrap();
        assert!(suggestion.actions[0].foreground);
    }

    #[tokio::test]
    async fn test_interval_reminders_replace_by_identifier() {
        let (_env, _center, service, _settings) = setup();
        let baby = Uuid::new_v4();

        service.schedule_feeding_reminder(baby, 10_800.0).await.unwrap();
        service.schedule_feeding_reminder(baby, 7_200.0).await.unwrap();
        service.schedule_diaper_reminder(baby, 7_200.0).await.unwrap();

        let pending = service.pending().await;
        assert_eq!(pending.len(), 2);
        let feeding = pending
            .iter()
            .find(|r| r.identifier == format!("feeding_reminder_{}", baby))
            .unwrap();
        assert_eq!(
            feeding.trigger,
            NotificationTrigger::Interval { seconds: 7_200.0, repeats: true }
        );

        service.cancel_feeding_reminder(baby).await;
        assert_eq!(service.pending().await.len(), 1);
        assert!(service.schedule_feeding_reminder(baby, 30.0).await.is_err());
    }

    #[tokio::test]
    async fn test_medicine_reminders_per_weekday() {
        let (_env, _center, service, _settings) = setup();
        let baby = Uuid::new_v4();

        let ids = service
            .schedule_medicine_reminder(baby, "Vitamin D", 8, 30, &[2, 4, 6])
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids[0].ends_with("_day2"));

        let once = service
            .schedule_medicine_reminder(baby, "Ibuprofen", 20, 0, &[])
            .await
            .unwrap();
        assert_eq!(once.len(), 1);
        let pending = service.pending().await;
        let single = pending.iter().find(|r| r.identifier == once[0]).unwrap();
        assert_eq!(
            single.trigger,
            NotificationTrigger::Calendar { hour: 20, minute: 0, weekday: None, repeats: false }
        );
        assert_eq!(single.user_info.get("medicine_name").map(String::as_str), Some("Ibuprofen"));

        service.cancel_medicine_reminder(baby, "Vitamin D").await;
        let remaining = service.pending().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].identifier, once[0]);

        assert!(service
            .schedule_medicine_reminder(baby, "Vitamin D", 8, 30, &[8])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_milestone_checks_follow_age_table() {
        let (_env, _center, service, _settings) = setup();
        let baby = Uuid::new_v4();

        assert!(service.schedule_milestone_check(baby, 5).await.unwrap().is_empty());
        let ids = service.schedule_milestone_check(baby, 6).await.unwrap();
        assert_eq!(ids, vec![format!("milestone_{}_6months", baby)]);
        let pending = service.pending().await;
        assert!(pending[0].body.contains("Sits without support"));
    }

    #[tokio::test]
    async fn test_disabled_settings_skip_scheduling() {
        let (_env, _center, service, settings) = setup();
        let baby = Uuid::new_v4();

        settings
            .modify(|s| s.notifications.sleep_reminders = false)
            .unwrap();
        assert!(service.schedule_sleep_reminder(baby, 19, 30).await.unwrap().is_empty());
        assert_eq!(service.schedule_feeding_reminder(baby, 3600.0).await.unwrap().len(), 1);

        settings.enable_notifications(false).unwrap();
        assert!(service.schedule_feeding_reminder(baby, 3600.0).await.unwrap().is_empty());
        assert!(service
            .schedule_smart_suggestion("Nap soon", "Baby usually naps now", None)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn test_badge_and_actions() {
        let (_env, center, service, _settings) = setup();
        service.update_badge_count(3).await;
        assert_eq!(center.badge_count(), 3);
        service.clear_badge().await;
        assert_eq!(center.badge_count(), 0);

        assert_eq!(service.handle_action(FEEDING_DONE, "feeding_reminder_x"), Some("Feeding recorded"));
        assert_eq!(service.handle_action("SNOOZE", "x"), None);

        service.schedule_smart_suggestion("Hi", "There", Some(120.0)).await.unwrap();
        service.remove_all_pending().await;
        assert!(service.pending().await.is_empty());
    }
}
