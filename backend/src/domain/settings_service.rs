//! # Settings Service
//!
//! Holds the process-wide [`AppSettings`] in memory and persists every change
//! to `settings.yaml`. A missing or unreadable file yields the defaults.
//!
//! The analysis usage counter kept here (`ai.used_quota`, reset when the
//! calendar day changes) is separate from the sliding-window rate limiter.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use shared::{
    AiSettings, AppSettings, DisplaySettings, HeightUnit, NotificationSettings, PrivacySettings,
    SyncSettings, TemperatureUnit, UnitSettings, VolumeUnit, WeightUnit,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::domain::events::{EventBus, StoreEvent};
use crate::storage::csv::{CsvConnection, SettingsRepository};
use crate::storage::traits::SettingsStorage;

const KG_TO_LB: f64 = 2.20462;
const CM_PER_INCH: f64 = 2.54;
const ML_PER_OZ: f64 = 29.5735;
const MIN_AUTO_LOCK_SECS: f64 = 60.0;

/// Settings sections that can be reset independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsSection {
    Notifications,
    Privacy,
    Sync,
    Display,
    Ai,
}

#[derive(Clone)]
pub struct SettingsService {
    repository: SettingsRepository,
    settings: Arc<Mutex<AppSettings>>,
    events: EventBus,
}

impl SettingsService {
    pub fn new(csv_conn: Arc<CsvConnection>, events: EventBus) -> Self {
        let repository = SettingsRepository::new((*csv_conn).clone());
        let settings = match repository.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!("No stored settings, using defaults");
                AppSettings::default()
            }
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        };
        Self {
            repository,
            settings: Arc::new(Mutex::new(settings)),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppSettings> {
        self.settings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_settings(&self) -> AppSettings {
        self.lock().clone()
    }

    /// Apply `change` to the settings and persist the result
    pub fn modify<F>(&self, change: F) -> Result<AppSettings>
    where
        F: FnOnce(&mut AppSettings),
    {
        let updated = {
            let mut settings = self.lock();
            let mut updated = settings.clone();
            change(&mut updated);
            self.repository
                .save_settings(&updated)
                .context("Failed to save settings")?;
            *settings = updated.clone();
            updated
        };
        self.events.publish(StoreEvent::SettingsChanged);
        Ok(updated)
    }

    /// Replace the whole settings blob
    pub fn save_settings(&self, settings: AppSettings) -> Result<AppSettings> {
        info!("Saving settings");
        self.modify(|current| *current = settings)
    }

    pub fn update_notification_settings(&self, notifications: NotificationSettings) -> Result<AppSettings> {
        self.modify(|s| s.notifications = notifications)
    }

    pub fn update_privacy_settings(&self, privacy: PrivacySettings) -> Result<AppSettings> {
        self.modify(|s| s.privacy = privacy)
    }

    pub fn update_sync_settings(&self, sync: SyncSettings) -> Result<AppSettings> {
        self.modify(|s| s.sync = sync)
    }

    pub fn update_display_settings(&self, display: DisplaySettings) -> Result<AppSettings> {
        self.modify(|s| s.display = display)
    }

    pub fn update_unit_settings(&self, units: UnitSettings) -> Result<AppSettings> {
        self.modify(|s| s.display.units = units)
    }

    pub fn update_ai_settings(&self, ai: AiSettings) -> Result<AppSettings> {
        self.modify(|s| s.ai = ai)
    }

    pub fn enable_notifications(&self, enabled: bool) -> Result<AppSettings> {
        self.modify(|s| s.notifications.enabled = enabled)
    }

    pub fn set_auto_lock_timeout(&self, seconds: f64) -> Result<AppSettings> {
        self.modify(|s| s.privacy.auto_lock_timeout_secs = seconds)
    }

    pub fn update_last_sync_date(&self, date: DateTime<Utc>) -> Result<AppSettings> {
        self.modify(|s| s.sync.last_sync_date = Some(date))
    }

    pub fn set_language(&self, language: &str) -> Result<AppSettings> {
        self.modify(|s| s.display.language = language.to_string())
    }

    pub fn enable_analysis(&self, enabled: bool) -> Result<AppSettings> {
        self.modify(|s| s.ai.analysis_enabled = enabled)
    }

    pub fn update_analysis_quota(&self, quota: i32) -> Result<AppSettings> {
        self.modify(|s| s.ai.analysis_quota = quota)
    }

    /// Count one analysis made at `now`. The counter starts over first when
    /// `now` is on a later calendar day than the last reset.
    pub fn increment_used_quota<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<AppSettings> {
        let tz = now.timezone();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);
        self.modify(|s| {
            if s.ai.quota_reset_date.with_timezone(&tz).date_naive() != today {
                info!("New calendar day, resetting analysis quota");
                s.ai.used_quota = 0;
                s.ai.quota_reset_date = now_utc;
            }
            s.ai.used_quota += 1;
        })
    }

    pub fn reset_quota(&self, now: DateTime<Utc>) -> Result<AppSettings> {
        info!("Resetting analysis quota");
        self.modify(|s| {
            s.ai.used_quota = 0;
            s.ai.quota_reset_date = now;
        })
    }

    pub fn reset_to_defaults(&self) -> Result<AppSettings> {
        info!("Resetting all settings to defaults");
        self.modify(|s| *s = AppSettings::default())
    }

    pub fn reset_section(&self, section: SettingsSection) -> Result<AppSettings> {
        info!("Resetting {:?} settings", section);
        self.modify(|s| match section {
            SettingsSection::Notifications => s.notifications = NotificationSettings::default(),
            SettingsSection::Privacy => s.privacy = PrivacySettings::default(),
            SettingsSection::Sync => s.sync = SyncSettings::default(),
            SettingsSection::Display => s.display = DisplaySettings::default(),
            SettingsSection::Ai => s.ai = AiSettings::default(),
        })
    }

    /// Settings as JSON with ISO 8601 dates
    pub fn export_settings(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.get_settings()).context("Failed to export settings")
    }

    /// Replace the settings with an exported JSON document.
    /// Invalid input leaves the current settings untouched.
    pub fn import_settings(&self, json: &str) -> Result<AppSettings> {
        let imported: AppSettings =
            serde_json::from_str(json).context("Failed to import settings")?;
        info!("Imported settings");
        self.save_settings(imported)
    }

    /// Human readable problems with the current settings. Never enforced.
    pub fn validate_settings(&self) -> Vec<String> {
        let settings = self.get_settings();
        let mut warnings = Vec::new();

        if settings.privacy.auto_lock_timeout_secs < MIN_AUTO_LOCK_SECS {
            warnings.push("Auto-lock timeout cannot be less than 1 minute".to_string());
        }
        if settings.ai.analysis_quota < 0 {
            warnings.push("Analysis quota cannot be negative".to_string());
        }
        if settings.ai.used_quota > settings.ai.analysis_quota {
            warnings.push("Used quota cannot exceed the total quota".to_string());
        }
        warnings
    }

    pub fn available_analysis_count(&self) -> i32 {
        let ai = &self.get_settings().ai;
        (ai.analysis_quota - ai.used_quota).max(0)
    }

    /// Reset the used quota when `now` falls on a different calendar day
    /// than the last reset. Returns whether a reset happened.
    pub fn check_quota_reset<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<bool> {
        let reset_date = self.get_settings().ai.quota_reset_date;
        let tz = now.timezone();
        if reset_date.with_timezone(&tz).date_naive() == now.date_naive() {
            return Ok(false);
        }
        self.reset_quota(now.with_timezone(&Utc))?;
        Ok(true)
    }

    /// `check_quota_reset` against the local calendar
    pub fn check_quota_reset_now(&self) -> Result<bool> {
        self.check_quota_reset(Local::now())
    }

    pub fn format_weight(&self, kg: f64) -> String {
        match self.get_settings().display.units.weight {
            WeightUnit::Kg => format!("{:.1} kg", kg),
            WeightUnit::Lb => format!("{:.1} lb", kg * KG_TO_LB),
        }
    }

    pub fn format_height(&self, cm: f64) -> String {
        match self.get_settings().display.units.height {
            HeightUnit::Cm => format!("{:.1} cm", cm),
            HeightUnit::Inch => format!("{:.1} in", cm / CM_PER_INCH),
        }
    }

    pub fn format_temperature(&self, celsius: f64) -> String {
        match self.get_settings().display.units.temperature {
            TemperatureUnit::Celsius => format!("{:.1}°C", celsius),
            TemperatureUnit::Fahrenheit => format!("{:.1}°F", celsius * 9.0 / 5.0 + 32.0),
        }
    }

    pub fn format_volume(&self, ml: f64) -> String {
        match self.get_settings().display.units.volume {
            VolumeUnit::Ml => format!("{:.0} ml", ml),
            VolumeUnit::Oz => format!("{:.1} oz", ml / ML_PER_OZ),
        }
    }

    pub fn format_date<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        date.format(&to_strftime(&self.get_settings().display.date_format)).to_string()
    }

    pub fn format_time<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        date.format(&to_strftime(&self.get_settings().display.time_format)).to_string()
    }
}

/// Translate a `yyyy/MM/dd HH:mm` style pattern into a strftime string
pub fn to_strftime(pattern: &str) -> String {
    const TOKENS: [(&str, &str); 10] = [
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("a", "%p"),
        ("%", "%%"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::{Duration, FixedOffset};

    fn service(env: &TestEnvironment) -> SettingsService {
        SettingsService::new(Arc::new(env.connection.clone()), EventBus::new())
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let env = TestEnvironment::new().unwrap();
        let settings = service(&env).get_settings();
        assert_eq!(settings.ai.analysis_quota, 30);
        assert_eq!(settings.display.date_format, "yyyy/MM/dd");
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let env = TestEnvironment::new().unwrap();
        std::fs::write(env.base_path.join("settings.yaml"), ": : not yaml [").unwrap();
        assert_eq!(service(&env).get_settings().privacy.auto_lock_timeout_secs, 300.0);
    }

    #[test]
    fn test_changes_persist_across_instances() {
        let env = TestEnvironment::new().unwrap();
        let first = service(&env);
        first.set_language("en").unwrap();
        first.increment_used_quota(Local::now()).unwrap();

        let second = service(&env);
        assert_eq!(second.get_settings().display.language, "en");
        assert_eq!(second.get_settings().ai.used_quota, 1);
        assert_eq!(second.available_analysis_count(), 29);
    }

    #[test]
    fn test_validate_settings_warnings() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        assert!(service.validate_settings().is_empty());

        service.set_auto_lock_timeout(30.0).unwrap();
        service
            .modify(|s| {
                s.ai.analysis_quota = 1;
                s.ai.used_quota = 3;
            })
            .unwrap();
        assert_eq!(service.validate_settings().len(), 2);
        assert_eq!(service.available_analysis_count(), 0);

        service.update_analysis_quota(-1).unwrap();
        assert_eq!(service.validate_settings().len(), 3);
    }

    #[test]
    fn test_quota_resets_once_per_calendar_day() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        service.reset_quota(morning.with_timezone(&Utc)).unwrap();
        service.increment_used_quota(morning).unwrap();

        assert!(!service.check_quota_reset(morning + Duration::hours(15)).unwrap());
        assert_eq!(service.get_settings().ai.used_quota, 1);

        let next_day = morning + Duration::hours(17);
        assert!(service.check_quota_reset(next_day).unwrap());
        assert_eq!(service.get_settings().ai.used_quota, 0);
        assert!(!service.check_quota_reset(next_day + Duration::hours(1)).unwrap());
    }

    #[test]
    fn test_first_use_on_a_new_day_keeps_todays_count() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let yesterday = tz.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();

        service.reset_quota(yesterday.with_timezone(&Utc)).unwrap();
        service.modify(|s| s.ai.used_quota = 5).unwrap();

        let today = yesterday + Duration::hours(4);
        assert_eq!(service.increment_used_quota(today).unwrap().ai.used_quota, 1);
        assert!(!service.check_quota_reset(today + Duration::hours(1)).unwrap());
        assert_eq!(service.get_settings().ai.used_quota, 1);
        assert_eq!(service.available_analysis_count(), 29);
    }

    #[test]
    fn test_reset_section_keeps_other_sections() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        service.enable_notifications(false).unwrap();
        service.set_language("en").unwrap();

        service.reset_section(SettingsSection::Notifications).unwrap();
        let settings = service.get_settings();
        assert!(settings.notifications.enabled);
        assert_eq!(settings.display.language, "en");
    }

    #[test]
    fn test_export_import() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        service.set_language("en").unwrap();
        let exported = service.export_settings().unwrap();
        assert!(exported.contains("quota_reset_date"));

        service.reset_to_defaults().unwrap();
        assert!(service.import_settings("{not json").is_err());
        assert_eq!(service.get_settings().display.language, "zh-Hant");

        service.import_settings(&exported).unwrap();
        assert_eq!(service.get_settings().display.language, "en");
    }

    #[test]
    fn test_unit_formatting() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        assert_eq!(service.format_weight(3.5), "3.5 kg");
        assert_eq!(service.format_volume(120.0), "120 ml");

        service
            .update_unit_settings(UnitSettings {
                weight: WeightUnit::Lb,
                height: HeightUnit::Inch,
                temperature: TemperatureUnit::Fahrenheit,
                volume: VolumeUnit::Oz,
            })
            .unwrap();
        assert_eq!(service.format_weight(1.0), "2.2 lb");
        assert_eq!(service.format_height(25.4), "10.0 in");
        assert_eq!(service.format_temperature(37.0), "98.6°F");
        assert_eq!(service.format_volume(29.5735), "1.0 oz");
    }

    #[test]
    fn test_date_and_time_formatting() {
        let env = TestEnvironment::new().unwrap();
        let service = service(&env);
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(service.format_date(&date), "2024/03/09");
        assert_eq!(service.format_time(&date), "07:05");
        assert_eq!(to_strftime("dd.MM.yy hh:mm a"), "%d.%m.%y %I:%M %p");
    }
}
