use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Activity types and details
// ---------------------------------------------------------------------------

/// Kind of care activity that can be logged for a baby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Feeding,
    Diaper,
    Sleep,
    Bath,
    Medicine,
    Measurement,
    Milestone,
    Custom,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::Feeding,
        ActivityType::Diaper,
        ActivityType::Sleep,
        ActivityType::Bath,
        ActivityType::Medicine,
        ActivityType::Measurement,
        ActivityType::Milestone,
        ActivityType::Custom,
    ];

    /// Stable identifier used in files and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Feeding => "feeding",
            ActivityType::Diaper => "diaper",
            ActivityType::Sleep => "sleep",
            ActivityType::Bath => "bath",
            ActivityType::Medicine => "medicine",
            ActivityType::Measurement => "measurement",
            ActivityType::Milestone => "milestone",
            ActivityType::Custom => "custom",
        }
    }

    /// Human readable name, also matched by free-text search
    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityType::Feeding => "Feeding",
            ActivityType::Diaper => "Diaper change",
            ActivityType::Sleep => "Sleep",
            ActivityType::Bath => "Bath",
            ActivityType::Medicine => "Medicine",
            ActivityType::Measurement => "Measurement",
            ActivityType::Milestone => "Milestone",
            ActivityType::Custom => "Custom",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown activity type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingType {
    Breast,
    Bottle,
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreastSide {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaperType {
    Wet,
    Dirty,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaperCondition {
    Normal,
    Loose,
    Hard,
    Unusual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    Weight,
    Height,
    Temperature,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneCategory {
    Physical,
    Cognitive,
    Social,
    Language,
    Emotional,
}

fn default_volume_unit() -> String {
    "ml".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingDetails {
    pub feeding_type: FeedingType,
    /// Amount fed, in `unit`
    pub amount: Option<f64>,
    #[serde(default = "default_volume_unit")]
    pub unit: String,
    pub side: Option<BreastSide>,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaperDetails {
    pub diaper_type: DiaperType,
    pub condition: Option<DiaperCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepDetails {
    pub quality: Option<SleepQuality>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BathDetails {
    /// Water temperature in Celsius
    pub temperature: Option<f64>,
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineDetails {
    pub name: String,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDetails {
    pub kind: MeasurementKind,
    pub value: f64,
    pub unit: String,
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDetails {
    pub title: String,
    pub description: Option<String>,
    pub category: MilestoneCategory,
    pub age_in_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDetails {
    pub title: String,
    pub description: Option<String>,
    pub value: Option<String>,
}

/// Type-specific payload of an activity, tagged by the activity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityDetails {
    Feeding(FeedingDetails),
    Diaper(DiaperDetails),
    Sleep(SleepDetails),
    Bath(BathDetails),
    Medicine(MedicineDetails),
    Measurement(MeasurementDetails),
    Milestone(MilestoneDetails),
    Custom(CustomDetails),
}

impl ActivityDetails {
    /// The activity type this payload belongs to
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityDetails::Feeding(_) => ActivityType::Feeding,
            ActivityDetails::Diaper(_) => ActivityType::Diaper,
            ActivityDetails::Sleep(_) => ActivityType::Sleep,
            ActivityDetails::Bath(_) => ActivityType::Bath,
            ActivityDetails::Medicine(_) => ActivityType::Medicine,
            ActivityDetails::Measurement(_) => ActivityType::Measurement,
            ActivityDetails::Milestone(_) => ActivityType::Milestone,
            ActivityDetails::Custom(_) => ActivityType::Custom,
        }
    }
}

// ---------------------------------------------------------------------------
// Babies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Baby profile as exchanged over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baby {
    pub id: String,
    pub name: String,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: String,
    pub gender: Gender,
    pub profile_image_path: Option<String>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBabyRequest {
    pub name: String,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: String,
    pub gender: Gender,
    pub profile_image_path: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateBabyRequest {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub profile_image_path: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyResponse {
    pub baby: Baby,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyListResponse {
    pub babies: Vec<Baby>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBabyResponse {
    pub active_baby: Option<Baby>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetActiveBabyRequest {
    pub baby_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyAgeResponse {
    pub months: u32,
    pub days: u32,
    pub age_string: String,
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Logged care activity as exchanged over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub baby_id: String,
    pub activity_type: ActivityType,
    /// RFC 3339 timestamp
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_secs: Option<f64>,
    pub details: ActivityDetails,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub baby_id: String,
    pub activity_type: ActivityType,
    /// RFC 3339 timestamp; defaults to now
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_secs: Option<f64>,
    pub details: ActivityDetails,
    pub notes: Option<String>,
    /// Caregiver id; defaults to the nil id
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_secs: Option<f64>,
    pub details: Option<ActivityDetails>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub activity: ActivityRecord,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityListResponse {
    pub activities: Vec<ActivityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummaryResponse {
    /// Day summarised (YYYY-MM-DD)
    pub date: String,
    pub counts: BTreeMap<ActivityType, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl StatisticsPeriod {
    /// Number of days covered by the period
    pub fn days(&self) -> u32 {
        match self {
            StatisticsPeriod::Day => 1,
            StatisticsPeriod::Week => 7,
            StatisticsPeriod::Month => 30,
            StatisticsPeriod::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub direction: TrendDirection,
    pub percentage: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub period: StatisticsPeriod,
    pub activity_counts: BTreeMap<ActivityType, usize>,
    pub total_duration_secs: BTreeMap<ActivityType, f64>,
    pub averages: BTreeMap<String, f64>,
    pub trends: BTreeMap<String, TrendData>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySuggestionsResponse {
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Smart assistant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSuggestion {
    pub activity_type: ActivityType,
    /// RFC 3339 timestamp
    pub suggested_time: String,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub suggestions: Vec<ScheduleSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedEvent {
    pub activity_type: ActivityType,
    pub predicted_time: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextEventResponse {
    pub event: Option<PredictedEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipCategory {
    Feeding,
    Sleep,
    Development,
    Health,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppContext {
    HomeScreen,
    FeedingLog,
    SleepLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentingTip {
    pub title: String,
    pub content: String,
    pub category: TipCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipsResponse {
    pub tips: Vec<ParentingTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub query: String,
    pub baby_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub question: String,
    pub answer: String,
    pub category: TipCategory,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// How stretched the parent seems, judged from recent app usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserInteractionType {
    NormalLogging,
    FrequentLogging,
    LateNightActivity,
    MultipleRetries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportMessageType {
    Encouragement,
    Advice,
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationCategory {
    Breathing,
    MuscleRelaxation,
    Mindfulness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInteractionRequest {
    pub interaction_type: UserInteractionType,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressLevelResponse {
    pub level: StressLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportMessage {
    pub id: String,
    pub text: String,
    pub level: StressLevel,
    /// RFC 3339
    pub timestamp: String,
    pub message_type: SupportMessageType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportMessageListResponse {
    pub messages: Vec<SupportMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationTechnique {
    pub name: String,
    pub description: String,
    pub duration_secs: u32,
    pub category: RelaxationCategory,
}

// ---------------------------------------------------------------------------
// Media and analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Photo,
    Video,
}

/// Kind of result stored for a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Emotion,
    Development,
    Health,
    Milestone,
}

/// Kind of analysis requested from the cloud endpoint; also the
/// rate limiter category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisRequestType {
    #[serde(rename = "emotion")]
    Emotion,
    #[serde(rename = "development")]
    Development,
    #[serde(rename = "milestone")]
    MilestoneCheck,
}

impl AnalysisRequestType {
    pub const ALL: [AnalysisRequestType; 3] = [
        AnalysisRequestType::Emotion,
        AnalysisRequestType::Development,
        AnalysisRequestType::MilestoneCheck,
    ];

    /// Value sent as `analysis_type` on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisRequestType::Emotion => "emotion",
            AnalysisRequestType::Development => "development",
            AnalysisRequestType::MilestoneCheck => "milestone",
        }
    }

    /// Result type recorded for a completed request
    pub fn result_type(&self) -> AnalysisType {
        match self {
            AnalysisRequestType::Emotion => AnalysisType::Emotion,
            AnalysisRequestType::Development => AnalysisType::Development,
            AnalysisRequestType::MilestoneCheck => AnalysisType::Milestone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub media_id: String,
    pub analysis_type: AnalysisType,
    pub result: String,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub development_scores: BTreeMap<String, f64>,
    pub emotion_tags: Vec<String>,
    pub analyzed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub baby_id: String,
    pub media_type: MediaType,
    pub file_name: String,
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    pub file_size: u64,
    pub duration_secs: Option<f64>,
    pub created_at: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub is_favorite: bool,
    pub analysis_results: Vec<AnalysisResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePhotoRequest {
    pub baby_id: String,
    /// Base64-encoded JPEG bytes
    pub data_base64: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveVideoRequest {
    pub baby_id: String,
    /// Path of an existing video file to import
    pub source_path: String,
    pub duration_secs: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaListResponse {
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStatisticsResponse {
    pub photo_count: usize,
    pub video_count: usize,
    pub total_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRequest {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub media_id: String,
    pub analysis_type: AnalysisRequestType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub hourly_remaining: u32,
    pub daily_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisListResponse {
    pub results: Vec<AnalysisResult>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Process-wide configuration aggregate persisted as a single blob
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub sync: SyncSettings,
    pub display: DisplaySettings,
    pub ai: AiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub feeding_reminders: bool,
    pub sleep_reminders: bool,
    pub medicine_reminders: bool,
    pub milestone_alerts: bool,
    pub quiet_hours: Option<QuietHours>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            feeding_reminders: true,
            sleep_reminders: true,
            medicine_reminders: true,
            milestone_alerts: true,
            quiet_hours: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub app_lock_enabled: bool,
    pub biometric_enabled: bool,
    /// Seconds of inactivity before locking
    pub auto_lock_timeout_secs: f64,
    pub share_analytics: bool,
    pub share_with_family: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            app_lock_enabled: false,
            biometric_enabled: false,
            auto_lock_timeout_secs: 300.0,
            share_analytics: false,
            share_with_family: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub icloud_enabled: bool,
    pub dropbox_enabled: bool,
    pub auto_sync: bool,
    pub sync_on_wifi_only: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            icloud_enabled: true,
            dropbox_enabled: false,
            auto_sync: true,
            sync_on_wifi_only: true,
            last_sync_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppTheme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub theme: AppTheme,
    pub language: String,
    pub date_format: String,
    pub time_format: String,
    pub units: UnitSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            theme: AppTheme::System,
            language: "zh-Hant".to_string(),
            date_format: "yyyy/MM/dd".to_string(),
            time_format: "HH:mm".to_string(),
            units: UnitSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Kg,
    Lb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightUnit {
    Cm,
    Inch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    Ml,
    Oz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    pub weight: WeightUnit,
    pub height: HeightUnit,
    pub temperature: TemperatureUnit,
    pub volume: VolumeUnit,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            weight: WeightUnit::Kg,
            height: HeightUnit::Cm,
            temperature: TemperatureUnit::Celsius,
            volume: VolumeUnit::Ml,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub analysis_enabled: bool,
    pub auto_analysis: bool,
    pub analysis_quota: i32,
    pub used_quota: i32,
    pub quota_reset_date: DateTime<Utc>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            analysis_enabled: true,
            auto_analysis: false,
            analysis_quota: 30,
            used_quota: 0,
            quota_reset_date: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsValidationResponse {
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableAnalysisResponse {
    pub available: i32,
    pub used: i32,
    pub quota: i32,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// When a local notification fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Fires after `seconds`, optionally repeating
    Interval { seconds: f64, repeats: bool },
    /// Fires at a wall-clock time; weekday 1 = Sunday .. 7 = Saturday
    Calendar {
        hour: u32,
        minute: u32,
        weekday: Option<u32>,
        repeats: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub category: String,
    pub title: String,
    pub body: String,
    pub trigger: NotificationTrigger,
    #[serde(default)]
    pub user_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotificationsResponse {
    pub notifications: Vec<NotificationRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalReminderRequest {
    pub baby_id: String,
    pub interval_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReminderRequest {
    pub baby_id: String,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineReminderRequest {
    pub baby_id: String,
    pub medicine_name: String,
    pub hour: u32,
    pub minute: u32,
    #[serde(default)]
    pub repeat_days: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneCheckRequest {
    pub baby_id: String,
    pub age_in_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationActionRequest {
    pub action_identifier: String,
    pub request_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationActionResponse {
    pub handled: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Social sharing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Twitter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostPrivacy {
    Everyone,
    #[default]
    Friends,
    OnlyMe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Publishing,
    Published,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub content: String,
    pub media_paths: Vec<String>,
    pub privacy: PostPrivacy,
    pub published_at: DateTime<Utc>,
    pub platform: SocialPlatform,
    pub status: PostStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPostRequest {
    pub content: String,
    #[serde(default)]
    pub media_ids: Vec<String>,
    #[serde(default)]
    pub privacy: PostPrivacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPostResponse {
    pub post_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialStatusResponse {
    pub connected: bool,
    pub user: Option<SocialUser>,
    pub posts: Vec<SocialPost>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_details_tagged_by_type() {
        let details = ActivityDetails::Feeding(FeedingDetails {
            feeding_type: FeedingType::Bottle,
            amount: Some(120.0),
            unit: "ml".to_string(),
            side: None,
            duration_secs: None,
        });

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["type"], "feeding");
        assert_eq!(json["feeding_type"], "bottle");
        assert_eq!(json["amount"], 120.0);
        assert_eq!(details.activity_type(), ActivityType::Feeding);
    }

    #[test]
    fn test_feeding_unit_defaults_to_ml() {
        let json = r#"{"type":"feeding","feeding_type":"breast","amount":null,"side":"left","duration_secs":600}"#;
        let details: ActivityDetails = serde_json::from_str(json).unwrap();
        match details {
            ActivityDetails::Feeding(f) => {
                assert_eq!(f.unit, "ml");
                assert_eq!(f.side, Some(BreastSide::Left));
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_activity_type_from_str() {
        assert_eq!("sleep".parse::<ActivityType>().unwrap(), ActivityType::Sleep);
        assert!("nap".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_analysis_request_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&AnalysisRequestType::MilestoneCheck).unwrap(),
            "\"milestone\""
        );
        assert_eq!(AnalysisRequestType::MilestoneCheck.result_type(), AnalysisType::Milestone);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = AppSettings::default();
        assert!(settings.notifications.enabled);
        assert_eq!(settings.privacy.auto_lock_timeout_secs, 300.0);
        assert_eq!(settings.display.language, "zh-Hant");
        assert_eq!(settings.ai.analysis_quota, 30);
        assert_eq!(settings.ai.used_quota, 0);
    }

    #[test]
    fn test_partial_settings_blob_fills_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"ai":{"analysis_quota":10}}"#).unwrap();
        assert_eq!(settings.ai.analysis_quota, 10);
        assert!(settings.ai.analysis_enabled);
        assert_eq!(settings.display.units.volume, VolumeUnit::Ml);
    }
}
