//! # Domain Module
//!
//! Business logic of the baby tracker, independent of the REST layer and of
//! how data is stored.
//!
//! ## Module Organization
//!
//! - **baby_service**: Baby profiles, active baby selection and age info
//! - **activity_service**: Activity log, summaries, statistics and suggestions
//! - **pattern_learner** / **assistant_service**: Learned daily rhythms,
//!   schedule suggestions, advice and tips
//! - **emotion_supporter**: Parent stress level, encouragement and relaxation
//! - **media_service**: Photos, videos, thumbnails and media metadata
//! - **analysis_client** / **analysis_service**: Cloud media analysis gated by
//!   the opt-in flag and the **rate_limiter**
//! - **settings_service**: Persisted application settings
//! - **notification_service**: Local reminder scheduling
//! - **social_service**: Sharing posts to a social account
//! - **events**: Broadcast of store mutations
//!
//! ## Business Rules
//!
//! - A baby's name is required and its birth date lies within the last ten years
//! - An activity's end time is never before its start time
//! - Analysis runs only for opted-in users with rate limiter headroom

pub mod activity_service;
pub mod analysis_client;
pub mod analysis_service;
pub mod assistant_service;
pub mod baby_service;
pub mod commands;
pub mod emotion_supporter;
pub mod events;
pub mod media_service;
pub mod models;
pub mod notification_service;
pub mod pattern_learner;
pub mod rate_limiter;
pub mod settings_service;
pub mod social_service;

pub use activity_service::ActivityService;
pub use analysis_service::AnalysisService;
pub use assistant_service::AssistantService;
pub use baby_service::BabyService;
pub use media_service::MediaService;
pub use notification_service::NotificationService;
pub use settings_service::SettingsService;
pub use social_service::SocialService;
