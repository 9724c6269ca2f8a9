//! # Baby Tracker Backend
//!
//! Everything that is not UI: profiles and the activity log, the pattern
//! learner, media storage, gated cloud analysis, local reminders and social
//! sharing, exposed over a REST API.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers, mappers)
//!     ↓
//! Domain Layer (services, pattern learner, rate limiter)
//!     ↓
//! Storage Layer (YAML and CSV files under the data directory)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{http::Method, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::analysis_client::{AnalysisApi, ApiKeyManager, HttpAnalysisClient};
use crate::domain::events::EventBus;
use crate::domain::notification_service::{InMemoryNotificationCenter, NotificationCenter};
use crate::domain::pattern_learner::PatternLearner;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::social_service::{SimulatedFacebookClient, SocialPlatformClient};
use crate::domain::{
    ActivityService, AnalysisService, AssistantService, BabyService, MediaService, NotificationService,
    SettingsService, SocialService,
};
use crate::io::rest;
use crate::storage::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub baby_service: BabyService,
    pub activity_service: ActivityService,
    pub assistant_service: AssistantService,
    pub media_service: MediaService,
    pub analysis_service: AnalysisService,
    pub settings_service: SettingsService,
    pub notification_service: NotificationService,
    pub social_service: SocialService,
    pub events: EventBus,
}

/// Wire the services over one data directory and the given outbound clients
pub fn build_app_state(
    csv_conn: Arc<CsvConnection>,
    config: &AppConfig,
    api: Arc<dyn AnalysisApi>,
    center: Arc<dyn NotificationCenter>,
    social_client: Arc<dyn SocialPlatformClient>,
    device_id: String,
) -> AppState {
    let events = EventBus::new();

    let baby_service = BabyService::new(csv_conn.clone(), events.clone());
    let activity_service = ActivityService::new(csv_conn.clone(), events.clone());
    let assistant_service = AssistantService::new(activity_service.clone(), PatternLearner::new());
    let media_service = MediaService::new(csv_conn.clone(), events.clone());
    let settings_service = SettingsService::new(csv_conn.clone(), events.clone());
    let analysis_service = AnalysisService::new(
        csv_conn,
        api,
        ApiKeyManager::new(config.api_keys.clone()),
        device_id,
        RateLimiter::new(config.hourly_limit, config.daily_limit),
        media_service.clone(),
        settings_service.clone(),
        events.clone(),
    );
    let notification_service = NotificationService::new(center, settings_service.clone());
    let social_service = SocialService::new(social_client, media_service.clone());

    AppState {
        baby_service,
        activity_service,
        assistant_service,
        media_service,
        analysis_service,
        settings_service,
        notification_service,
        social_service,
        events,
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    let data_dir = config.resolve_data_dir()?;
    info!("Using data directory {:?}", data_dir);
    let csv_conn = Arc::new(CsvConnection::new(&data_dir)?);

    info!("Setting up analysis client for {}", config.analysis_endpoint);
    let api = Arc::new(HttpAnalysisClient::new(config.analysis_endpoint.clone())?);
    if config.api_keys.is_empty() {
        warn!("No analysis API keys configured; media analysis requests will fail");
    }
    let device_id = config
        .device_id
        .clone()
        .unwrap_or_else(|| data_dir.display().to_string());

    info!("Setting up domain model");
    let app_state = build_app_state(
        csv_conn,
        config,
        api,
        Arc::new(InMemoryNotificationCenter::new()),
        Arc::new(SimulatedFacebookClient),
        device_id,
    );

    app_state.notification_service.register_categories().await;
    match app_state.media_service.load_media_items().await {
        Ok(items) => info!("Loaded {} media items", items.len()),
        Err(e) => warn!("Failed to load media items: {}", e),
    }
    if let Err(e) = app_state.settings_service.check_quota_reset_now() {
        warn!("Failed to check analysis quota reset: {}", e);
    }

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/babies", rest::baby_apis::router())
        .nest("/activities", rest::activity_apis::router())
        .nest("/assistant", rest::assistant_apis::router())
        .nest("/settings", rest::settings_apis::router())
        .nest("/media", rest::media_apis::router())
        .nest("/analysis", rest::analysis_apis::router())
        .nest("/notifications", rest::notification_apis::router())
        .nest("/social", rest::social_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
