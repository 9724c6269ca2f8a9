//! # REST API for Application Settings

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use shared::{
    AiSettings, AppSettings, AvailableAnalysisResponse, DisplaySettings, NotificationSettings,
    PrivacySettings, SettingsValidationResponse, SyncSettings, UnitSettings,
};
use tracing::{error, info};

use super::error_response;
use crate::domain::settings_service::SettingsSection;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    /// Reset only this section when given
    pub section: Option<SettingsSection>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(save_settings))
        .route("/notifications", put(update_notifications))
        .route("/privacy", put(update_privacy))
        .route("/sync", put(update_sync))
        .route("/display", put(update_display))
        .route("/units", put(update_units))
        .route("/ai", put(update_ai))
        .route("/reset", post(reset_settings))
        .route("/export", get(export_settings))
        .route("/import", post(import_settings))
        .route("/validate", get(validate_settings))
        .route("/analysis-quota", get(analysis_quota))
}

fn settings_response(action: &str, result: anyhow::Result<AppSettings>) -> axum::response::Response {
    match result {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => error_response(action, e),
    }
}

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings");
    (StatusCode::OK, Json(state.settings_service.get_settings())).into_response()
}

pub async fn save_settings(State(state): State<AppState>, Json(settings): Json<AppSettings>) -> impl IntoResponse {
    info!("PUT /api/settings");
    settings_response("save settings", state.settings_service.save_settings(settings))
}

pub async fn update_notifications(
    State(state): State<AppState>,
    Json(section): Json<NotificationSettings>,
) -> impl IntoResponse {
    info!("PUT /api/settings/notifications - request: {:?}", section);
    settings_response(
        "update notification settings",
        state.settings_service.update_notification_settings(section),
    )
}

pub async fn update_privacy(State(state): State<AppState>, Json(section): Json<PrivacySettings>) -> impl IntoResponse {
    info!("PUT /api/settings/privacy - request: {:?}", section);
    settings_response("update privacy settings", state.settings_service.update_privacy_settings(section))
}

pub async fn update_sync(State(state): State<AppState>, Json(section): Json<SyncSettings>) -> impl IntoResponse {
    info!("PUT /api/settings/sync - request: {:?}", section);
    settings_response("update sync settings", state.settings_service.update_sync_settings(section))
}

pub async fn update_display(State(state): State<AppState>, Json(section): Json<DisplaySettings>) -> impl IntoResponse {
    info!("PUT /api/settings/display - request: {:?}", section);
    settings_response("update display settings", state.settings_service.update_display_settings(section))
}

pub async fn update_units(State(state): State<AppState>, Json(section): Json<UnitSettings>) -> impl IntoResponse {
    info!("PUT /api/settings/units - request: {:?}", section);
    settings_response("update unit settings", state.settings_service.update_unit_settings(section))
}

pub async fn update_ai(State(state): State<AppState>, Json(section): Json<AiSettings>) -> impl IntoResponse {
    info!("PUT /api/settings/ai - request: {:?}", section);
    settings_response("update AI settings", state.settings_service.update_ai_settings(section))
}

pub async fn reset_settings(State(state): State<AppState>, Query(query): Query<ResetQuery>) -> impl IntoResponse {
    info!("POST /api/settings/reset - query: {:?}", query);
    let result = match query.section {
        Some(section) => state.settings_service.reset_section(section),
        None => state.settings_service.reset_to_defaults(),
    };
    settings_response("reset settings", result)
}

pub async fn export_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/export");
    match state.settings_service.export_settings() {
        Ok(json) => (StatusCode::OK, [("content-type", "application/json")], json).into_response(),
        Err(e) => error_response("export settings", e),
    }
}

/// Body is a document produced by `/export`
pub async fn import_settings(State(state): State<AppState>, body: String) -> impl IntoResponse {
    info!("POST /api/settings/import ({} bytes)", body.len());
    match state.settings_service.import_settings(&body) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            error!("Failed to import settings: {:#}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

pub async fn validate_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/validate");
    let warnings = state.settings_service.validate_settings();
    (StatusCode::OK, Json(SettingsValidationResponse { warnings })).into_response()
}

/// Settings usage counter, reset first if the calendar day changed
pub async fn analysis_quota(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/analysis-quota");
    if let Err(e) = state.settings_service.check_quota_reset_now() {
        return error_response("reset analysis quota", e);
    }
    let ai = state.settings_service.get_settings().ai;
    let response = AvailableAnalysisResponse {
        available: state.settings_service.available_analysis_count(),
        used: ai.used_quota,
        quota: ai.analysis_quota,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{read_json, read_text, send, TestApp};
    use axum::http::Method;
    use serde_json::json;

    fn app(test_app: &TestApp) -> Router {
        router().with_state(test_app.state.clone())
    }

    #[tokio::test]
    async fn test_update_section_and_validate() {
        let test_app = TestApp::new().await;

        let mut privacy = PrivacySettings::default();
        privacy.auto_lock_timeout_secs = 30.0;
        let response = send(
            app(&test_app),
            Method::PUT,
            "/privacy",
            Some(serde_json::to_value(&privacy).unwrap()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let settings: AppSettings = read_json(response).await;
        assert_eq!(settings.privacy.auto_lock_timeout_secs, 30.0);

        let response = send(app(&test_app), Method::GET, "/validate", None).await;
        let validation: SettingsValidationResponse = read_json(response).await;
        assert_eq!(validation.warnings.len(), 1);

        let response = send(app(&test_app), Method::POST, "/reset?section=privacy", None).await;
        let settings: AppSettings = read_json(response).await;
        assert_eq!(settings.privacy.auto_lock_timeout_secs, 300.0);
    }

    #[tokio::test]
    async fn test_export_import_round_trip_and_bad_import() {
        let test_app = TestApp::new().await;
        test_app.state.settings_service.set_language("en").unwrap();

        let response = send(app(&test_app), Method::GET, "/export", None).await;
        let exported = read_text(response).await;
        test_app.state.settings_service.reset_to_defaults().unwrap();

        let response = send(app(&test_app), Method::POST, "/import", Some(serde_json::from_str(&exported).unwrap())).await;
        let settings: AppSettings = read_json(response).await;
        assert_eq!(settings.display.language, "en");

        let response = send(app(&test_app), Method::POST, "/import", Some(json!([1, 2, 3]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test_app.state.settings_service.get_settings().display.language, "en");
    }

    #[tokio::test]
    async fn test_analysis_quota_counts_usage() {
        let test_app = TestApp::new().await;
        test_app.state.settings_service.increment_used_quota(chrono::Local::now()).unwrap();

        let response = send(app(&test_app), Method::GET, "/analysis-quota", None).await;
        let quota: AvailableAnalysisResponse = read_json(response).await;
        assert_eq!(quota.used, 1);
        assert_eq!(quota.available, 29);
        assert_eq!(quota.quota, 30);
    }
}
