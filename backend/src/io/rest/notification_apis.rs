//! # REST API for Local Reminders
//!
//! Scheduling and cancelling reminders, plus notification action routing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use shared::{
    IntervalReminderRequest, MedicineReminderRequest, MilestoneCheckRequest, NotificationActionRequest,
    NotificationActionResponse, PendingNotificationsResponse, SleepReminderRequest,
};
use tracing::{error, info};

use super::error_response;
use super::mappers::parse_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SmartSuggestionRequest {
    pub title: String,
    pub body: String,
    pub delay_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BadgeRequest {
    pub count: u32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending).delete(remove_all_pending))
        .route("/feeding", post(schedule_feeding))
        .route("/feeding/:baby_id", delete(cancel_feeding))
        .route("/sleep", post(schedule_sleep))
        .route("/sleep/:baby_id", delete(cancel_sleep))
        .route("/diaper", post(schedule_diaper))
        .route("/diaper/:baby_id", delete(cancel_diaper))
        .route("/medicine", post(schedule_medicine))
        .route("/medicine/:baby_id/:medicine_name", delete(cancel_medicine))
        .route("/milestone", post(schedule_milestone))
        .route("/suggestion", post(schedule_suggestion))
        .route("/action", post(handle_action))
        .route("/badge", put(set_badge).delete(clear_badge))
}

/// Scheduled identifiers; an empty list means the reminder kind is switched off
fn scheduled(action: &str, result: anyhow::Result<Vec<String>>) -> Response {
    match result {
        Ok(identifiers) => (StatusCode::OK, Json(json!({ "identifiers": identifiers }))).into_response(),
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

pub async fn pending(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/notifications/pending");
    let notifications = state.notification_service.pending().await;
    (StatusCode::OK, Json(PendingNotificationsResponse { notifications })).into_response()
}

pub async fn remove_all_pending(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/notifications/pending");
    state.notification_service.remove_all_pending().await;
    StatusCode::NO_CONTENT.into_response()
}

pub async fn schedule_feeding(
    State(state): State<AppState>,
    Json(request): Json<IntervalReminderRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/feeding - request: {:?}", request);
    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("schedule feeding reminder", e),
    };
    scheduled(
        "schedule feeding reminder",
        state
            .notification_service
            .schedule_feeding_reminder(baby_id, request.interval_secs)
            .await,
    )
}

pub async fn cancel_feeding(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/notifications/feeding/{}", baby_id);
    match parse_id(&baby_id) {
        Ok(id) => {
            state.notification_service.cancel_feeding_reminder(id).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("cancel feeding reminder", e),
    }
}

pub async fn schedule_sleep(
    State(state): State<AppState>,
    Json(request): Json<SleepReminderRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/sleep - request: {:?}", request);
    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("schedule sleep reminder", e),
    };
    scheduled(
        "schedule sleep reminder",
        state
            .notification_service
            .schedule_sleep_reminder(baby_id, request.hour, request.minute)
            .await,
    )
}

pub async fn cancel_sleep(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/notifications/sleep/{}", baby_id);
    match parse_id(&baby_id) {
        Ok(id) => {
            state.notification_service.cancel_sleep_reminder(id).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("cancel sleep reminder", e),
    }
}

pub async fn schedule_diaper(
    State(state): State<AppState>,
    Json(request): Json<IntervalReminderRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/diaper - request: {:?}", request);
    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("schedule diaper reminder", e),
    };
    scheduled(
        "schedule diaper reminder",
        state
            .notification_service
            .schedule_diaper_reminder(baby_id, request.interval_secs)
            .await,
    )
}

pub async fn cancel_diaper(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/notifications/diaper/{}", baby_id);
    match parse_id(&baby_id) {
        Ok(id) => {
            state.notification_service.cancel_diaper_reminder(id).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("cancel diaper reminder", e),
    }
}

pub async fn schedule_medicine(
    State(state): State<AppState>,
    Json(request): Json<MedicineReminderRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/medicine - request: {:?}", request);
    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("schedule medicine reminder", e),
    };
    scheduled(
        "schedule medicine reminder",
        state
            .notification_service
            .schedule_medicine_reminder(
                baby_id,
                &request.medicine_name,
                request.hour,
                request.minute,
                &request.repeat_days,
            )
            .await,
    )
}

pub async fn cancel_medicine(
    State(state): State<AppState>,
    Path((baby_id, medicine_name)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/notifications/medicine/{}/{}", baby_id, medicine_name);
    match parse_id(&baby_id) {
        Ok(id) => {
            state
                .notification_service
                .cancel_medicine_reminder(id, &medicine_name)
                .await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("cancel medicine reminder", e),
    }
}

pub async fn schedule_milestone(
    State(state): State<AppState>,
    Json(request): Json<MilestoneCheckRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/milestone - request: {:?}", request);
    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("schedule milestone check", e),
    };
    scheduled(
        "schedule milestone check",
        state
            .notification_service
            .schedule_milestone_check(baby_id, request.age_in_months)
            .await,
    )
}

pub async fn schedule_suggestion(
    State(state): State<AppState>,
    Json(request): Json<SmartSuggestionRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/suggestion - request: {:?}", request);
    scheduled(
        "schedule smart suggestion",
        state
            .notification_service
            .schedule_smart_suggestion(&request.title, &request.body, request.delay_secs)
            .await,
    )
}

pub async fn handle_action(
    State(state): State<AppState>,
    Json(request): Json<NotificationActionRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/action - request: {:?}", request);
    let response = match state
        .notification_service
        .handle_action(&request.action_identifier, &request.request_identifier)
    {
        Some(message) => NotificationActionResponse { handled: true, message: message.to_string() },
        None => NotificationActionResponse {
            handled: false,
            message: format!("Unknown action: {}", request.action_identifier),
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn set_badge(State(state): State<AppState>, Json(request): Json<BadgeRequest>) -> impl IntoResponse {
    info!("PUT /api/notifications/badge - count: {}", request.count);
    state.notification_service.update_badge_count(request.count).await;
    StatusCode::NO_CONTENT.into_response()
}

pub async fn clear_badge(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/notifications/badge");
    state.notification_service.clear_badge().await;
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{read_json, send, TestApp};
    use axum::http::Method;
    use serde_json::Value;

    fn app(test_app: &TestApp) -> Router {
        router().with_state(test_app.state.clone())
    }

    #[tokio::test]
    async fn test_schedule_and_cancel_medicine() {
        let test_app = TestApp::new().await;
        let baby_id = uuid::Uuid::new_v4().to_string();

        let response = send(
            app(&test_app),
            Method::POST,
            "/medicine",
            Some(json!({"baby_id": baby_id, "medicine_name": "VitaminD", "hour": 9, "minute": 0,
                        "repeat_days": [2, 4, 6]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["identifiers"].as_array().unwrap().len(), 3);

        let response = send(app(&test_app), Method::GET, "/pending", None).await;
        let pending: PendingNotificationsResponse = read_json(response).await;
        assert_eq!(pending.notifications.len(), 3);

        let response = send(app(&test_app), Method::DELETE, &format!("/medicine/{}/VitaminD", baby_id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(test_app.state.notification_service.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_trigger_and_disabled_reminders() {
        let test_app = TestApp::new().await;
        let baby_id = uuid::Uuid::new_v4().to_string();

        let response = send(
            app(&test_app),
            Method::POST,
            "/sleep",
            Some(json!({"baby_id": baby_id, "hour": 25, "minute": 0})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        test_app.state.settings_service.enable_notifications(false).unwrap();
        let response = send(
            app(&test_app),
            Method::POST,
            "/feeding",
            Some(json!({"baby_id": baby_id, "interval_secs": 10800.0})),
        )
        .await;
        let body: Value = read_json(response).await;
        assert!(body["identifiers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_action_routing_and_badge() {
        let test_app = TestApp::new().await;

        let response = send(
            app(&test_app),
            Method::POST,
            "/action",
            Some(json!({"action_identifier": "FEEDING_DONE", "request_identifier": "feeding_reminder_x"})),
        )
        .await;
        let handled: NotificationActionResponse = read_json(response).await;
        assert!(handled.handled);

        let response = send(
            app(&test_app),
            Method::POST,
            "/action",
            Some(json!({"action_identifier": "SNOOZE", "request_identifier": "x"})),
        )
        .await;
        let unknown: NotificationActionResponse = read_json(response).await;
        assert!(!unknown.handled);

        send(app(&test_app), Method::PUT, "/badge", Some(json!({"count": 4}))).await;
        assert_eq!(test_app.center.badge_count(), 4);
        send(app(&test_app), Method::DELETE, "/badge", None).await;
        assert_eq!(test_app.center.badge_count(), 0);
    }
}
