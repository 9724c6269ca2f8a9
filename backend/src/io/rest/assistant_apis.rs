//! # REST API for the Smart Assistant
//!
//! Learned schedules, next-event prediction, advice, parenting tips and
//! support for the parent's wellbeing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use shared::{
    AdviceRequest, AppContext, RecordInteractionRequest, StressLevel, StressLevelResponse,
    SupportMessageListResponse, TipsResponse,
};
use tracing::info;

use super::error_response;
use super::mappers::assistant_mapper::AssistantMapper;
use super::mappers::{parse_date, parse_id};
use crate::domain::emotion_supporter::UserInteraction;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TipsQuery {
    pub context: Option<AppContext>,
}

#[derive(Debug, Deserialize)]
pub struct SupportQuery {
    /// Defaults to the currently detected level
    pub level: Option<StressLevel>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advice", post(get_advice))
        .route("/tips", get(get_tips))
        .route("/interactions", post(record_interaction))
        .route("/stress", get(get_stress_level))
        .route("/support", get(list_support_messages).post(provide_support_message))
        .route("/relaxation", get(suggest_relaxation))
        .route("/:baby_id/learn", post(learn_patterns))
        .route("/:baby_id/schedule", get(get_schedule))
        .route("/:baby_id/next-event", get(get_next_event))
}

/// Relearn patterns from the stored history and return today's schedule
pub async fn learn_patterns(
    State(state): State<AppState>,
    Path(baby_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/assistant/{}/learn", baby_id);

    let result = parse_id(&baby_id).and_then(|id| {
        state.assistant_service.learn_baby_patterns(id)?;
        Ok(state
            .assistant_service
            .generate_schedule_suggestions(id, Local::now().date_naive()))
    });
    match result {
        Ok(suggestions) => (StatusCode::OK, Json(AssistantMapper::to_schedule_dto(suggestions))).into_response(),
        Err(e) => error_response("learn patterns", e),
    }
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(baby_id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> impl IntoResponse {
    info!("GET /api/assistant/{}/schedule - query: {:?}", baby_id, query);

    let result = parse_id(&baby_id).and_then(|id| {
        let date = match query.date.as_deref() {
            Some(date) => parse_date(date)?,
            None => Local::now().date_naive(),
        };
        Ok(state.assistant_service.generate_schedule_suggestions(id, date))
    });
    match result {
        Ok(suggestions) => (StatusCode::OK, Json(AssistantMapper::to_schedule_dto(suggestions))).into_response(),
        Err(e) => error_response("generate schedule", e),
    }
}

pub async fn get_next_event(
    State(state): State<AppState>,
    Path(baby_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/assistant/{}/next-event", baby_id);

    match parse_id(&baby_id) {
        Ok(id) => {
            let event = state.assistant_service.next_predicted_event(id, Local::now());
            (StatusCode::OK, Json(AssistantMapper::to_next_event_dto(event))).into_response()
        }
        Err(e) => error_response("predict next event", e),
    }
}

pub async fn get_advice(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequest>,
) -> impl IntoResponse {
    info!("POST /api/assistant/advice - request: {:?}", request);

    if request.query.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Question cannot be empty").into_response();
    }
    let advice = state.assistant_service.get_advice(&request.query);
    (StatusCode::OK, Json(AssistantMapper::to_advice_dto(advice))).into_response()
}

/// Daily tips, or the tips for one screen when `context` is given
pub async fn get_tips(State(state): State<AppState>, Query(query): Query<TipsQuery>) -> impl IntoResponse {
    info!("GET /api/assistant/tips - query: {:?}", query);

    let tips = match query.context {
        Some(context) => state.assistant_service.contextual_tips(context),
        None => state.assistant_service.daily_tips(),
    };
    (StatusCode::OK, Json(TipsResponse { tips })).into_response()
}

pub async fn record_interaction(
    State(state): State<AppState>,
    Json(request): Json<RecordInteractionRequest>,
) -> impl IntoResponse {
    info!("POST /api/assistant/interactions - request: {:?}", request);

    state.assistant_service.record_user_interaction(UserInteraction {
        timestamp: Utc::now(),
        interaction_type: request.interaction_type,
        context: request.context,
    });
    let level = state.assistant_service.detect_user_stress_level();
    (StatusCode::CREATED, Json(StressLevelResponse { level })).into_response()
}

pub async fn get_stress_level(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/assistant/stress");

    let level = state.assistant_service.detect_user_stress_level();
    (StatusCode::OK, Json(StressLevelResponse { level })).into_response()
}

/// Hand out an encouragement for `level`, or for the detected level
pub async fn provide_support_message(
    State(state): State<AppState>,
    Query(query): Query<SupportQuery>,
) -> impl IntoResponse {
    info!("POST /api/assistant/support - query: {:?}", query);

    let level = query
        .level
        .unwrap_or_else(|| state.assistant_service.detect_user_stress_level());
    let message = state.assistant_service.provide_support_message(level, Utc::now());
    (StatusCode::CREATED, Json(AssistantMapper::to_support_message_dto(message))).into_response()
}

pub async fn list_support_messages(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/assistant/support");

    let messages = state
        .assistant_service
        .support_messages()
        .into_iter()
        .map(AssistantMapper::to_support_message_dto)
        .collect();
    (StatusCode::OK, Json(SupportMessageListResponse { messages })).into_response()
}

pub async fn suggest_relaxation(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/assistant/relaxation");

    let technique = state.assistant_service.suggest_relaxation_technique();
    (StatusCode::OK, Json(technique)).into_response()
}
