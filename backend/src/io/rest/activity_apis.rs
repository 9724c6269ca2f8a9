//! # REST API for the Activity Log
//!
//! Logging, querying and summarising a baby's care activities.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use shared::{
    ActivityResponse, ActivitySuggestionsResponse, ActivityType, CreateActivityRequest,
    StatisticsPeriod, UpdateActivityRequest,
};
use tracing::info;

use super::error_response;
use super::mappers::activity_mapper::ActivityMapper;
use super::mappers::{parse_date, parse_id, parse_timestamp};
use crate::domain::commands::activity::ActivityQuery;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    pub baby_id: String,
    pub activity_type: Option<ActivityType>,
    /// RFC 3339, inclusive
    pub from: Option<String>,
    /// RFC 3339, exclusive
    pub to: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BabyQuery {
    pub baby_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivitySearchQuery {
    pub baby_id: String,
    #[serde(default)]
    pub q: String,
    pub activity_type: Option<ActivityType>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub baby_id: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub baby_id: String,
    pub period: Option<StatisticsPeriod>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities).post(create_activity))
        .route("/today", get(today_activities))
        .route("/search", get(search_activities))
        .route("/summary", get(daily_summary))
        .route("/statistics", get(statistics))
        .route("/suggestions", get(suggestions))
        .route("/export", get(export_activities))
        .route("/:id", get(get_activity).put(update_activity).delete(delete_activity))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Json(request): Json<CreateActivityRequest>,
) -> impl IntoResponse {
    info!("POST /api/activities - request: {:?}", request);

    let result = ActivityMapper::to_create_command(request)
        .and_then(|command| state.activity_service.add_activity(command));
    match result {
        Ok(activity) => {
            let response = ActivityResponse {
                success_message: format!("{} logged", activity.activity_type.display_name()),
                activity: ActivityMapper::to_dto(activity),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response("create activity", e),
    }
}

pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityListQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities - query: {:?}", query);

    let result = (|| {
        let baby_id = parse_id(&query.baby_id)?;
        let domain_query = ActivityQuery {
            activity_type: query.activity_type,
            from: query.from.as_deref().map(parse_timestamp).transpose()?,
            to: query.to.as_deref().map(parse_timestamp).transpose()?,
            limit: query.limit,
        };
        state.activity_service.list_activities(baby_id, &domain_query)
    })();
    match result {
        Ok(activities) => (StatusCode::OK, Json(ActivityMapper::to_list_dto(activities))).into_response(),
        Err(e) => error_response("list activities", e),
    }
}

pub async fn today_activities(
    State(state): State<AppState>,
    Query(query): Query<BabyQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/today - baby: {}", query.baby_id);

    let result = parse_id(&query.baby_id)
        .and_then(|id| state.activity_service.load_today_activities(id, Local::now()));
    match result {
        Ok(activities) => (StatusCode::OK, Json(ActivityMapper::to_list_dto(activities))).into_response(),
        Err(e) => error_response("load today's activities", e),
    }
}

pub async fn search_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivitySearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/search - query: {:?}", query);

    let result = parse_id(&query.baby_id)
        .and_then(|id| state.activity_service.search_activities(id, &query.q, query.activity_type));
    match result {
        Ok(activities) => (StatusCode::OK, Json(ActivityMapper::to_list_dto(activities))).into_response(),
        Err(e) => error_response("search activities", e),
    }
}

pub async fn daily_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/summary - query: {:?}", query);

    let result = (|| {
        let baby_id = parse_id(&query.baby_id)?;
        let date = match query.date.as_deref() {
            Some(date) => parse_date(date)?,
            None => Local::now().date_naive(),
        };
        let counts = state.activity_service.daily_summary(baby_id, date, &Local)?;
        Ok::<_, anyhow::Error>(ActivityMapper::to_summary_dto(date, counts))
    })();
    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("summarise activities", e),
    }
}

pub async fn statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/statistics - query: {:?}", query);

    let period = query.period.unwrap_or(StatisticsPeriod::Week);
    let result = parse_id(&query.baby_id)
        .and_then(|id| state.activity_service.statistics(id, period, Utc::now()));
    match result {
        Ok(statistics) => (StatusCode::OK, Json(ActivityMapper::to_statistics_dto(statistics))).into_response(),
        Err(e) => error_response("compute statistics", e),
    }
}

pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<BabyQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/suggestions - baby: {}", query.baby_id);

    match parse_id(&query.baby_id).and_then(|id| state.activity_service.suggestions(id, Utc::now())) {
        Ok(suggestions) => (StatusCode::OK, Json(ActivitySuggestionsResponse { suggestions })).into_response(),
        Err(e) => error_response("build suggestions", e),
    }
}

pub async fn export_activities(
    State(state): State<AppState>,
    Query(query): Query<BabyQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities/export - baby: {}", query.baby_id);

    match parse_id(&query.baby_id).and_then(|id| state.activity_service.export_activities(id)) {
        Ok(json) => (StatusCode::OK, [("content-type", "application/json")], json).into_response(),
        Err(e) => error_response("export activities", e),
    }
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/activities/{}", activity_id);

    match parse_id(&activity_id).and_then(|id| state.activity_service.get_activity(id)) {
        Ok(Some(activity)) => (StatusCode::OK, Json(ActivityMapper::to_dto(activity))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Activity not found").into_response(),
        Err(e) => error_response("get activity", e),
    }
}

pub async fn update_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
    Json(request): Json<UpdateActivityRequest>,
) -> impl IntoResponse {
    info!("PUT /api/activities/{} - request: {:?}", activity_id, request);

    let result = parse_id(&activity_id).and_then(|id| {
        let command = ActivityMapper::to_update_command(request)?;
        state.activity_service.update_activity(id, command)
    });
    match result {
        Ok(activity) => {
            let response = ActivityResponse {
                success_message: "Activity updated successfully".to_string(),
                activity: ActivityMapper::to_dto(activity),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("update activity", e),
    }
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/activities/{}", activity_id);

    match parse_id(&activity_id).and_then(|id| state.activity_service.delete_activity(id)) {
        Ok(true) => (StatusCode::NO_CONTENT, "").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Activity not found").into_response(),
        Err(e) => error_response("delete activity", e),
    }
}
