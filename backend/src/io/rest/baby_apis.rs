//! # REST API for Baby Management
//!
//! Endpoints for creating, retrieving, updating, deleting and selecting babies.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error_response;
use super::mappers::baby_mapper::BabyMapper;
use super::mappers::parse_id;
use crate::AppState;
use shared::{BabyResponse, CreateBabyRequest, SetActiveBabyRequest, UpdateBabyRequest};

#[derive(Debug, Deserialize)]
pub struct BabySearchQuery {
    pub q: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_babies).post(create_baby))
        .route("/active", get(get_active_baby).post(set_active_baby))
        .route("/:id", get(get_baby).put(update_baby).delete(delete_baby))
        .route("/:id/age", get(get_baby_age))
        .route("/:id/export", get(export_baby))
}

/// List all babies, or those whose name contains `q`
pub async fn list_babies(
    State(state): State<AppState>,
    Query(query): Query<BabySearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/babies - query: {:?}", query);

    let result = match query.q.as_deref() {
        Some(q) => state.baby_service.search_babies(q),
        None => state.baby_service.list_babies(),
    };
    match result {
        Ok(babies) => (StatusCode::OK, Json(BabyMapper::to_list_dto(babies))).into_response(),
        Err(e) => error_response("list babies", e),
    }
}

pub async fn create_baby(
    State(state): State<AppState>,
    Json(request): Json<CreateBabyRequest>,
) -> impl IntoResponse {
    info!("POST /api/babies - request: {:?}", request);

    let result = BabyMapper::to_create_command(request)
        .and_then(|command| state.baby_service.create_baby(command));
    match result {
        Ok(baby) => {
            let response = BabyResponse {
                success_message: format!("Baby '{}' created successfully", baby.name),
                baby: BabyMapper::to_dto(baby),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response("create baby", e),
    }
}

pub async fn get_baby(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/babies/{}", baby_id);

    match parse_id(&baby_id).and_then(|id| state.baby_service.get_baby(id)) {
        Ok(Some(baby)) => (StatusCode::OK, Json(BabyMapper::to_dto(baby))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Baby not found").into_response(),
        Err(e) => error_response("get baby", e),
    }
}

pub async fn update_baby(
    State(state): State<AppState>,
    Path(baby_id): Path<String>,
    Json(request): Json<UpdateBabyRequest>,
) -> impl IntoResponse {
    info!("PUT /api/babies/{} - request: {:?}", baby_id, request);

    let result = parse_id(&baby_id).and_then(|id| {
        let command = BabyMapper::to_update_command(request)?;
        state.baby_service.update_baby(id, command)
    });
    match result {
        Ok(baby) => {
            let response = BabyResponse {
                success_message: format!("Baby '{}' updated successfully", baby.name),
                baby: BabyMapper::to_dto(baby),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("update baby", e),
    }
}

pub async fn delete_baby(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/babies/{}", baby_id);

    match parse_id(&baby_id).and_then(|id| state.baby_service.delete_baby(id)) {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "success_message": result.success_message,
                "deleted_activities": result.deleted_activities,
            })),
        )
            .into_response(),
        Err(e) => error_response("delete baby", e),
    }
}

pub async fn get_active_baby(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/babies/active");

    match state.baby_service.get_active_baby() {
        Ok(baby) => (StatusCode::OK, Json(BabyMapper::to_active_dto(baby))).into_response(),
        Err(e) => error_response("get active baby", e),
    }
}

pub async fn set_active_baby(
    State(state): State<AppState>,
    Json(request): Json<SetActiveBabyRequest>,
) -> impl IntoResponse {
    info!("POST /api/babies/active - request: {:?}", request);

    match parse_id(&request.baby_id).and_then(|id| state.baby_service.set_active_baby(id)) {
        Ok(baby) => (StatusCode::OK, Json(BabyMapper::to_active_dto(Some(baby)))).into_response(),
        Err(e) => error_response("set active baby", e),
    }
}

pub async fn get_baby_age(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/babies/{}/age", baby_id);

    let today = Local::now().date_naive();
    match parse_id(&baby_id).and_then(|id| state.baby_service.get_age_info(id, today)) {
        Ok(age) => (StatusCode::OK, Json(BabyMapper::to_age_dto(age))).into_response(),
        Err(e) => error_response("get baby age", e),
    }
}

pub async fn export_baby(State(state): State<AppState>, Path(baby_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/babies/{}/export", baby_id);

    match parse_id(&baby_id).and_then(|id| state.baby_service.export_baby(id)) {
        Ok(json) => (StatusCode::OK, [("content-type", "application/json")], json).into_response(),
        Err(e) => error_response("export baby", e),
    }
}
