//! # REST API for Cloud Media Analysis

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use shared::AnalysisRequest;
use tracing::{error, info};

use super::error_response;
use super::mappers::media_mapper::MediaMapper;
use super::mappers::parse_id;
use crate::domain::models::analysis::AnalysisError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(request_analysis))
        .route("/quota", get(quota_status))
        .route("/media/:media_id", get(results_for_media))
        .route("/:id", get(get_result))
}

fn analysis_status(e: &AnalysisError) -> StatusCode {
    match e {
        AnalysisError::AnalysisOptedOut => StatusCode::FORBIDDEN,
        AnalysisError::RateLimitExceeded | AnalysisError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::MediaNotFound => StatusCode::NOT_FOUND,
        AnalysisError::InvalidApiKey
        | AnalysisError::ApiError { .. }
        | AnalysisError::NetworkError(_)
        | AnalysisError::InvalidResponse => StatusCode::BAD_GATEWAY,
        AnalysisError::DataProcessingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn request_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> impl IntoResponse {
    info!("POST /api/analysis - request: {:?}", request);

    let media_id = match parse_id(&request.media_id) {
        Ok(id) => id,
        Err(e) => return error_response("request analysis", e),
    };
    match state
        .analysis_service
        .request_analysis(media_id, request.analysis_type, Utc::now())
        .await
    {
        Ok(result) => (StatusCode::CREATED, Json(MediaMapper::analysis_to_dto(result))).into_response(),
        Err(e) => {
            error!("Analysis request for {} failed: {}", media_id, e);
            (analysis_status(&e), e.to_string()).into_response()
        }
    }
}

pub async fn quota_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/analysis/quota");
    (StatusCode::OK, Json(state.analysis_service.quota_status(Utc::now()))).into_response()
}

pub async fn get_result(State(state): State<AppState>, Path(result_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/analysis/{}", result_id);

    match parse_id(&result_id).and_then(|id| state.analysis_service.get_result(id)) {
        Ok(Some(result)) => (StatusCode::OK, Json(MediaMapper::analysis_to_dto(result))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Analysis result not found").into_response(),
        Err(e) => error_response("get analysis result", e),
    }
}

pub async fn results_for_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/analysis/media/{}", media_id);

    match parse_id(&media_id).and_then(|id| state.analysis_service.results_for_media(id)) {
        Ok(results) => (StatusCode::OK, Json(MediaMapper::to_analysis_list_dto(results))).into_response(),
        Err(e) => error_response("list analysis results", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{png_bytes, read_json, send, TestApp};
    use axum::http::Method;
    use serde_json::json;
    use shared::{AnalysisListResponse, AnalysisResult, QuotaStatus};

    fn app(test_app: &TestApp) -> Router {
        router().with_state(test_app.state.clone())
    }

    #[tokio::test]
    async fn test_request_analysis_and_query_results() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();
        let photo = test_app
            .state
            .media_service
            .save_photo(baby.id, &png_bytes(), None, Utc::now())
            .unwrap();

        let response = send(
            app(&test_app),
            Method::POST,
            "/",
            Some(json!({"media_id": photo.id.to_string(), "analysis_type": "development"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let result: AnalysisResult = read_json(response).await;
        assert_eq!(result.media_id, photo.id.to_string());

        let response = send(app(&test_app), Method::GET, &format!("/media/{}", photo.id), None).await;
        let results: AnalysisListResponse = read_json(response).await;
        assert_eq!(results.results.len(), 1);

        let response = send(app(&test_app), Method::GET, &format!("/{}", result.id), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(app(&test_app), Method::GET, "/quota", None).await;
        let quota: QuotaStatus = read_json(response).await;
        assert_eq!(quota.hourly_remaining, 9);
        assert_eq!(quota.daily_remaining, 29);
    }

    #[tokio::test]
    async fn test_analysis_error_statuses() {
        let test_app = TestApp::new().await;

        let response = send(
            app(&test_app),
            Method::POST,
            "/",
            Some(json!({"media_id": uuid::Uuid::new_v4().to_string(), "analysis_type": "emotion"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        test_app.state.settings_service.enable_analysis(false).unwrap();
        let response = send(
            app(&test_app),
            Method::POST,
            "/",
            Some(json!({"media_id": uuid::Uuid::new_v4().to_string(), "analysis_type": "emotion"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
