//! # REST API for Social Sharing

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use shared::{PublishPostRequest, PublishPostResponse, SocialStatusResponse};
use tracing::{error, info};
use uuid::Uuid;

use super::error_response;
use super::mappers::parse_id;
use crate::domain::social_service::SocialError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/posts", post(publish_post))
}

fn social_error(action: &str, e: SocialError) -> Response {
    error!("Failed to {}: {}", action, e);
    let status = match e {
        SocialError::NotConnected => StatusCode::UNAUTHORIZED,
        SocialError::InvalidContent => StatusCode::BAD_REQUEST,
        SocialError::MediaNotFound(_) => StatusCode::NOT_FOUND,
        SocialError::PublishFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string()).into_response()
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/social");
    let response = SocialStatusResponse {
        connected: state.social_service.is_connected(),
        user: state.social_service.current_user(),
        posts: state.social_service.posts(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/social/connect");
    match state.social_service.connect().await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => social_error("connect social account", e),
    }
}

pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/social/disconnect");
    state.social_service.disconnect();
    StatusCode::NO_CONTENT.into_response()
}

pub async fn publish_post(
    State(state): State<AppState>,
    Json(request): Json<PublishPostRequest>,
) -> impl IntoResponse {
    info!("POST /api/social/posts - {} media items", request.media_ids.len());

    let media_ids: Vec<Uuid> = match request.media_ids.iter().map(|id| parse_id(id)).collect() {
        Ok(ids) => ids,
        Err(e) => return error_response("publish post", e),
    };

    match state
        .social_service
        .publish_post(&request.content, &media_ids, request.privacy)
        .await
    {
        Ok(post_id) => (StatusCode::CREATED, Json(PublishPostResponse { post_id })).into_response(),
        Err(e) => social_error("publish post", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{read_json, send, TestApp};
    use axum::http::Method;
    use serde_json::json;
    use shared::{PostStatus, SocialUser};

    fn app(test_app: &TestApp) -> Router {
        router().with_state(test_app.state.clone())
    }

    #[tokio::test]
    async fn test_publish_requires_connection() {
        let test_app = TestApp::new().await;

        let response = send(app(&test_app), Method::POST, "/posts", Some(json!({"content": "Hello"}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(app(&test_app), Method::POST, "/connect", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let user: SocialUser = read_json(response).await;
        assert_eq!(user.id, "facebook_user_123");

        let response = send(app(&test_app), Method::POST, "/posts", Some(json!({"content": "Hello"}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let published: PublishPostResponse = read_json(response).await;

        let response = send(app(&test_app), Method::GET, "/", None).await;
        let status: SocialStatusResponse = read_json(response).await;
        assert!(status.connected);
        assert_eq!(status.posts.len(), 1);
        assert_eq!(status.posts[0].id, published.post_id);
        assert_eq!(status.posts[0].status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_publish_errors() {
        let test_app = TestApp::new().await;
        send(app(&test_app), Method::POST, "/connect", None).await;

        let response = send(
            app(&test_app),
            Method::POST,
            "/posts",
            Some(json!({"content": "Hi", "media_ids": ["not-a-uuid"]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            app(&test_app),
            Method::POST,
            "/posts",
            Some(json!({"content": "Hi", "media_ids": [Uuid::new_v4().to_string()]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app(&test_app), Method::POST, "/posts", Some(json!({"content": ""}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        send(app(&test_app), Method::POST, "/disconnect", None).await;
        let response = send(app(&test_app), Method::GET, "/", None).await;
        let status: SocialStatusResponse = read_json(response).await;
        assert!(!status.connected);
        assert!(status.user.is_none());
    }
}
