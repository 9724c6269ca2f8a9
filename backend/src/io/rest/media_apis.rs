//! # REST API for Photos and Videos

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use shared::{MediaType, SavePhotoRequest, SaveVideoRequest, TagRequest};
use tracing::info;

use super::error_response;
use super::mappers::media_mapper::MediaMapper;
use super::mappers::parse_id;
use crate::domain::commands::media::{MediaQuery, UpdateMediaCommand};
use crate::AppState;

/// Base64 photo bodies are far larger than axum's 2 MB default
const PHOTO_BODY_LIMIT: usize = 25 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    pub baby_id: Option<String>,
    pub q: Option<String>,
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub favorites: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaRequest {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/photos", post(save_photo).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)))
        .route("/videos", post(save_video))
        .route("/reload", post(reload_media))
        .route("/statistics", get(media_statistics))
        .route("/:id", get(get_media).put(update_media).delete(delete_media))
        .route("/:id/tags", post(add_tag))
        .route("/:id/tags/:tag", delete(remove_tag))
        .route("/:id/favorite", post(toggle_favorite))
}

/// List media; `q`, `media_type` and `favorites` narrow the result
pub async fn list_media(State(state): State<AppState>, Query(query): Query<MediaListQuery>) -> impl IntoResponse {
    info!("GET /api/media - query: {:?}", query);

    let result = (|| {
        let baby_id = query.baby_id.as_deref().map(parse_id).transpose()?;
        if query.favorites {
            return state.media_service.favorites(baby_id);
        }
        state.media_service.search_media(&MediaQuery {
            query: query.q.clone().unwrap_or_default(),
            media_type: query.media_type,
            baby_id,
        })
    })();
    match result {
        Ok(items) => (StatusCode::OK, Json(MediaMapper::to_list_dto(items))).into_response(),
        Err(e) => error_response("list media", e),
    }
}

pub async fn save_photo(State(state): State<AppState>, Json(request): Json<SavePhotoRequest>) -> impl IntoResponse {
    info!("POST /api/media/photos - baby: {}", request.baby_id);

    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("save photo", e),
    };
    let bytes = match BASE64.decode(request.data_base64.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid base64 data: {}", e)).into_response(),
    };

    let media_service = state.media_service.clone();
    let description = request.description;
    let result = tokio::task::spawn_blocking(move || {
        media_service.save_photo(baby_id, &bytes, description, Utc::now())
    })
    .await
    .map_err(anyhow::Error::from)
    .and_then(|r| r);
    match result {
        Ok(item) => (StatusCode::CREATED, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("save photo", e),
    }
}

pub async fn save_video(State(state): State<AppState>, Json(request): Json<SaveVideoRequest>) -> impl IntoResponse {
    info!("POST /api/media/videos - request: {:?}", request);

    let baby_id = match parse_id(&request.baby_id) {
        Ok(id) => id,
        Err(e) => return error_response("save video", e),
    };

    let media_service = state.media_service.clone();
    let result = tokio::task::spawn_blocking(move || {
        media_service.save_video(
            baby_id,
            std::path::Path::new(&request.source_path),
            request.duration_secs,
            request.description,
            Utc::now(),
        )
    })
    .await
    .map_err(anyhow::Error::from)
    .and_then(|r| r);
    match result {
        Ok(item) => (StatusCode::CREATED, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("save video", e),
    }
}

/// Rescan the media directories
pub async fn reload_media(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/media/reload");

    match state.media_service.load_media_items().await {
        Ok(items) => (StatusCode::OK, Json(MediaMapper::to_list_dto(items))).into_response(),
        Err(e) => error_response("reload media", e),
    }
}

pub async fn media_statistics(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> impl IntoResponse {
    info!("GET /api/media/statistics - query: {:?}", query);

    let result = query
        .baby_id
        .as_deref()
        .map(parse_id)
        .transpose()
        .and_then(|baby_id| state.media_service.statistics(baby_id));
    match result {
        Ok(statistics) => (StatusCode::OK, Json(MediaMapper::statistics_to_dto(statistics))).into_response(),
        Err(e) => error_response("compute media statistics", e),
    }
}

pub async fn get_media(State(state): State<AppState>, Path(media_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/media/{}", media_id);

    match parse_id(&media_id).and_then(|id| state.media_service.get_media(id)) {
        Ok(Some(item)) => (StatusCode::OK, Json(MediaMapper::to_dto(item))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Media item not found").into_response(),
        Err(e) => error_response("get media", e),
    }
}

pub async fn update_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
    Json(request): Json<UpdateMediaRequest>,
) -> impl IntoResponse {
    info!("PUT /api/media/{} - request: {:?}", media_id, request);

    let command = UpdateMediaCommand {
        description: request.description,
        tags: request.tags,
        is_favorite: request.is_favorite,
    };
    match parse_id(&media_id).and_then(|id| state.media_service.update_media(id, command)) {
        Ok(item) => (StatusCode::OK, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("update media", e),
    }
}

pub async fn delete_media(State(state): State<AppState>, Path(media_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/media/{}", media_id);

    match parse_id(&media_id).and_then(|id| state.media_service.delete_media(id)) {
        Ok(true) => (StatusCode::NO_CONTENT, "").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Media item not found").into_response(),
        Err(e) => error_response("delete media", e),
    }
}

pub async fn add_tag(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
    Json(request): Json<TagRequest>,
) -> impl IntoResponse {
    info!("POST /api/media/{}/tags - tag: {}", media_id, request.tag);

    match parse_id(&media_id).and_then(|id| state.media_service.add_tag(id, &request.tag)) {
        Ok(item) => (StatusCode::OK, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("add tag", e),
    }
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path((media_id, tag)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/media/{}/tags/{}", media_id, tag);

    match parse_id(&media_id).and_then(|id| state.media_service.remove_tag(id, &tag)) {
        Ok(item) => (StatusCode::OK, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("remove tag", e),
    }
}

pub async fn toggle_favorite(State(state): State<AppState>, Path(media_id): Path<String>) -> impl IntoResponse {
    info!("POST /api/media/{}/favorite", media_id);

    match parse_id(&media_id).and_then(|id| state.media_service.toggle_favorite(id)) {
        Ok(item) => (StatusCode::OK, Json(MediaMapper::to_dto(item))).into_response(),
        Err(e) => error_response("toggle favorite", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{png_base64, read_json, send, TestApp};
    use axum::http::Method;
    use serde_json::json;
    use shared::{MediaItem, MediaListResponse, MediaStatisticsResponse};

    fn app(test_app: &TestApp) -> Router {
        router().with_state(test_app.state.clone())
    }

    async fn upload(test_app: &TestApp, baby_id: &str) -> MediaItem {
        let response = send(
            app(test_app),
            Method::POST,
            "/photos",
            Some(json!({"baby_id": baby_id, "data_base64": png_base64(), "description": "Bath time"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    #[tokio::test]
    async fn test_upload_tag_and_search() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();
        let item = upload(&test_app, &baby.id.to_string()).await;
        assert_eq!(item.media_type, MediaType::Photo);
        assert!(item.thumbnail_path.is_some());

        let response = send(app(&test_app), Method::POST, &format!("/{}/tags", item.id), Some(json!({"tag": "smile"}))).await;
        let tagged: MediaItem = read_json(response).await;
        assert_eq!(tagged.tags, vec!["smile".to_string()]);

        let response = send(app(&test_app), Method::GET, "/?q=SMILE", None).await;
        let found: MediaListResponse = read_json(response).await;
        assert_eq!(found.items.len(), 1);

        let response = send(app(&test_app), Method::DELETE, &format!("/{}/tags/smile", item.id), None).await;
        let untagged: MediaItem = read_json(response).await;
        assert!(untagged.tags.is_empty());
    }

    #[tokio::test]
    async fn test_favorites_statistics_and_delete() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();
        let item = upload(&test_app, &baby.id.to_string()).await;

        send(app(&test_app), Method::POST, &format!("/{}/favorite", item.id), None).await;
        let response = send(app(&test_app), Method::GET, "/?favorites=true", None).await;
        let favorites: MediaListResponse = read_json(response).await;
        assert_eq!(favorites.items.len(), 1);

        let response = send(app(&test_app), Method::GET, &format!("/statistics?baby_id={}", baby.id), None).await;
        let statistics: MediaStatisticsResponse = read_json(response).await;
        assert_eq!(statistics.photo_count, 1);
        assert_eq!(statistics.video_count, 0);

        let response = send(app(&test_app), Method::DELETE, &format!("/{}", item.id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(app(&test_app), Method::GET, &format!("/{}", item.id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_photo_upload_larger_than_two_megabytes() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();

        let mut state: u32 = 0x2545_f491;
        let image = image::RgbImage::from_fn(1000, 800, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            image::Rgb([r, g, b])
        });
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert!(png.len() > 2 * 1024 * 1024);

        let response = send(
            app(&test_app),
            Method::POST,
            "/photos",
            Some(json!({"baby_id": baby.id.to_string(), "data_base64": BASE64.encode(&png), "description": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let item: MediaItem = read_json(response).await;
        assert_eq!(item.media_type, MediaType::Photo);
    }

    #[tokio::test]
    async fn test_video_import() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();
        let source = test_app.helper.env.base_path.join("first_steps.mov");
        std::fs::write(&source, vec![7u8; 128]).unwrap();

        let response = send(
            app(&test_app),
            Method::POST,
            "/videos",
            Some(json!({"baby_id": baby.id.to_string(), "source_path": source.display().to_string(),
                        "duration_secs": 4.5, "description": "First steps"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let item: MediaItem = read_json(response).await;
        assert_eq!(item.media_type, MediaType::Video);
        assert_eq!(item.file_size, 128);
        assert!(item.thumbnail_path.is_none());
    }

    #[tokio::test]
    async fn test_invalid_uploads() {
        let test_app = TestApp::new().await;
        let baby = test_app.helper.create_test_baby("Noa").unwrap();

        let response = send(
            app(&test_app),
            Method::POST,
            "/photos",
            Some(json!({"baby_id": baby.id.to_string(), "data_base64": BASE64.encode(b"not an image"), "description": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            app(&test_app),
            Method::POST,
            "/videos",
            Some(json!({"baby_id": baby.id.to_string(), "source_path": "/no/such/video.mov",
                        "duration_secs": 3.0, "description": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(app(&test_app), Method::POST, &format!("/{}/favorite", uuid::Uuid::new_v4()), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
