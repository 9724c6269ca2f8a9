//! Shared fixtures for the REST handler tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use shared::AnalysisRequestType;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::domain::analysis_client::AnalysisApi;
use crate::domain::models::analysis::{AnalysisError, AnalysisPayload};
use crate::domain::notification_service::InMemoryNotificationCenter;
use crate::domain::social_service::SimulatedFacebookClient;
use crate::storage::csv::test_utils::RepositoryTestHelper;
use crate::{build_app_state, AppState};

/// Answers every analysis request with the same summary
struct FixedAnalysisApi;

#[async_trait]
impl AnalysisApi for FixedAnalysisApi {
    async fn analyze(
        &self,
        _api_key: &str,
        _media: &[u8],
        _format: &str,
        _analysis_type: AnalysisRequestType,
    ) -> Result<AnalysisPayload, AnalysisError> {
        Ok(AnalysisPayload {
            summary: Some("Baby looks content".to_string()),
            confidence: Some(0.85),
            recommendations: vec!["Keep up tummy time".to_string()],
            ..Default::default()
        })
    }
}

pub struct TestApp {
    pub helper: RepositoryTestHelper,
    pub state: AppState,
    pub center: InMemoryNotificationCenter,
}

impl TestApp {
    pub async fn new() -> Self {
        let helper = RepositoryTestHelper::new().unwrap();
        let config = AppConfig {
            api_keys: vec!["test-key".to_string()],
            ..AppConfig::default()
        };
        let center = InMemoryNotificationCenter::new();
        let state = build_app_state(
            Arc::new(helper.env.connection.clone()),
            &config,
            Arc::new(FixedAnalysisApi),
            Arc::new(center.clone()),
            Arc::new(SimulatedFacebookClient),
            "test-device".to_string(),
        );
        state.notification_service.register_categories().await;
        Self { helper, state, center }
    }
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn read_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let image = image::DynamicImage::new_rgb8(8, 8);
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

pub fn png_base64() -> String {
    BASE64.encode(png_bytes())
}
