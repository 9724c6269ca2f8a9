//! Outbound client for the cloud media analysis endpoint, plus the API key
//! pool it authenticates with.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::Serialize;
use shared::AnalysisRequestType;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::analysis::{AnalysisError, AnalysisPayload};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cloud analysis of one anonymized media payload
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn analyze(
        &self,
        api_key: &str,
        media: &[u8],
        format: &str,
        analysis_type: AnalysisRequestType,
    ) -> Result<AnalysisPayload, AnalysisError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    request_id: String,
    analysis_type: &'a str,
    anonymized_media: AnonymizedMedia<'a>,
}

#[derive(Serialize)]
struct AnonymizedMedia<'a> {
    format: &'a str,
    data: String,
}

pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build analysis HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisClient {
    async fn analyze(
        &self,
        api_key: &str,
        media: &[u8],
        format: &str,
        analysis_type: AnalysisRequestType,
    ) -> Result<AnalysisPayload, AnalysisError> {
        let body = AnalyzeRequest {
            request_id: Uuid::new_v4().to_string(),
            analysis_type: analysis_type.as_str(),
            anonymized_media: AnonymizedMedia {
                format,
                data: BASE64.encode(media),
            },
        };
        debug!(
            "POST {} ({}, {} bytes)",
            self.endpoint,
            analysis_type.as_str(),
            media.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Analysis endpoint returned {}", status);
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AnalysisError::QuotaExceeded,
                StatusCode::UNAUTHORIZED => AnalysisError::InvalidApiKey,
                other => AnalysisError::ApiError {
                    code: other.as_u16().to_string(),
                    message: "API request failed".to_string(),
                },
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|_| AnalysisError::InvalidResponse)?;
        parse_response(json)
    }
}

/// Interpret a 200 response body: `{error:{code,message}}` or `{results:{..}}`
fn parse_response(json: serde_json::Value) -> Result<AnalysisPayload, AnalysisError> {
    if !json.is_object() {
        return Err(AnalysisError::InvalidResponse);
    }

    if let Some(error) = json.get("error") {
        if let (Some(code), Some(message)) = (
            error.get("code").and_then(|c| c.as_str()),
            error.get("message").and_then(|m| m.as_str()),
        ) {
            return Err(AnalysisError::ApiError {
                code: code.to_string(),
                message: message.to_string(),
            });
        }
    }

    match json.get("results") {
        Some(results) => {
            serde_json::from_value(results.clone()).map_err(|_| AnalysisError::InvalidResponse)
        }
        None => Ok(AnalysisPayload::default()),
    }
}

/// Pool of API keys. Each device starts at a fixed slot derived from its id;
/// keys reported as failed are skipped while a healthy one remains.
#[derive(Clone)]
pub struct ApiKeyManager {
    keys: Vec<String>,
    failed: Arc<Mutex<HashSet<String>>>,
}

impl ApiKeyManager {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            failed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// `None` only when the pool is empty
    pub fn key_for(&self, device_id: &str) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let start = (stable_hash(device_id) % self.keys.len() as u64) as usize;
        let failed = self.failed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        (0..self.keys.len())
            .map(|offset| &self.keys[(start + offset) % self.keys.len()])
            .find(|key| !failed.contains(*key))
            .or_else(|| self.keys.get(start))
            .cloned()
    }

    pub fn report_failed(&self, key: &str) {
        warn!("Marking analysis API key as failed");
        self.failed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string());
    }

    pub fn healthy_key_count(&self) -> usize {
        let failed = self.failed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.keys.iter().filter(|k| !failed.contains(*k)).count()
    }
}

/// FNV-1a; stable across processes, unlike the std hasher
fn stable_hash(value: &str) -> u64 {
    value.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn fake_analyze(headers: HeaderMap, Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer good-key" {
            return (AxumStatus::UNAUTHORIZED, Json(json!({})));
        }
        assert!(body["anonymized_media"]["data"].as_str().is_some());
        match body["analysis_type"].as_str() {
            Some("emotion") => (AxumStatus::TOO_MANY_REQUESTS, Json(json!({}))),
            Some("milestone") => (
                AxumStatus::OK,
                Json(json!({"error": {"code": "E42", "message": "unsupported media"}})),
            ),
            _ => (
                AxumStatus::OK,
                Json(json!({"results": {
                    "recommendations": ["Tummy time"],
                    "development_scores": {"motor": 0.7},
                    "emotion_tags": ["calm"]
                }})),
            ),
        }
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/analyze", post(fake_analyze))
            .route("/broken", post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let base = spawn_server().await;
        let client = HttpAnalysisClient::new(format!("{}/analyze", base)).unwrap();
        let payload = client
            .analyze("good-key", b"jpeg", "jpg", AnalysisRequestType::Development)
            .await
            .unwrap();
        assert_eq!(payload.recommendations, vec!["Tummy time".to_string()]);
        assert_eq!(payload.development_scores.get("motor"), Some(&0.7));
        assert_eq!(payload.emotion_tags, vec!["calm".to_string()]);
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let base = spawn_server().await;
        let client = HttpAnalysisClient::new(format!("{}/analyze", base)).unwrap();

        let err = client
            .analyze("bad-key", b"jpeg", "jpg", AnalysisRequestType::Development)
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::InvalidApiKey);

        let err = client
            .analyze("good-key", b"jpeg", "jpg", AnalysisRequestType::Emotion)
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::QuotaExceeded);

        let err = client
            .analyze("good-key", b"jpeg", "jpg", AnalysisRequestType::MilestoneCheck)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ApiError { code: "E42".into(), message: "unsupported media".into() }
        );

        let broken = HttpAnalysisClient::new(format!("{}/broken", base)).unwrap();
        let err = broken
            .analyze("good-key", b"jpeg", "jpg", AnalysisRequestType::Development)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ApiError { code: "500".into(), message: "API request failed".into() }
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = HttpAnalysisClient::new("http://127.0.0.1:1/analyze").unwrap();
        let err = client
            .analyze("good-key", b"jpeg", "jpg", AnalysisRequestType::Development)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NetworkError(_)));
    }

    #[test]
    fn test_parse_response_shapes() {
        assert_eq!(parse_response(json!({})).unwrap(), AnalysisPayload::default());
        assert_eq!(parse_response(json!([1, 2])), Err(AnalysisError::InvalidResponse));
        assert_eq!(
            parse_response(json!({"results": {"recommendations": "not a list"}})),
            Err(AnalysisError::InvalidResponse)
        );
    }

    #[test]
    fn test_key_selection_is_stable_and_skips_failed() {
        let manager = ApiKeyManager::new(vec!["a".into(), "b".into(), "c".into()]);
        let first = manager.key_for("device-1").unwrap();
        assert_eq!(manager.key_for("device-1").unwrap(), first);

        manager.report_failed(&first);
        let second = manager.key_for("device-1").unwrap();
        assert_ne!(second, first);
        assert_eq!(manager.healthy_key_count(), 2);

        manager.report_failed(&second);
        let third = manager.key_for("device-1").unwrap();
        manager.report_failed(&third);
        assert_eq!(manager.healthy_key_count(), 0);
        assert_eq!(manager.key_for("device-1").unwrap(), first);

        assert!(ApiKeyManager::new(Vec::new()).key_for("device-1").is_none());
    }
}
