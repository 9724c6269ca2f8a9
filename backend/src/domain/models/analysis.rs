//! backend/src/domain/models/analysis.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::AnalysisType;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Outcome of a cloud analysis of one media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub media_id: Uuid,
    pub analysis_type: AnalysisType,
    pub result: String,
    pub confidence: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub development_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub emotion_tags: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Payload returned by the analysis endpoint under `results`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub development_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub emotion_tags: Vec<String>,
}

/// Failures of an analysis request, in the order the checks run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Cloud analysis is disabled in settings")]
    AnalysisOptedOut,
    #[error("Too many analysis requests, try again later")]
    RateLimitExceeded,
    #[error("Analysis quota exhausted, try again tomorrow")]
    QuotaExceeded,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("API error ({code}): {message}")]
    ApiError { code: String, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid API response")]
    InvalidResponse,
    #[error("Failed to process data: {0}")]
    DataProcessingFailed(String),
    #[error("Media file not found")]
    MediaNotFound,
}
