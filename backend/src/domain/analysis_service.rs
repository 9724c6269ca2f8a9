use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use shared::{AnalysisRequestType, MediaType, QuotaStatus};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::analysis_client::{AnalysisApi, ApiKeyManager};
use crate::domain::events::{EventBus, StoreEvent};
use crate::domain::media_service::MediaService;
use crate::domain::models::analysis::{AnalysisError, AnalysisResult};
use crate::domain::models::media::MediaError;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::settings_service::SettingsService;
use crate::storage::csv::{AnalysisRepository, CsvConnection};
use crate::storage::traits::AnalysisStorage;

const DEFAULT_RESULT_TEXT: &str = "Analysis complete";
const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Gated cloud analysis of stored media
#[derive(Clone)]
pub struct AnalysisService {
    api: Arc<dyn AnalysisApi>,
    key_manager: ApiKeyManager,
    device_id: String,
    rate_limiter: RateLimiter,
    repository: AnalysisRepository,
    media_service: MediaService,
    settings_service: SettingsService,
    events: EventBus,
}

impl AnalysisService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        api: Arc<dyn AnalysisApi>,
        key_manager: ApiKeyManager,
        device_id: String,
        rate_limiter: RateLimiter,
        media_service: MediaService,
        settings_service: SettingsService,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            key_manager,
            device_id,
            rate_limiter,
            repository: AnalysisRepository::new((*csv_conn).clone()),
            media_service,
            settings_service,
            events,
        }
    }

    /// Opt-in, rate limit and quota are checked before any media is read;
    /// usage is only recorded for successful calls. The settings usage
    /// counter is bumped afterwards but never consulted here.
    pub async fn request_analysis(
        &self,
        media_id: Uuid,
        analysis_type: AnalysisRequestType,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("Requesting {} analysis for media {}", analysis_type.as_str(), media_id);

        if !self.settings_service.get_settings().ai.analysis_enabled {
            return Err(AnalysisError::AnalysisOptedOut);
        }
        if !self.rate_limiter.allow_request(analysis_type, now) {
            warn!("Analysis rate limit hit for {}", analysis_type.as_str());
            return Err(AnalysisError::RateLimitExceeded);
        }
        if !self.rate_limiter.has_available_quota(analysis_type, now) {
            return Err(AnalysisError::QuotaExceeded);
        }

        let (media, format) = self.anonymized_media(media_id).await?;

        let api_key = self
            .key_manager
            .key_for(&self.device_id)
            .ok_or(AnalysisError::InvalidApiKey)?;

        let payload = match self.api.analyze(&api_key, &media, format, analysis_type).await {
            Ok(payload) => payload,
            Err(AnalysisError::InvalidApiKey) => {
                self.key_manager.report_failed(&api_key);
                return Err(AnalysisError::InvalidApiKey);
            }
            Err(e) => {
                error!("Analysis of media {} failed: {}", media_id, e);
                return Err(e);
            }
        };

        let result = AnalysisResult {
            id: Uuid::new_v4(),
            media_id,
            analysis_type: analysis_type.result_type(),
            result: payload.summary.unwrap_or_else(|| DEFAULT_RESULT_TEXT.to_string()),
            confidence: payload.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            recommendations: payload.recommendations,
            development_scores: payload.development_scores,
            emotion_tags: payload.emotion_tags,
            analyzed_at: now,
        };

        self.repository
            .store_result(&result)
            .map_err(|e| AnalysisError::DataProcessingFailed(e.to_string()))?;
        if let Err(e) = self.media_service.attach_analysis_result(&result) {
            warn!("Failed to attach analysis result to media {}: {}", media_id, e);
        }

        self.rate_limiter.record_request(analysis_type, now);
        if let Err(e) = self.settings_service.increment_used_quota(now.with_timezone(&Local)) {
            warn!("Failed to record analysis usage in settings: {}", e);
        }

        info!("Analysis {} stored for media {}", result.id, media_id);
        self.events.publish(StoreEvent::AnalysisCompleted {
            media_id,
            result_id: result.id,
        });
        Ok(result)
    }

    /// Media bytes plus the format label sent with them
    async fn anonymized_media(&self, media_id: Uuid) -> Result<(Vec<u8>, &'static str), AnalysisError> {
        let media_service = self.media_service.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            let item = media_service
                .get_media(media_id)
                .map_err(|e| AnalysisError::DataProcessingFailed(e.to_string()))?
                .ok_or(AnalysisError::MediaNotFound)?;
            let bytes = media_service.read_media_bytes(media_id).map_err(|e| match e {
                MediaError::NotFound(_) | MediaError::SourceNotFound(_) => AnalysisError::MediaNotFound,
                other => AnalysisError::DataProcessingFailed(other.to_string()),
            })?;
            Ok::<_, AnalysisError>((item.media_type, bytes))
        })
        .await
        .map_err(|e| AnalysisError::DataProcessingFailed(e.to_string()))??;

        let format = match bytes.0 {
            MediaType::Photo => "jpg",
            MediaType::Video => "mov",
        };
        Ok((bytes.1, format))
    }

    pub fn get_result(&self, result_id: Uuid) -> Result<Option<AnalysisResult>> {
        Ok(self
            .repository
            .list_results()?
            .into_iter()
            .find(|r| r.id == result_id))
    }

    pub fn results_for_media(&self, media_id: Uuid) -> Result<Vec<AnalysisResult>> {
        Ok(self
            .repository
            .list_results()?
            .into_iter()
            .filter(|r| r.media_id == media_id)
            .collect())
    }

    pub fn quota_status(&self, now: DateTime<Utc>) -> QuotaStatus {
        self.rate_limiter.quota_status(now)
    }
}
