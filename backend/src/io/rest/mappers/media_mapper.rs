//! backend/src/io/rest/mappers/media_mapper.rs

use shared::{
    AnalysisListResponse, AnalysisResult as SharedAnalysisResult, MediaItem as SharedMediaItem,
    MediaListResponse, MediaStatisticsResponse,
};

use crate::domain::commands::media::MediaStatistics;
use crate::domain::models::analysis::AnalysisResult as DomainAnalysisResult;
use crate::domain::models::media::MediaItem as DomainMediaItem;

pub struct MediaMapper;

impl MediaMapper {
    pub fn to_dto(domain: DomainMediaItem) -> SharedMediaItem {
        SharedMediaItem {
            id: domain.id.to_string(),
            baby_id: domain.baby_id.to_string(),
            media_type: domain.media_type,
            file_name: domain.file_name,
            file_path: domain.file_path.to_string_lossy().into_owned(),
            thumbnail_path: domain.thumbnail_path.map(|p| p.to_string_lossy().into_owned()),
            file_size: domain.file_size,
            duration_secs: domain.duration,
            created_at: domain.created_at.to_rfc3339(),
            tags: domain.tags,
            description: domain.description,
            is_favorite: domain.is_favorite,
            analysis_results: domain
                .analysis_results
                .into_iter()
                .map(Self::analysis_to_dto)
                .collect(),
        }
    }

    pub fn to_list_dto(items: Vec<DomainMediaItem>) -> MediaListResponse {
        MediaListResponse {
            items: items.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn statistics_to_dto(statistics: MediaStatistics) -> MediaStatisticsResponse {
        MediaStatisticsResponse {
            photo_count: statistics.photo_count,
            video_count: statistics.video_count,
            total_size: statistics.total_size,
        }
    }

    pub fn analysis_to_dto(domain: DomainAnalysisResult) -> SharedAnalysisResult {
        SharedAnalysisResult {
            id: domain.id.to_string(),
            media_id: domain.media_id.to_string(),
            analysis_type: domain.analysis_type,
            result: domain.result,
            confidence: domain.confidence,
            recommendations: domain.recommendations,
            development_scores: domain.development_scores,
            emotion_tags: domain.emotion_tags,
            analyzed_at: domain.analyzed_at.to_rfc3339(),
        }
    }

    pub fn to_analysis_list_dto(results: Vec<DomainAnalysisResult>) -> AnalysisListResponse {
        AnalysisListResponse {
            results: results.into_iter().map(Self::analysis_to_dto).collect(),
        }
    }
}
