//! backend/src/domain/models/media.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::MediaType;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use super::analysis::AnalysisResult;

pub const PHOTO_EXTENSION: &str = "jpg";
pub const VIDEO_EXTENSION: &str = "mov";

/// A photo or video stored under the media directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub media_type: MediaType,
    pub file_name: String,
    pub file_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub file_size: u64,
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub is_favorite: bool,
    pub analysis_results: Vec<AnalysisResult>,
}

impl MediaItem {
    /// Adds `tag` unless already present. Returns whether the item changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Removes every occurrence of `tag`. Returns whether the item changed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        before != self.tags.len()
    }

    /// Case-insensitive match against the description and tags
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&query))
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Parsed form of a media file name: `{baby_id}_{unix_seconds}.{ext}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFileName {
    pub baby_id: Uuid,
    pub timestamp: i64,
}

impl MediaFileName {
    pub fn format(&self, media_type: MediaType) -> String {
        let extension = match media_type {
            MediaType::Photo => PHOTO_EXTENSION,
            MediaType::Video => VIDEO_EXTENSION,
        };
        format!("{}_{}.{}", self.baby_id, self.timestamp, extension)
    }

    /// Parse a stored file name. Names that do not start with a baby id are
    /// not media files and yield `None`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);
        let (id_part, rest) = stem.split_once('_')?;
        let baby_id = Uuid::parse_str(id_part).ok()?;
        let timestamp = rest.parse::<i64>().unwrap_or(0);
        Some(Self { baby_id, timestamp })
    }

    /// Thumbnail file name for a media file name: `{stem}_thumb.jpg`
    pub fn thumbnail_name(file_name: &str) -> String {
        let stem = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);
        format!("{}_thumb.{}", stem, PHOTO_EXTENSION)
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media item not found: {0}")]
    NotFound(Uuid),
    #[error("Source file not found: {0}")]
    SourceNotFound(String),
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),
    #[error("Media file error: {0}")]
    Io(#[from] std::io::Error),
}
