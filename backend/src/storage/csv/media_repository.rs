//! # Media Repository
//!
//! Owns the `Media/` directory: photo and video files, thumbnails and the
//! `media_index.yaml` document holding metadata the files cannot carry
//! (stable ids, tags, favorites, descriptions).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::MediaType;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::CsvConnection;
use crate::domain::models::media::MediaFileName;
use crate::storage::traits::MediaIndexStorage;

/// Index entry for one media file, keyed by file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: Uuid,
    pub file_name: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A media file found on disk
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub media_type: MediaType,
    pub baby_id: Uuid,
    pub file_size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct MediaRepository {
    connection: CsvConnection,
}

impl MediaRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    pub fn photos_directory(&self) -> PathBuf {
        self.connection.media_directory().join("Photos")
    }

    pub fn videos_directory(&self) -> PathBuf {
        self.connection.media_directory().join("Videos")
    }

    pub fn thumbnails_directory(&self) -> PathBuf {
        self.connection.media_directory().join("Thumbnails")
    }

    fn get_index_path(&self) -> PathBuf {
        self.connection.media_directory().join("media_index.yaml")
    }

    pub fn directory_for(&self, media_type: MediaType) -> PathBuf {
        match media_type {
            MediaType::Photo => self.photos_directory(),
            MediaType::Video => self.videos_directory(),
        }
    }

    pub fn thumbnail_path_for(&self, file_name: &str) -> PathBuf {
        self.thumbnails_directory().join(MediaFileName::thumbnail_name(file_name))
    }

    /// Create Media/{Photos,Videos,Thumbnails} if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.connection.media_directory(),
            self.photos_directory(),
            self.videos_directory(),
            self.thumbnails_directory(),
        ] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
                info!("Created media directory: {:?}", dir);
            }
        }
        Ok(())
    }

    /// Write `bytes` as a new media file and return its path
    pub fn write_media_file(&self, media_type: MediaType, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.directory_for(media_type).join(file_name);
        self.connection.write_atomic(&path, bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }

    /// Write thumbnail bytes for a media file and return the thumbnail path
    pub fn write_thumbnail(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.thumbnail_path_for(file_name);
        self.connection.write_atomic(&path, bytes)?;
        Ok(path)
    }

    /// Copy an existing file into the media directory
    pub fn import_media_file(&self, media_type: MediaType, file_name: &str, source: &Path) -> Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.directory_for(media_type).join(file_name);
        fs::copy(source, &path)?;
        debug!("Copied {:?} to {:?}", source, path);
        Ok(path)
    }

    /// Remove a file if it exists. Returns whether something was removed.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        debug!("Removed {:?}", path);
        Ok(true)
    }

    /// Whether a media file with this name already exists
    pub fn media_file_exists(&self, media_type: MediaType, file_name: &str) -> bool {
        self.directory_for(media_type).join(file_name).exists()
    }

    /// List every photo and video whose name parses as a media file name
    pub fn scan_media_files(&self) -> Result<Vec<MediaFile>> {
        let mut files = Vec::new();
        for media_type in [MediaType::Photo, MediaType::Video] {
            let dir = self.directory_for(media_type);
            if !dir.exists() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                    continue;
                };
                if file_name.ends_with(".tmp") {
                    continue;
                }
                let Some(parsed) = MediaFileName::parse(&file_name) else {
                    warn!("Skipping unrecognised media file {:?}", path);
                    continue;
                };
                let metadata = entry.metadata()?;
                files.push(MediaFile {
                    path,
                    file_name,
                    media_type,
                    baby_id: parsed.baby_id,
                    file_size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }
        debug!("Scanned {} media files", files.len());
        Ok(files)
    }
}

impl MediaIndexStorage for MediaRepository {
    fn load_media_index(&self) -> Result<Vec<MediaRecord>> {
        Ok(self.connection.read_yaml(&self.get_index_path())?.unwrap_or_default())
    }

    fn save_media_index(&self, records: &[MediaRecord]) -> Result<()> {
        self.ensure_directories()?;
        self.connection.write_yaml(&self.get_index_path(), &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    #[test]
    fn test_scan_finds_named_files_only() {
        let env = TestEnvironment::new().unwrap();
        let repo = MediaRepository::new(env.connection.clone());
        let baby_id = Uuid::new_v4();

        let name = MediaFileName { baby_id, timestamp: 1_700_000_000 }.format(MediaType::Photo);
        repo.write_media_file(MediaType::Photo, &name, b"jpeg-bytes").unwrap();
        fs::write(repo.photos_directory().join("notes.txt"), "x").unwrap();

        let files = repo.scan_media_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].baby_id, baby_id);
        assert_eq!(files[0].file_size, 10);
        assert_eq!(files[0].media_type, MediaType::Photo);
    }

    #[test]
    fn test_index_round_trip() {
        let env = TestEnvironment::new().unwrap();
        let repo = MediaRepository::new(env.connection.clone());
        assert!(repo.load_media_index().unwrap().is_empty());

        let record = MediaRecord {
            id: Uuid::new_v4(),
            file_name: "a_1.jpg".to_string(),
            media_type: MediaType::Photo,
            description: None,
            tags: vec!["bath".to_string()],
            is_favorite: true,
            duration: None,
            created_at: Utc::now(),
        };
        repo.save_media_index(std::slice::from_ref(&record)).unwrap();
        assert_eq!(repo.load_media_index().unwrap(), vec![record]);
    }

    #[test]
    fn test_directories_are_created() {
        let env = TestEnvironment::new().unwrap();
        let repo = MediaRepository::new(env.connection.clone());
        repo.ensure_directories().unwrap();
        assert!(env.base_path.join("Media").join("Photos").is_dir());
        assert!(env.base_path.join("Media").join("Videos").is_dir());
        assert!(env.base_path.join("Media").join("Thumbnails").is_dir());
    }
}
