//! Photo and video management.
//!
//! Files live under `Media/{Photos,Videos,Thumbnails}` and are named
//! `{baby_id}_{unix_seconds}.{ext}`. The in-memory item list is rebuilt by
//! scanning those directories; ids, tags, favorites and descriptions come
//! from `Media/media_index.yaml`, analysis results from
//! `analysis_results.yaml`.

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use shared::MediaType;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::commands::media::{MediaQuery, MediaStatistics, UpdateMediaCommand};
use crate::domain::events::{EventBus, StoreEvent};
use crate::domain::models::analysis::AnalysisResult;
use crate::domain::models::media::{MediaError, MediaFileName, MediaItem};
use crate::storage::csv::{AnalysisRepository, CsvConnection, MediaRecord, MediaRepository};
use crate::storage::traits::{AnalysisStorage, MediaIndexStorage};

const PHOTO_QUALITY: u8 = 80;
const THUMBNAIL_QUALITY: u8 = 70;
const THUMBNAIL_SIZE: u32 = 200;

#[derive(Clone)]
pub struct MediaService {
    repository: MediaRepository,
    analysis_repository: AnalysisRepository,
    /// `None` until the first scan
    items: Arc<Mutex<Option<Vec<MediaItem>>>>,
    /// File names handed out to saves that have not reached the index yet
    reserved_names: Arc<Mutex<HashSet<String>>>,
    events: EventBus,
}

/// A file name held for one in-flight save, released on drop
struct NameReservation<'a> {
    names: &'a Mutex<HashSet<String>>,
    file_name: String,
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        self.names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.file_name);
    }
}

impl MediaService {
    pub fn new(csv_conn: Arc<CsvConnection>, events: EventBus) -> Self {
        let repository = MediaRepository::new((*csv_conn).clone());
        if let Err(e) = repository.ensure_directories() {
            error!("Failed to create media directories: {}", e);
        }
        Self {
            repository,
            analysis_repository: AnalysisRepository::new((*csv_conn).clone()),
            items: Arc::new(Mutex::new(None)),
            reserved_names: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<MediaItem>>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rescan the media directories on a blocking worker and replace the
    /// cached item list with the result
    pub async fn load_media_items(&self) -> Result<Vec<MediaItem>> {
        info!("Scanning media directories");
        let repository = self.repository.clone();
        let analysis_repository = self.analysis_repository.clone();
        let items = tokio::task::spawn_blocking(move || scan_items(&repository, &analysis_repository))
            .await
            .map_err(|e| anyhow!("Media scan task failed: {}", e))??;

        *self.lock() = Some(items.clone());
        info!("Loaded {} media items", items.len());
        Ok(items)
    }

    /// Run `f` against the cached items, scanning synchronously on first use
    fn with_items<T>(&self, f: impl FnOnce(&mut Vec<MediaItem>) -> T) -> Result<T> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(scan_items(&self.repository, &self.analysis_repository)?);
        }
        match guard.as_mut() {
            Some(items) => Ok(f(items)),
            None => Err(anyhow!("Media cache unavailable")),
        }
    }

    fn persist_index(&self, items: &[MediaItem]) -> Result<()> {
        let records: Vec<MediaRecord> = items.iter().map(record_for).collect();
        self.repository.save_media_index(&records)
    }

    /// Media of one baby (or every baby), newest first
    pub fn list_media(&self, baby_id: Option<Uuid>) -> Result<Vec<MediaItem>> {
        self.with_items(|items| {
            items
                .iter()
                .filter(|i| baby_id.map_or(true, |id| i.baby_id == id))
                .cloned()
                .collect()
        })
    }

    pub fn get_media(&self, media_id: Uuid) -> Result<Option<MediaItem>> {
        self.with_items(|items| items.iter().find(|i| i.id == media_id).cloned())
    }

    /// Store a photo as JPEG and write its 200x200 thumbnail.
    /// Any format the decoder understands is accepted.
    pub fn save_photo(
        &self,
        baby_id: Uuid,
        bytes: &[u8],
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MediaItem> {
        info!("Saving photo for baby {} ({} bytes)", baby_id, bytes.len());

        let image = image::load_from_memory(bytes)
            .map_err(|e| MediaError::InvalidImageData(e.to_string()))?;
        let jpeg = encode_jpeg(&image, PHOTO_QUALITY)?;

        let reservation = self.reserve_file_name(baby_id, MediaType::Photo, now);
        let file_name = reservation.file_name.clone();
        let path = self.repository.write_media_file(MediaType::Photo, &file_name, &jpeg)?;

        let thumbnail = image.resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);
        let thumbnail_path = match encode_jpeg(&thumbnail, THUMBNAIL_QUALITY)
            .and_then(|data| self.repository.write_thumbnail(&file_name, &data))
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to write thumbnail for {}: {}", file_name, e);
                None
            }
        };

        let item = MediaItem {
            id: Uuid::new_v4(),
            baby_id,
            media_type: MediaType::Photo,
            file_name,
            file_path: path,
            thumbnail_path,
            file_size: jpeg.len() as u64,
            duration: None,
            created_at: now,
            tags: Vec::new(),
            description: description.filter(|d| !d.trim().is_empty()),
            is_favorite: false,
            analysis_results: Vec::new(),
        };
        self.insert_item(item)
    }

    /// Copy a video file into the media directory
    pub fn save_video(
        &self,
        baby_id: Uuid,
        source: &Path,
        duration: Option<f64>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MediaItem> {
        info!("Importing video {:?} for baby {}", source, baby_id);

        if !source.is_file() {
            return Err(MediaError::SourceNotFound(source.display().to_string()).into());
        }

        let reservation = self.reserve_file_name(baby_id, MediaType::Video, now);
        let file_name = reservation.file_name.clone();
        let path = self.repository.import_media_file(MediaType::Video, &file_name, source)?;
        let file_size = fs::metadata(&path).map_err(MediaError::from)?.len();

        let item = MediaItem {
            id: Uuid::new_v4(),
            baby_id,
            media_type: MediaType::Video,
            file_name,
            file_path: path,
            thumbnail_path: None,
            file_size,
            duration,
            created_at: now,
            tags: Vec::new(),
            description: description.filter(|d| !d.trim().is_empty()),
            is_favorite: false,
            analysis_results: Vec::new(),
        };
        self.insert_item(item)
    }

    /// Same-second saves for one baby get the next free second. The name
    /// stays reserved until the returned guard drops, so concurrent saves
    /// never pick the same one.
    fn reserve_file_name(&self, baby_id: Uuid, media_type: MediaType, now: DateTime<Utc>) -> NameReservation<'_> {
        let mut reserved = self.reserved_names.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut name = MediaFileName { baby_id, timestamp: now.timestamp() };
        loop {
            let file_name = name.format(media_type);
            if !reserved.contains(&file_name) && !self.repository.media_file_exists(media_type, &file_name) {
                reserved.insert(file_name.clone());
                return NameReservation { names: &self.reserved_names, file_name };
            }
            debug!("Media file name taken, trying timestamp {}", name.timestamp + 1);
            name.timestamp += 1;
        }
    }

    fn insert_item(&self, item: MediaItem) -> Result<MediaItem> {
        self.with_items(|items| {
            // a first-use scan already picked the new file up
            items.retain(|i| i.file_name != item.file_name);
            items.insert(0, item.clone());
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            self.persist_index(items)
        })??;
        info!("Saved {:?} {} as {}", item.media_type, item.id, item.file_name);
        self.events.publish(StoreEvent::MediaChanged { media_id: item.id });
        Ok(item)
    }

    /// Remove the file, its thumbnail and its index entry.
    /// Returns false when the item is unknown.
    pub fn delete_media(&self, media_id: Uuid) -> Result<bool> {
        info!("Deleting media item {}", media_id);

        let removed = self.with_items(|items| -> Result<Option<MediaItem>> {
            let Some(position) = items.iter().position(|i| i.id == media_id) else {
                return Ok(None);
            };
            let item = items.remove(position);
            self.persist_index(items)?;
            Ok(Some(item))
        })??;

        let Some(item) = removed else {
            warn!("Media item not found for deletion: {}", media_id);
            return Ok(false);
        };

        self.repository.remove_file(&item.file_path)?;
        let thumbnail = item
            .thumbnail_path
            .clone()
            .unwrap_or_else(|| self.repository.thumbnail_path_for(&item.file_name));
        self.repository.remove_file(&thumbnail)?;

        self.events.publish(StoreEvent::MediaChanged { media_id });
        Ok(true)
    }

    /// Apply `change` to one item and persist the index
    fn modify(&self, media_id: Uuid, change: impl FnOnce(&mut MediaItem)) -> Result<MediaItem> {
        let updated = self.with_items(|items| -> Result<MediaItem> {
            let item = items
                .iter_mut()
                .find(|i| i.id == media_id)
                .ok_or(MediaError::NotFound(media_id))?;
            change(item);
            let updated = item.clone();
            self.persist_index(items)?;
            Ok(updated)
        })??;
        self.events.publish(StoreEvent::MediaChanged { media_id });
        Ok(updated)
    }

    pub fn update_media(&self, media_id: Uuid, command: UpdateMediaCommand) -> Result<MediaItem> {
        info!("Updating media item {}", media_id);
        self.modify(media_id, |item| {
            if let Some(description) = command.description {
                item.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            if let Some(tags) = command.tags {
                item.tags.clear();
                for tag in &tags {
                    item.add_tag(tag);
                }
            }
            if let Some(is_favorite) = command.is_favorite {
                item.is_favorite = is_favorite;
            }
        })
    }

    pub fn add_tag(&self, media_id: Uuid, tag: &str) -> Result<MediaItem> {
        self.modify(media_id, |item| {
            item.add_tag(tag);
        })
    }

    pub fn remove_tag(&self, media_id: Uuid, tag: &str) -> Result<MediaItem> {
        self.modify(media_id, |item| {
            item.remove_tag(tag);
        })
    }

    pub fn toggle_favorite(&self, media_id: Uuid) -> Result<MediaItem> {
        self.modify(media_id, |item| item.is_favorite = !item.is_favorite)
    }

    pub fn favorites(&self, baby_id: Option<Uuid>) -> Result<Vec<MediaItem>> {
        Ok(self
            .list_media(baby_id)?
            .into_iter()
            .filter(|i| i.is_favorite)
            .collect())
    }

    pub fn search_media(&self, query: &MediaQuery) -> Result<Vec<MediaItem>> {
        Ok(self
            .list_media(query.baby_id)?
            .into_iter()
            .filter(|i| query.media_type.map_or(true, |t| i.media_type == t))
            .filter(|i| i.matches_query(&query.query))
            .collect())
    }

    pub fn statistics(&self, baby_id: Option<Uuid>) -> Result<MediaStatistics> {
        let items = self.list_media(baby_id)?;
        Ok(MediaStatistics {
            photo_count: items.iter().filter(|i| i.media_type == MediaType::Photo).count(),
            video_count: items.iter().filter(|i| i.media_type == MediaType::Video).count(),
            total_size: items.iter().map(|i| i.file_size).sum(),
        })
    }

    /// Raw bytes of a media file
    pub fn read_media_bytes(&self, media_id: Uuid) -> Result<Vec<u8>, MediaError> {
        let item = self
            .get_media(media_id)
            .ok()
            .flatten()
            .ok_or(MediaError::NotFound(media_id))?;
        if !item.file_path.exists() {
            return Err(MediaError::SourceNotFound(item.file_path.display().to_string()));
        }
        Ok(fs::read(&item.file_path)?)
    }

    /// Attach a freshly stored analysis result to its cached item
    pub fn attach_analysis_result(&self, result: &AnalysisResult) -> Result<()> {
        self.with_items(|items| match items.iter_mut().find(|i| i.id == result.media_id) {
            Some(item) => item.analysis_results.push(result.clone()),
            None => warn!("Analysis result {} for unknown media {}", result.id, result.media_id),
        })
    }
}

/// Build the item list from the files on disk. New files get index entries,
/// entries whose files are gone are dropped.
fn scan_items(repository: &MediaRepository, analysis_repository: &AnalysisRepository) -> Result<Vec<MediaItem>> {
    let files = repository.scan_media_files()?;
    let index = repository.load_media_index()?;
    let index_len = index.len();
    let mut by_name: HashMap<String, MediaRecord> =
        index.into_iter().map(|r| (r.file_name.clone(), r)).collect();

    let results = analysis_repository.list_results().unwrap_or_else(|e| {
        warn!("Failed to load analysis results: {}", e);
        Vec::new()
    });

    let mut added = false;
    let mut items = Vec::with_capacity(files.len());
    for file in files {
        let record = match by_name.remove(&file.file_name) {
            Some(record) => record,
            None => {
                added = true;
                let created_at = MediaFileName::parse(&file.file_name)
                    .and_then(|name| Utc.timestamp_opt(name.timestamp, 0).single())
                    .or(file.modified)
                    .unwrap_or_else(Utc::now);
                MediaRecord {
                    id: Uuid::new_v4(),
                    file_name: file.file_name.clone(),
                    media_type: file.media_type,
                    description: None,
                    tags: Vec::new(),
                    is_favorite: false,
                    duration: None,
                    created_at,
                }
            }
        };

        let thumbnail_path = repository.thumbnail_path_for(&file.file_name);
        items.push(MediaItem {
            id: record.id,
            baby_id: file.baby_id,
            media_type: file.media_type,
            file_name: file.file_name,
            file_path: file.path,
            thumbnail_path: thumbnail_path.exists().then_some(thumbnail_path),
            file_size: file.file_size,
            duration: record.duration,
            created_at: record.created_at,
            tags: record.tags,
            description: record.description,
            is_favorite: record.is_favorite,
            analysis_results: results.iter().filter(|r| r.media_id == record.id).cloned().collect(),
        });
    }

    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if added || !by_name.is_empty() {
        debug!(
            "Media index changed: {} entries before, {} after",
            index_len,
            items.len()
        );
        let records: Vec<MediaRecord> = items.iter().map(record_for).collect();
        repository.save_media_index(&records)?;
    }
    Ok(items)
}

fn record_for(item: &MediaItem) -> MediaRecord {
    MediaRecord {
        id: item.id,
        file_name: item.file_name.clone(),
        media_type: item.media_type,
        description: item.description.clone(),
        tags: item.tags.clone(),
        is_favorite: item.is_favorite,
        duration: item.duration,
        created_at: item.created_at,
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .encode_image(&image.to_rgb8())
        .map_err(|e| MediaError::InvalidImageData(e.to_string()))?;
    Ok(data)
}
