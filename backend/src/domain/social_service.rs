//! Sharing posts and media to a social platform account.

use async_trait::async_trait;
use chrono::Utc;
use shared::{PostPrivacy, PostStatus, SocialPlatform, SocialPost, SocialUser};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::media_service::MediaService;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SocialError {
    #[error("Not connected to a social account")]
    NotConnected,
    #[error("Publishing failed: {0}")]
    PublishFailed(String),
    #[error("Post content cannot be empty")]
    InvalidContent,
    #[error("Media item not found: {0}")]
    MediaNotFound(String),
}

/// One social platform account
#[async_trait]
pub trait SocialPlatformClient: Send + Sync {
    fn platform(&self) -> SocialPlatform;
    async fn login(&self) -> Result<SocialUser, SocialError>;
    async fn publish(&self, content: &str, media_paths: &[String], privacy: PostPrivacy) -> Result<String, SocialError>;
}

/// Stand-in for the Facebook SDK; accepts every non-empty post
#[derive(Debug, Clone, Default)]
pub struct SimulatedFacebookClient;

#[async_trait]
impl SocialPlatformClient for SimulatedFacebookClient {
    fn platform(&self) -> SocialPlatform {
        SocialPlatform::Facebook
    }

    async fn login(&self) -> Result<SocialUser, SocialError> {
        Ok(SocialUser {
            id: "facebook_user_123".to_string(),
            name: "Facebook user".to_string(),
        })
    }

    async fn publish(&self, content: &str, _media_paths: &[String], _privacy: PostPrivacy) -> Result<String, SocialError> {
        if content.trim().is_empty() {
            return Err(SocialError::InvalidContent);
        }
        Ok(format!("facebook_post_{}", Uuid::new_v4()))
    }
}

#[derive(Default)]
struct SocialState {
    user: Option<SocialUser>,
    posts: Vec<SocialPost>,
}

#[derive(Clone)]
pub struct SocialService {
    client: Arc<dyn SocialPlatformClient>,
    media_service: MediaService,
    state: Arc<Mutex<SocialState>>,
}

impl SocialService {
    pub fn new(client: Arc<dyn SocialPlatformClient>, media_service: MediaService) -> Self {
        Self {
            client,
            media_service,
            state: Arc::new(Mutex::new(SocialState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SocialState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn connect(&self) -> Result<SocialUser, SocialError> {
        info!("Connecting to {:?}", self.client.platform());
        let user = self.client.login().await?;
        self.lock().user = Some(user.clone());
        Ok(user)
    }

    pub fn disconnect(&self) {
        info!("Disconnecting from {:?}", self.client.platform());
        self.lock().user = None;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().user.is_some()
    }

    pub fn current_user(&self) -> Option<SocialUser> {
        self.lock().user.clone()
    }

    /// Publish `content` with the files of `media_ids` attached. The post is
    /// recorded locally whether or not the platform accepted it.
    pub async fn publish_post(
        &self,
        content: &str,
        media_ids: &[Uuid],
        privacy: PostPrivacy,
    ) -> Result<String, SocialError> {
        info!("Publishing post with {} media items", media_ids.len());
        if !self.is_connected() {
            return Err(SocialError::NotConnected);
        }

        let mut media_paths = Vec::with_capacity(media_ids.len());
        for media_id in media_ids {
            let item = self
                .media_service
                .get_media(*media_id)
                .map_err(|e| SocialError::PublishFailed(e.to_string()))?
                .ok_or_else(|| SocialError::MediaNotFound(media_id.to_string()))?;
            media_paths.push(item.file_path.to_string_lossy().into_owned());
        }

        let outcome = self.client.publish(content, &media_paths, privacy).await;
        let (id, status) = match &outcome {
            Ok(post_id) => (post_id.clone(), PostStatus::Published),
            Err(e) => {
                error!("Failed to publish post: {}", e);
                (Uuid::new_v4().to_string(), PostStatus::Failed)
            }
        };

        self.lock().posts.push(SocialPost {
            id,
            content: content.to_string(),
            media_paths,
            privacy,
            published_at: Utc::now(),
            platform: self.client.platform(),
            status,
        });
        outcome
    }

    /// Recorded posts, newest first
    pub fn posts(&self) -> Vec<SocialPost> {
        let mut posts = self.lock().posts.clone();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventBus;
    use crate::storage::csv::test_utils::RepositoryTestHelper;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let image = image::DynamicImage::new_rgb8(4, 4);
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    fn setup() -> (RepositoryTestHelper, MediaService, SocialService) {
        let helper = RepositoryTestHelper::new().unwrap();
        let media = MediaService::new(Arc::new(helper.env.connection.clone()), EventBus::new());
        let social = SocialService::new(Arc::new(SimulatedFacebookClient), media.clone());
        (helper, media, social)
    }

    #[tokio::test]
    async fn test_publish_requires_connection() {
        let (_helper, _media, social) = setup();
        let err = social.publish_post("Hello", &[], PostPrivacy::Friends).await.unwrap_err();
        assert_eq!(err, SocialError::NotConnected);

        let user = social.connect().await.unwrap();
        assert_eq!(user.id, "facebook_user_123");
        assert!(social.is_connected());

        social.disconnect();
        assert!(social.current_user().is_none());
    }

    #[tokio::test]
    async fn test_publish_with_media() {
        let (helper, media, social) = setup();
        let baby = helper.create_test_baby("Noa").unwrap();
        let photo = media.save_photo(baby.id, &png_bytes(), None, Utc::now()).unwrap();
        social.connect().await.unwrap();

        let post_id = social
            .publish_post("First smile!", &[photo.id], PostPrivacy::Everyone)
            .await
            .unwrap();
        assert!(post_id.starts_with("facebook_post_"));

        let posts = social.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].status, PostStatus::Published);
        assert_eq!(posts[0].media_paths, vec![photo.file_path.to_string_lossy().into_owned()]);
    }

    #[tokio::test]
    async fn test_publish_failures() {
        let (_helper, _media, social) = setup();
        social.connect().await.unwrap();

        let missing = Uuid::new_v4();
        let err = social.publish_post("Hi", &[missing], PostPrivacy::Friends).await.unwrap_err();
        assert_eq!(err, SocialError::MediaNotFound(missing.to_string()));
        assert!(social.posts().is_empty());

        let err = social.publish_post("  ", &[], PostPrivacy::Friends).await.unwrap_err();
        assert_eq!(err, SocialError::InvalidContent);
        assert_eq!(social.posts()[0].status, PostStatus::Failed);
    }
}
