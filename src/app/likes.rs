use std::sync::Arc;

use crate::domain::image::ImageId;
use crate::domain::like::LikeStatus;
use crate::domain::repository::LikeRepository;
use crate::infra::unsplash::PhotoProvider;

#[derive(Debug, thiserror::Error)]
pub enum LikeError {
    #[error("image already liked")]
    AlreadyLiked,
    #[error("like not found")]
    NotLiked,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
enum MirrorAction {
    Like,
    Unlike,
}

impl MirrorAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
        }
    }
}

/// Authoritative like ledger for images.
///
/// The upstream photo API is told about likes on a detached task; it is a
/// mirror only, so its outcome never reaches the caller.
#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    mirror: Option<Arc<dyn PhotoProvider>>,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepository>, mirror: Option<Arc<dyn PhotoProvider>>) -> Self {
        Self { likes, mirror }
    }

    pub async fn get_like_status(
        &self,
        image_id: &ImageId,
        user_id: Option<i64>,
    ) -> Result<LikeStatus, LikeError> {
        let count = self.likes.count_for_image(image_id).await?;
        let is_liked = match user_id {
            Some(user_id) => self.likes.exists(image_id, user_id).await?,
            None => false,
        };
        Ok(LikeStatus::new(count, is_liked))
    }

    pub async fn like_image(&self, image_id: &ImageId, user_id: i64) -> Result<LikeStatus, LikeError> {
        if self.likes.exists(image_id, user_id).await? {
            return Err(LikeError::AlreadyLiked);
        }
        let Some(count) = self.likes.insert(image_id, user_id).await? else {
            tracing::debug!(image_id = %image_id, user_id, "like lost a race to a concurrent insert");
            return Err(LikeError::AlreadyLiked);
        };

        self.mirror(MirrorAction::Like, image_id);
        Ok(LikeStatus::new(count, true))
    }

    pub async fn unlike_image(
        &self,
        image_id: &ImageId,
        user_id: i64,
    ) -> Result<LikeStatus, LikeError> {
        if !self.likes.exists(image_id, user_id).await? {
            return Err(LikeError::NotLiked);
        }
        let Some(count) = self.likes.delete(image_id, user_id).await? else {
            tracing::debug!(image_id = %image_id, user_id, "unlike lost a race to a concurrent delete");
            return Err(LikeError::NotLiked);
        };

        self.mirror(MirrorAction::Unlike, image_id);
        Ok(LikeStatus::new(count, false))
    }

    fn mirror(&self, action: MirrorAction, image_id: &ImageId) {
        let Some(provider) = self.mirror.clone() else {
            return;
        };
        let image_id = image_id.clone();
        tokio::spawn(async move {
            let result = match action {
                MirrorAction::Like => provider.like_photo(&image_id).await,
                MirrorAction::Unlike => provider.unlike_photo(&image_id).await,
            };
            match result {
                Ok(()) => {
                    tracing::debug!(image_id = %image_id, action = action.as_str(), "mirrored like to upstream");
                }
                Err(err) => {
                    tracing::warn!(error = %err, image_id = %image_id, action = action.as_str(), "upstream like mirror failed");
                }
            }
        });
    }
}
