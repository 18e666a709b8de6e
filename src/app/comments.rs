use std::sync::Arc;

use crate::domain::comment::Comment;
use crate::domain::image::ImageId;
use crate::domain::repository::CommentRepository;

const MIN_CONTENT_LEN: usize = 3;
const MAX_CONTENT_LEN: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("content must be between 3 and 500 characters")]
    InvalidContent,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>) -> Self {
        Self { comments }
    }

    pub async fn list_comments(&self, image_id: &ImageId) -> Result<Vec<Comment>, CommentError> {
        Ok(self.comments.list_for_image(image_id).await?)
    }

    pub async fn add_comment(
        &self,
        image_id: &ImageId,
        user_id: i64,
        content: &str,
    ) -> Result<Comment, CommentError> {
        let content = content.trim();
        let len = content.chars().count();
        if !(MIN_CONTENT_LEN..=MAX_CONTENT_LEN).contains(&len) {
            return Err(CommentError::InvalidContent);
        }
        Ok(self.comments.insert(image_id, user_id, content).await?)
    }
}
