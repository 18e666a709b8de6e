//! Storage seams for the like ledger, accounts and comments.
//!
//! Services hold these behind `Arc<dyn _>` so the Postgres implementations in
//! `infra::repositories` can be swapped for in-process ones.

use anyhow::Result;
use async_trait::async_trait;

use super::comment::Comment;
use super::image::ImageId;
use super::user::User;

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn count_for_image(&self, image_id: &ImageId) -> Result<i64>;

    async fn exists(&self, image_id: &ImageId, user_id: i64) -> Result<bool>;

    /// Inserts the like and returns the image's count including it, in one
    /// statement. `None` when the (image, user) pair already has a like.
    async fn insert(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>>;

    /// Removes the like and returns the image's remaining count, in one
    /// statement. `None` when there was no like to remove.
    async fn delete(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>>;

    async fn count_for_user(&self, user_id: i64) -> Result<i64>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email already exists")]
    EmailTaken,
    #[error("username already exists")]
    UsernameTaken,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Duplicates are reported from the unique constraints, so two racing
    /// registrations still get a typed conflict.
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, CreateUserError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_email_or_username(&self, email: &str, username: &str)
        -> Result<Option<User>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Newest first.
    async fn list_for_image(&self, image_id: &ImageId) -> Result<Vec<Comment>>;

    async fn insert(&self, image_id: &ImageId, user_id: i64, content: &str) -> Result<Comment>;

    async fn count_for_user(&self, user_id: i64) -> Result<i64>;
}
