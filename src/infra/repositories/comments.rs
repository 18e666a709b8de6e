use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::comment::Comment;
use crate::domain::image::ImageId;
use crate::domain::repository::CommentRepository;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PgCommentRepository {
    db: Db,
}

impl PgCommentRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_image(&self, image_id: &ImageId) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, image_id, user_id, content, created_at \
             FROM comments \
             WHERE image_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(image_id.as_str())
        .fetch_all(self.db.pool())
        .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(Comment {
                id: row.get("id"),
                image_id: row.get("image_id"),
                user_id: row.get("user_id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            });
        }

        Ok(comments)
    }

    async fn insert(&self, image_id: &ImageId, user_id: i64, content: &str) -> Result<Comment> {
        let row = sqlx::query(
            "INSERT INTO comments (image_id, user_id, content) VALUES ($1, $2, $3) \
             RETURNING id, image_id, user_id, content, created_at",
        )
        .bind(image_id.as_str())
        .bind(user_id)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Comment {
            id: row.get("id"),
            image_id: row.get("image_id"),
            user_id: row.get("user_id"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        })
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;
        Ok(count)
    }
}
