use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use crate::domain::image::ImageId;
use crate::domain::repository::LikeRepository;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PgLikeRepository {
    db: Db,
}

impl PgLikeRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn count_for_image(&self, image_id: &ImageId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE image_id = $1")
            .bind(image_id.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn exists(&self, image_id: &ImageId, user_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE image_id = $1 AND user_id = $2)",
        )
        .bind(image_id.as_str())
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists)
    }

    async fn insert(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>> {
        // The unique (image_id, user_id) constraint settles concurrent
        // duplicates; the loser inserts nothing. The outer SELECT sees the
        // table as it was before the CTE ran.
        let row = sqlx::query(
            "WITH inserted AS ( \
                 INSERT INTO likes (image_id, user_id) VALUES ($1, $2) \
                 ON CONFLICT (image_id, user_id) DO NOTHING \
                 RETURNING id \
             ) \
             SELECT (SELECT COUNT(*) FROM inserted) AS inserted, \
                    (SELECT COUNT(*) FROM likes WHERE image_id = $1) AS existing",
        )
        .bind(image_id.as_str())
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        let inserted: i64 = row.get("inserted");
        let existing: i64 = row.get("existing");
        Ok((inserted > 0).then(|| existing + inserted))
    }

    async fn delete(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>> {
        let row = sqlx::query(
            "WITH deleted AS ( \
                 DELETE FROM likes WHERE image_id = $1 AND user_id = $2 \
                 RETURNING id \
             ) \
             SELECT (SELECT COUNT(*) FROM deleted) AS deleted, \
                    (SELECT COUNT(*) FROM likes WHERE image_id = $1) AS existing",
        )
        .bind(image_id.as_str())
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        let deleted: i64 = row.get("deleted");
        let existing: i64 = row.get("existing");
        Ok((deleted > 0).then(|| (existing - deleted).max(0)))
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}
