use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::repository::{CreateUserError, UserRepository};
use crate::domain::user::User;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PgUserRepository {
    db: Db,
}

impl PgUserRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn user_from_row(row: PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn create_error(err: sqlx::Error) -> CreateUserError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            match db.constraint() {
                Some("users_email_unique") => return CreateUserError::EmailTaken,
                Some("users_username_unique") => return CreateUserError::UsernameTaken,
                _ => {}
            }
        }
    }
    CreateUserError::Storage(err.into())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, CreateUserError> {
        let row = sqlx::query(
            "INSERT INTO users (email, username, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, email, username, password_hash, created_at",
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await
        .map_err(create_error)?;

        Ok(user_from_row(row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at \
             FROM users WHERE email = $1 OR username = $2 \
             ORDER BY (email = $1) DESC \
             LIMIT 1",
        )
        .bind(email)
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(user_from_row))
    }
}
