#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tower::ServiceExt;

use pinboard::app::auth::hash_password;
use pinboard::domain::comment::Comment;
use pinboard::domain::image::ImageId;
use pinboard::domain::like::Like;
use pinboard::domain::repository::{
    CommentRepository, CreateUserError, LikeRepository, UserRepository,
};
use pinboard::domain::user::User;
use pinboard::infra::unsplash::{PhotoProvider, UpstreamError};
use pinboard::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// test-only key
pub const TEST_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const DEFAULT_PASSWORD: &str = "testpassword123";
pub const IMAGE_ID: &str = "Dwu85P9SOIk";
pub const OTHER_IMAGE_ID: &str = "abc_DEF-123xyz";

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLikes {
    rows: Mutex<Vec<Like>>,
    next_id: AtomicI64,
    failing: AtomicBool,
    failing_counts: AtomicBool,
    stale_exists: Mutex<Option<bool>>,
}

impl MemoryLikes {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fails only `count_for_image`.
    pub fn set_failing_counts(&self, failing: bool) {
        self.failing_counts.store(failing, Ordering::SeqCst);
    }

    /// Makes `exists` answer `answer` regardless of the stored rows, as if
    /// another request changed the row between the read and the write.
    pub fn set_stale_exists(&self, answer: Option<bool>) {
        *self.stale_exists.lock().unwrap() = answer;
    }

    fn has_row(&self, image_id: &ImageId, user_id: i64) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|like| like.image_id == image_id.as_str() && like.user_id == user_id)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("storage offline"));
        }
        Ok(())
    }

    pub fn rows_for(&self, image_id: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|like| like.image_id == image_id)
            .count()
    }
}

#[async_trait]
impl LikeRepository for MemoryLikes {
    async fn count_for_image(&self, image_id: &ImageId) -> Result<i64> {
        self.check()?;
        if self.failing_counts.load(Ordering::SeqCst) {
            return Err(anyhow!("count query failed"));
        }
        Ok(self.rows_for(image_id.as_str()) as i64)
    }

    async fn exists(&self, image_id: &ImageId, user_id: i64) -> Result<bool> {
        self.check()?;
        if let Some(answer) = *self.stale_exists.lock().unwrap() {
            return Ok(answer);
        }
        Ok(self.has_row(image_id, user_id))
    }

    async fn insert(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>> {
        self.check()?;
        if self.has_row(image_id, user_id) {
            return Ok(None);
        }
        let like = Like {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            image_id: image_id.to_string(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(like);
        Ok(Some(self.rows_for(image_id.as_str()) as i64))
    }

    async fn delete(&self, image_id: &ImageId, user_id: i64) -> Result<Option<i64>> {
        self.check()?;
        let removed = {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|like| !(like.image_id == image_id.as_str() && like.user_id == user_id));
            rows.len() < before
        };
        Ok(removed.then(|| self.rows_for(image_id.as_str()) as i64))
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|like| like.user_id == user_id)
            .count() as i64)
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
    next_id: AtomicI64,
    stale_lookup: AtomicBool,
}

impl MemoryUsers {
    /// Makes the duplicate pre-check see no users, as if a concurrent
    /// registration committed right after it.
    pub fn set_stale_lookup(&self, stale: bool) {
        self.stale_lookup.store(stale, Ordering::SeqCst);
    }

    pub fn remove(&self, id: i64) {
        self.rows.lock().unwrap().retain(|user| user.id != id);
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, CreateUserError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|user| user.email == email) {
            return Err(CreateUserError::EmailTaken);
        }
        if rows.iter().any(|user| user.username == username) {
            return Err(CreateUserError::UsernameTaken);
        }
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>> {
        if self.stale_lookup.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let rows = self.rows.lock().unwrap();
        let by_email = rows.iter().find(|user| user.email == email);
        let by_username = rows.iter().find(|user| user.username == username);
        Ok(by_email.or(by_username).cloned())
    }
}

#[derive(Default)]
pub struct MemoryComments {
    rows: Mutex<Vec<Comment>>,
    next_id: AtomicI64,
}

#[async_trait]
impl CommentRepository for MemoryComments {
    async fn list_for_image(&self, image_id: &ImageId) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| comment.image_id == image_id.as_str())
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn insert(&self, image_id: &ImageId, user_id: i64, content: &str) -> Result<Comment> {
        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            image_id: image_id.to_string(),
            user_id,
            content: content.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| comment.user_id == user_id)
            .count() as i64)
    }
}

// ---------------------------------------------------------------------------
// Fake photo API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMode {
    Healthy,
    Failing(u16),
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCall {
    List { page: u32, per_page: u32 },
    Search { query: String, page: u32 },
    Get(String),
    Like(String),
    Unlike(String),
}

pub struct FakePhotos {
    mode: Mutex<UpstreamMode>,
    calls: Mutex<Vec<UpstreamCall>>,
}

impl Default for FakePhotos {
    fn default() -> Self {
        Self {
            mode: Mutex::new(UpstreamMode::Healthy),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakePhotos {
    pub fn set_mode(&self, mode: UpstreamMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond<T>(&self, call: UpstreamCall, value: T) -> Result<T, UpstreamError> {
        self.calls.lock().unwrap().push(call);
        let mode = *self.mode.lock().unwrap();
        match mode {
            UpstreamMode::Healthy => Ok(value),
            UpstreamMode::Failing(status) => Err(UpstreamError::Status { status }),
            UpstreamMode::Stalled => std::future::pending().await,
        }
    }

    /// Waits until `predicate` holds for the recorded calls.
    pub async fn wait_for(&self, predicate: impl Fn(&[UpstreamCall]) -> bool) -> bool {
        let poll = async {
            loop {
                if predicate(&self.calls()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), poll).await.is_ok()
    }
}

#[async_trait]
impl PhotoProvider for FakePhotos {
    async fn list_photos(&self, page: u32, per_page: u32) -> Result<Value, UpstreamError> {
        let body = json!([{ "id": IMAGE_ID, "likes": 12 }, { "id": OTHER_IMAGE_ID, "likes": 3 }]);
        self.respond(UpstreamCall::List { page, per_page }, body).await
    }

    async fn search_photos(&self, query: &str, page: u32) -> Result<Value, UpstreamError> {
        let body = json!({ "total": 1, "total_pages": 1, "results": [{ "id": IMAGE_ID }] });
        self.respond(
            UpstreamCall::Search {
                query: query.to_string(),
                page,
            },
            body,
        )
        .await
    }

    async fn get_photo(&self, id: &ImageId) -> Result<Value, UpstreamError> {
        let body = json!({ "id": id.as_str(), "likes": 12, "urls": { "small": "https://images.example/s.jpg" } });
        self.respond(UpstreamCall::Get(id.to_string()), body).await
    }

    async fn like_photo(&self, id: &ImageId) -> Result<(), UpstreamError> {
        self.respond(UpstreamCall::Like(id.to_string()), ()).await
    }

    async fn unlike_photo(&self, id: &ImageId) -> Result<(), UpstreamError> {
        self.respond(UpstreamCall::Unlike(id.to_string()), ()).await
    }
}

// ---------------------------------------------------------------------------
// TestApp
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub likes: Arc<MemoryLikes>,
    pub users: Arc<MemoryUsers>,
    pub comments: Arc<MemoryComments>,
    pub photos: Arc<FakePhotos>,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["message"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub access_token: String,
}

/// A fresh app with empty in-memory storage and a healthy fake upstream.
pub fn app() -> TestApp {
    TestApp::new()
}

impl TestApp {
    pub fn new() -> Self {
        let likes = Arc::new(MemoryLikes::default());
        let users = Arc::new(MemoryUsers::default());
        let comments = Arc::new(MemoryComments::default());
        let photos = Arc::new(FakePhotos::default());

        let state = AppState {
            likes: likes.clone(),
            users: users.clone(),
            comments: comments.clone(),
            photos: photos.clone(),
            cache: None,
            photo_cache_ttl_seconds: 60,
            mirror_upstream_likes: true,
            paseto_access_key: TEST_ACCESS_KEY,
            auth_token_ttl_hours: 1,
        };

        let router = pinboard::http::router(state.clone());

        TestApp {
            router,
            state,
            likes,
            users,
            comments,
            photos,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, None, token).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, Some(body), token).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, None, token).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, None, token).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let auth = token.map(|t| format!("Bearer {}", t));
        let mut headers = vec![];
        if let Some(auth) = auth.as_deref() {
            headers.push(("Authorization", auth));
        }
        self.request(method, path, body, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Create a user directly in storage and issue an access token for it.
    pub async fn create_user(&self, suffix: &str) -> TestUser {
        let username = format!("testuser_{}", suffix);
        let email = format!("test_{}@example.com", suffix);
        let hash = hash_password(DEFAULT_PASSWORD).expect("password hash failed");

        let user = self
            .state
            .users
            .create(&email, &username, &hash)
            .await
            .expect("insert test user failed");

        let token = self
            .state
            .auth_service()
            .issue_token(user.id)
            .expect("issue_token failed");

        TestUser {
            id: user.id,
            username,
            email,
            access_token: token.token,
        }
    }
}

/// Runs `future` with a deadline so a blocked code path fails the test
/// instead of hanging it.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("operation did not complete in time")
}

pub fn likes_path(image_id: &str) -> String {
    format!("/api/images/{}/likes", image_id)
}

pub fn like_path(image_id: &str) -> String {
    format!("/api/images/{}/like", image_id)
}

pub fn comments_path(image_id: &str) -> String {
    format!("/api/images/{}/comments", image_id)
}
