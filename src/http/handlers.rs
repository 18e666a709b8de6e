use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::app::auth::AuthError;
use crate::app::comments::CommentError;
use crate::app::likes::LikeError;
use crate::app::photos::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::domain::comment::Comment;
use crate::domain::image::ImageId;
use crate::domain::like::LikeStatus;
use crate::domain::user::{User, UserProfile};
use crate::http::response::ApiResponse;
use crate::http::{AppError, AuthUser, MaybeAuthUser};
use crate::AppState;

const UPSTREAM_API: &str = "Unsplash";

fn parse_image_id(raw: &str) -> Result<ImageId, AppError> {
    ImageId::parse(raw).map_err(|_| AppError::bad_request("Invalid image ID format").with_field("id"))
}

fn parse_positive(raw: Option<&str>, field: &str, default: u32) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::bad_request(format!("{} must be a positive integer", field)).with_field(field)),
    }
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.likes.ping().await.is_ok();
    let cache = match &state.cache {
        Some(cache) => cache.ping().await.is_ok(),
        None => true,
    };
    let status = if db && cache { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

pub(crate) async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters").with_field("password"));
    }

    let service = state.auth_service();
    let (user, token) = service
        .register(&payload.email, &payload.username, &payload.password)
        .await
        .map_err(|err| match err {
            AuthError::Invalid { field, message } => AppError::bad_request(message).with_field(field),
            AuthError::EmailTaken => AppError::conflict("Email already exists").with_field("email"),
            AuthError::UsernameTaken => {
                AppError::conflict("Username already exists").with_field("username")
            }
            AuthError::Internal(err) => {
                tracing::error!(error = ?err, "failed to register user");
                AppError::internal("failed to register user")
            }
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            SessionResponse {
                user,
                token: token.token,
                expires_at: token.expires_at,
            },
            "User created successfully",
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let service = state.auth_service();
    let session = service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match session {
        Some((user, token)) => Ok(ApiResponse::ok(
            SessionResponse {
                user,
                token: token.token,
                expires_at: token.expires_at,
            },
            "Login successful",
        )),
        None => Err(AppError::unauthorized("Invalid email or password")),
    }
}

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let service = state.auth_service();
    let profile = service
        .get_profile(auth.user_id, state.comments.as_ref(), state.likes.as_ref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch profile");
            AppError::internal("failed to fetch profile")
        })?;

    match profile {
        Some(profile) => Ok(ApiResponse::ok(profile, "Profile loaded")),
        None => Err(AppError::not_found("User not found")),
    }
}

pub async fn refresh_token(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let token = state.auth_service().issue_token(auth.user_id).map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, "failed to refresh token");
        AppError::internal("failed to refresh token")
    })?;

    Ok(ApiResponse::ok(
        TokenResponse {
            token: token.token,
            expires_at: token.expires_at,
        },
        "Token refreshed",
    ))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

pub async fn get_likes(
    Path(id): Path<String>,
    MaybeAuthUser(auth): MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeStatus>, AppError> {
    let image_id = parse_image_id(&id)?;
    let user_id = auth.map(|auth| auth.user_id);

    let status = state
        .like_service()
        .get_like_status(&image_id, user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, image_id = %image_id, user_id = ?user_id, operation = "get_like_status", "failed to fetch likes");
            AppError::internal("Failed to fetch likes")
        })?;

    Ok(Json(status))
}

pub async fn like_image(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<LikeStatus>), AppError> {
    let image_id = parse_image_id(&id)?;

    let status = state
        .like_service()
        .like_image(&image_id, auth.user_id)
        .await
        .map_err(|err| match err {
            LikeError::AlreadyLiked => AppError::conflict("Image already liked"),
            LikeError::NotLiked => AppError::not_found("No like to remove"),
            LikeError::Storage(err) => {
                tracing::error!(error = ?err, image_id = %image_id, user_id = auth.user_id, operation = "like_image", "failed to like image");
                AppError::internal("Failed to like image")
            }
        })?;

    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn unlike_image(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeStatus>, AppError> {
    let image_id = parse_image_id(&id)?;

    let status = state
        .like_service()
        .unlike_image(&image_id, auth.user_id)
        .await
        .map_err(|err| match err {
            LikeError::NotLiked => AppError::not_found("No like to remove"),
            LikeError::AlreadyLiked => AppError::conflict("Image already liked"),
            LikeError::Storage(err) => {
                tracing::error!(error = ?err, image_id = %image_id, user_id = auth.user_id, operation = "unlike_image", "failed to unlike image");
                AppError::internal("Failed to unlike image")
            }
        })?;

    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

pub async fn list_comments(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, AppError> {
    let image_id = parse_image_id(&id)?;

    let comments = state
        .comment_service()
        .list_comments(&image_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, image_id = %image_id, "failed to fetch comments");
            AppError::internal("Failed to fetch comments")
        })?;

    Ok(ApiResponse::ok(comments, "Comments loaded"))
}

pub async fn add_comment(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), AppError> {
    let image_id = parse_image_id(&id)?;

    let comment = state
        .comment_service()
        .add_comment(&image_id, auth.user_id, &payload.content)
        .await
        .map_err(|err| match err {
            CommentError::InvalidContent => {
                AppError::bad_request("Content must be between 3 and 500 characters").with_field("content")
            }
            CommentError::Storage(err) => {
                tracing::error!(error = ?err, image_id = %image_id, user_id = auth.user_id, "failed to add comment");
                AppError::internal("Failed to add comment")
            }
        })?;

    Ok((StatusCode::CREATED, ApiResponse::ok(comment, "Comment added")))
}

// ---------------------------------------------------------------------------
// Photo proxy
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListPhotosQuery {
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchPhotosQuery {
    pub query: Option<String>,
    pub page: Option<String>,
}

pub async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<ListPhotosQuery>,
) -> Result<Json<Value>, AppError> {
    let page = parse_positive(query.page.as_deref(), "page", 1)?;
    let per_page = parse_positive(query.per_page.as_deref(), "perPage", DEFAULT_PER_PAGE)?;
    if per_page > MAX_PER_PAGE {
        return Err(AppError::bad_request("perPage must be at most 30").with_field("perPage"));
    }

    let photos = state
        .photo_service()
        .list_photos(page, per_page)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, page, per_page, "failed to fetch images");
            AppError::from_upstream(&err, UPSTREAM_API)
        })?;

    Ok(Json(photos))
}

pub async fn search_photos(
    State(state): State<AppState>,
    Query(query): Query<SearchPhotosQuery>,
) -> Result<Json<Value>, AppError> {
    let Some(search) = query.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Err(AppError::bad_request("Missing 'query' parameter").with_field("query"));
    };
    let page = parse_positive(query.page.as_deref(), "page", 1)?;

    let results = state
        .photo_service()
        .search_photos(search, page)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, page, "failed to search images");
            AppError::from_upstream(&err, UPSTREAM_API)
        })?;

    Ok(Json(results))
}

pub async fn get_photo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let image_id = parse_image_id(&id)?;

    let photo = state
        .photo_service()
        .get_photo(&image_id)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, image_id = %image_id, "failed to fetch image details");
            AppError::from_upstream(&err, UPSTREAM_API)
        })?;

    Ok(Json(photo))
}
