use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::http::AppError;
use crate::AppState;

/// Caller identity resolved from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Identity for routes where authentication is optional. Any failure to
/// resolve a caller yields `None` rather than a rejection.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?;

    let service = state.auth_service();
    let session = service.authenticate_access_token(token).map_err(|err| {
        tracing::error!(error = ?err, "failed to authenticate");
        AppError::internal("failed to authenticate")
    })?;
    let session = session.ok_or_else(|| AppError::forbidden("Invalid token"))?;

    let user = service.get_user(session.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = session.user_id, "failed to load token owner");
        AppError::internal("failed to authenticate")
    })?;
    let user = user.ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    Ok(AuthUser { user_id: user.id })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        match authenticate(parts, state).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(err) => {
                tracing::debug!(status = %err.status(), "continuing without authentication");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
