use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

use crate::infra::unsplash::UpstreamError;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    field: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Maps a failed proxy call to the photo API onto a client-facing error.
    pub fn from_upstream(err: &UpstreamError, api: &str) -> Self {
        match err {
            UpstreamError::Status { status: 401 } => {
                Self::unavailable(format!("{} API authentication failed", api))
            }
            UpstreamError::Status { status: 403 } => {
                Self::unavailable(format!("{} API access forbidden", api))
            }
            UpstreamError::Status { status: 404 } => Self::not_found("Resource not found"),
            UpstreamError::Status { status: 429 } => {
                Self::rate_limited(format!("{} API rate limit exceeded", api))
            }
            UpstreamError::Status { status } if *status >= 500 => {
                Self::unavailable(format!("{} API is currently unavailable", api))
            }
            UpstreamError::Status { .. } => Self::bad_request(format!("Invalid request to {} API", api)),
            UpstreamError::Transport(_) | UpstreamError::Url(_) => {
                Self::unavailable(format!("Failed to connect to {} API", api))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            success: false,
            message: self.message,
            field: self.field,
            timestamp: OffsetDateTime::now_utc(),
        });
        (self.status, body).into_response()
    }
}
