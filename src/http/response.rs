use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

/// `{ success: true, message, data, timestamp }`
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
            timestamp: OffsetDateTime::now_utc(),
        })
    }
}
