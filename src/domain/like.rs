use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub image_id: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Aggregate like count for an image plus whether the caller liked it.
///
/// Serialized as `{ "likes": n, "isLiked": bool }`, which is the shape both
/// the server emits and the client controller consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    #[serde(rename = "likes")]
    pub count: i64,
    pub is_liked: bool,
}

impl LikeStatus {
    pub fn new(count: i64, is_liked: bool) -> Self {
        Self { count, is_liked }
    }
}
