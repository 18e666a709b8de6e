pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::likes::LikeService;
use crate::app::photos::PhotoService;
use crate::domain::repository::{CommentRepository, LikeRepository, UserRepository};
use crate::infra::cache::RedisCache;
use crate::infra::unsplash::PhotoProvider;

#[derive(Clone)]
pub struct AppState {
    pub likes: Arc<dyn LikeRepository>,
    pub users: Arc<dyn UserRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub photos: Arc<dyn PhotoProvider>,
    pub cache: Option<RedisCache>,
    pub photo_cache_ttl_seconds: u64,
    pub mirror_upstream_likes: bool,
    pub paseto_access_key: [u8; 32],
    pub auth_token_ttl_hours: u64,
}

impl AppState {
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.users.clone(),
            self.paseto_access_key,
            self.auth_token_ttl_hours,
        )
    }

    pub fn like_service(&self) -> LikeService {
        let mirror = self.mirror_upstream_likes.then(|| self.photos.clone());
        LikeService::new(self.likes.clone(), mirror)
    }

    pub fn comment_service(&self) -> CommentService {
        CommentService::new(self.comments.clone())
    }

    pub fn photo_service(&self) -> PhotoService {
        PhotoService::new(
            self.photos.clone(),
            self.cache.clone(),
            self.photo_cache_ttl_seconds,
        )
    }
}
