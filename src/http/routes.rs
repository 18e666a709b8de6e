use axum::{routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/profile", get(handlers::get_profile))
        .route("/auth/refresh", post(handlers::refresh_token))
}

pub fn images() -> Router<AppState> {
    Router::new()
        .route("/images", get(handlers::list_photos))
        .route("/images/search", get(handlers::search_photos))
        .route("/images/:id/details", get(handlers::get_photo))
        .route("/images/:id/likes", get(handlers::get_likes))
        .route(
            "/images/:id/like",
            post(handlers::like_image).delete(handlers::unlike_image),
        )
        .route(
            "/images/:id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
}
