use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod response;
mod routes;

pub use auth::{AuthUser, MaybeAuthUser};
pub use error::AppError;
pub use response::ApiResponse;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::images());

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state)
}
