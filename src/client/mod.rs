//! Client-side like handling.
//!
//! [`LikeController`] keeps one image's `{ isLiked, likesCount }` view,
//! applies toggles optimistically and reconciles against the server through
//! a [`LikeApi`]. [`HttpLikeApi`] talks to the `/api/images/:id/like(s)`
//! endpoints.

mod api;
mod controller;
mod state;

pub use api::{ApiError, HttpLikeApi, LikeApi};
pub use controller::{AuthContext, LikeController, PendingToggle, Session, ToggleError};
pub use state::{apply, revert, LikeIntent, LikeState, Phase};
