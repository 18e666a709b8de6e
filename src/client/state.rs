use crate::domain::like::LikeStatus;

/// What the UI shows for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    pub is_liked: bool,
    pub likes_count: i64,
}

impl LikeState {
    pub fn new(is_liked: bool, likes_count: i64) -> Self {
        Self {
            is_liked,
            likes_count: likes_count.max(0),
        }
    }
}

impl From<LikeStatus> for LikeState {
    fn from(status: LikeStatus) -> Self {
        Self::new(status.is_liked, status.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Local state equals the last known server state.
    Settled,
    /// A toggle is in flight and its intended result is already shown.
    Pending,
    /// The in-flight toggle failed and the snapshot is being restored.
    Reverting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeIntent {
    Like,
    Unlike,
}

impl LikeIntent {
    /// The direction a toggle takes from `state`.
    pub fn toggling(state: LikeState) -> Self {
        if state.is_liked {
            Self::Unlike
        } else {
            Self::Like
        }
    }
}

/// Optimistic result of applying `intent` to `snapshot`. The count never
/// drops below zero.
pub fn apply(snapshot: LikeState, intent: LikeIntent) -> LikeState {
    match intent {
        LikeIntent::Like => LikeState {
            is_liked: true,
            likes_count: snapshot.likes_count.saturating_add(1),
        },
        LikeIntent::Unlike => LikeState {
            is_liked: false,
            likes_count: snapshot.likes_count.saturating_sub(1).max(0),
        },
    }
}

pub fn revert(snapshot: LikeState) -> LikeState {
    snapshot
}
