use std::sync::atomic::{AtomicU64, Ordering};

use crate::client::api::{ApiError, LikeApi};
use crate::client::state::{apply, revert, LikeIntent, LikeState, Phase};
use crate::domain::image::ImageId;
use crate::domain::like::LikeStatus;

/// A signed-in user's credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
}

/// Authentication handed to the controller at each call site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    session: Option<Session>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn signed_in(user_id: i64, token: impl Into<String>) -> Self {
        Self {
            session: Some(Session {
                user_id,
                token: token.into(),
            }),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    /// The caller should prompt for login; nothing was sent.
    #[error("login required")]
    LoginRequired,
    #[error("a like toggle is already in flight")]
    AlreadyPending,
    /// The ticket was abandoned, already completed, or issued by another
    /// controller. State is left untouched.
    #[error("toggle ticket is not the one in flight")]
    UnknownTicket,
    #[error(transparent)]
    Rejected(#[from] ApiError),
}

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// An optimistic toggle that has been applied locally and still needs its
/// server round-trip. Produced by [`LikeController::begin_toggle`].
#[derive(Debug)]
#[must_use = "a pending toggle leaves the controller in Pending until completed or abandoned"]
pub struct PendingToggle {
    ticket: u64,
    image_id: ImageId,
    snapshot: LikeState,
    intent: LikeIntent,
    session: Session,
}

impl PendingToggle {
    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    pub fn snapshot(&self) -> LikeState {
        self.snapshot
    }

    pub fn intent(&self) -> LikeIntent {
        self.intent
    }

    /// Sends the server call matching the pre-toggle flag: an image that
    /// was liked gets unliked and vice versa.
    pub async fn dispatch<A: LikeApi + ?Sized>(&self, api: &A) -> Result<LikeStatus, ApiError> {
        if self.snapshot.is_liked {
            api.unlike_image(&self.image_id, &self.session.token).await
        } else {
            api.like_image(&self.image_id, &self.session.token).await
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    snapshot: LikeState,
}

/// Per-image like state with optimistic toggling.
///
/// Toggles go Settled -> Pending -> Settled on success, adopting the
/// server's count, or Settled -> Pending -> Reverting -> Settled on
/// failure, restoring the exact pre-toggle snapshot. Only one toggle may be
/// in flight at a time. An abandoned toggle also restores the snapshot, and
/// its late answer is ignored.
#[derive(Debug, Clone)]
pub struct LikeController {
    image_id: ImageId,
    state: LikeState,
    phase: Phase,
    in_flight: Option<InFlight>,
}

impl LikeController {
    pub fn new(image_id: ImageId, seed: LikeState) -> Self {
        Self {
            image_id,
            state: LikeState::new(seed.is_liked, seed.likes_count),
            phase: Phase::Settled,
            in_flight: None,
        }
    }

    /// Seeds a controller from the server's current status.
    pub async fn load<A: LikeApi + ?Sized>(
        api: &A,
        auth: &AuthContext,
        image_id: ImageId,
    ) -> Result<Self, ApiError> {
        let status = api.get_like_status(&image_id, auth.token()).await?;
        Ok(Self::new(image_id, status.into()))
    }

    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    pub fn state(&self) -> LikeState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Pending
    }

    /// Adopts a server status if no toggle is in flight. Returns whether it
    /// was applied.
    pub fn reconcile(&mut self, status: LikeStatus) -> bool {
        if self.phase != Phase::Settled {
            return false;
        }
        self.state = status.into();
        true
    }

    /// Fetches the current status and reconciles with it.
    pub async fn refresh<A: LikeApi + ?Sized>(
        &mut self,
        api: &A,
        auth: &AuthContext,
    ) -> Result<LikeState, ApiError> {
        let status = api.get_like_status(&self.image_id, auth.token()).await?;
        if !self.reconcile(status) {
            tracing::debug!(image_id = %self.image_id, "ignoring fetched like status while a toggle is pending");
        }
        Ok(self.state)
    }

    /// Applies the optimistic toggle and moves to Pending. Nothing changes
    /// when the caller is anonymous or a toggle is already in flight.
    pub fn begin_toggle(&mut self, auth: &AuthContext) -> Result<PendingToggle, ToggleError> {
        let session = auth.session().cloned().ok_or(ToggleError::LoginRequired)?;
        if self.phase != Phase::Settled {
            return Err(ToggleError::AlreadyPending);
        }

        let snapshot = self.state;
        let intent = LikeIntent::toggling(snapshot);
        let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        self.state = apply(snapshot, intent);
        self.phase = Phase::Pending;
        self.in_flight = Some(InFlight { ticket, snapshot });
        tracing::debug!(image_id = %self.image_id, ?intent, likes = self.state.likes_count, "optimistic like applied");

        Ok(PendingToggle {
            ticket,
            image_id: self.image_id.clone(),
            snapshot,
            intent,
            session,
        })
    }

    fn owns(&self, pending: &PendingToggle) -> bool {
        self.phase == Phase::Pending
            && pending.image_id == self.image_id
            && self
                .in_flight
                .is_some_and(|in_flight| in_flight.ticket == pending.ticket)
    }

    /// Settles a pending toggle with the server's answer. A ticket that is
    /// not the one in flight is refused with `UnknownTicket`.
    pub fn complete_toggle(
        &mut self,
        pending: PendingToggle,
        outcome: Result<LikeStatus, ApiError>,
    ) -> Result<LikeState, ToggleError> {
        if !self.owns(&pending) {
            tracing::debug!(image_id = %self.image_id, "ignoring completion for a toggle that is not in flight");
            return Err(ToggleError::UnknownTicket);
        }
        self.in_flight = None;

        match outcome {
            Ok(status) => {
                self.state = status.into();
                self.phase = Phase::Settled;
                Ok(self.state)
            }
            Err(err) => {
                self.phase = Phase::Reverting;
                self.state = revert(pending.snapshot);
                self.phase = Phase::Settled;
                tracing::warn!(error = %err, image_id = %self.image_id, intent = ?pending.intent, "like toggle failed, reverted");
                Err(ToggleError::Rejected(err))
            }
        }
    }

    /// Gives up on the in-flight toggle, restoring the pre-toggle snapshot
    /// so the next refresh reconciles. Works whether or not the ticket is
    /// still held; a later completion with it is refused. Returns whether a
    /// toggle was in flight.
    pub fn abandon(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };
        self.phase = Phase::Reverting;
        self.state = revert(in_flight.snapshot);
        self.phase = Phase::Settled;
        tracing::debug!(image_id = %self.image_id, "in-flight like toggle abandoned");
        true
    }

    /// Full toggle: optimistic apply, server call, then reconcile or revert.
    /// Dropping the future before it resolves abandons the toggle.
    pub async fn toggle<A: LikeApi + ?Sized>(
        &mut self,
        api: &A,
        auth: &AuthContext,
    ) -> Result<LikeState, ToggleError> {
        let pending = self.begin_toggle(auth)?;
        let mut guard = AbandonOnDrop {
            controller: self,
            pending: Some(pending),
        };
        let outcome = match &guard.pending {
            Some(pending) => pending.dispatch(api).await,
            None => return Err(ToggleError::UnknownTicket),
        };
        match guard.pending.take() {
            Some(pending) => guard.controller.complete_toggle(pending, outcome),
            None => Err(ToggleError::UnknownTicket),
        }
    }
}

struct AbandonOnDrop<'a> {
    controller: &'a mut LikeController,
    pending: Option<PendingToggle>,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if self.pending.take().is_some() {
            self.controller.abandon();
        }
    }
}
