//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, stores, and the matchmaker so
//! callers can render a message without inspecting internals.

use thiserror::Error;
use tokio::sync::oneshot;

use combat_core::{CombatError, MatchId};

use crate::matchmaker::ApplicationId;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("need at least two participants to queue a match, got {got}")]
    TooFewParticipants { got: usize },

    #[error("match {0:?} not found")]
    MatchNotFound(MatchId),

    #[error("application {0:?} not found")]
    ApplicationNotFound(ApplicationId),

    #[error("application {0:?} has expired")]
    ApplicationExpired(ApplicationId),

    #[error("applicant already has an open application")]
    DuplicateApplication,

    #[error("zone is at capacity for open applications")]
    ZoneAtCapacity,

    #[error("not eligible to accept: {reason}")]
    NotEligible { reason: String },

    #[error("match worker command channel closed")]
    CommandChannelClosed,

    #[error("match worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
