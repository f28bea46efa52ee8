//! Error taxonomy for combat operations.
//!
//! Every failure carries a human-readable reason and guarantees that no
//! state was mutated. Callers surface the message directly; they never need
//! to inspect internals to render UI state.

use crate::battle::BattleStatus;
use crate::ids::ParticipantId;

/// Validation and state-machine failures raised by combat operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CombatError {
    #[error("match is {status:?}, not active")]
    NotActive { status: BattleStatus },

    #[error("match is {status:?} and cannot be started")]
    NotStartable { status: BattleStatus },

    #[error("match has already ended")]
    AlreadyEnded,

    #[error("{id} is not a participant of this match")]
    UnknownParticipant { id: ParticipantId },

    #[error("{name} has been defeated and cannot act")]
    Defeated { name: String },

    #[error("action-point cost {cost} exceeds the budget of {budget}")]
    InsufficientActionPoints { cost: u32, budget: u32 },

    #[error("mana cost {cost} exceeds available MP {available}")]
    InsufficientMana { cost: u32, available: u32 },

    #[error("round is not ready: waiting on {waiting} submission(s)")]
    RoundNotReady { waiting: usize },

    #[error("no living target available")]
    NoLivingTarget,

    #[error("target {id} is invalid for this action")]
    InvalidTarget { id: ParticipantId },
}
