//! Typed events produced by combat operations.
//!
//! Domain operations return events instead of broadcasting as a side
//! effect; a thin runtime adapter performs the actual publish. This keeps
//! the state machines testable without a live channel.
//!
//! Consumers must treat unknown event kinds as ignorable — the enum is
//! `#[non_exhaustive]` so new kinds can be added without breaking them.

use serde::{Deserialize, Serialize};

use crate::battle::MatchOutcome;
use crate::ids::{MatchId, ParticipantId, TeamId};
use crate::rewards::ItemDrop;

/// Per-participant final line of a match result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub participant: ParticipantId,
    pub name: String,
    pub outcome: MatchOutcome,
    pub rating_delta: i32,
    pub xp: i64,
    pub gold: u64,
    pub items: Vec<ItemDrop>,
}

/// Event published to a match channel (mirrored to spectators).
///
/// Payload fields are flat values: ids, names, action labels, damage
/// numbers, flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MatchEvent {
    Countdown {
        match_id: MatchId,
        seconds: u32,
    },
    MatchStart {
        match_id: MatchId,
    },
    CombatAction {
        match_id: MatchId,
        actor: ParticipantId,
        actor_name: String,
        target: Option<ParticipantId>,
        target_name: Option<String>,
        action: String,
        damage: u32,
        critical: bool,
    },
    HpUpdate {
        match_id: MatchId,
        participant: ParticipantId,
        name: String,
        hp: u32,
        hp_max: u32,
    },
    NpcCombatAction {
        match_id: MatchId,
        actor: ParticipantId,
        actor_name: String,
        target: Option<ParticipantId>,
        target_name: Option<String>,
        action: String,
        damage: u32,
        critical: bool,
    },
    NpcDefeated {
        match_id: MatchId,
        participant: ParticipantId,
        name: String,
    },
    MatchResult {
        match_id: MatchId,
        winner: Option<TeamId>,
        results: Vec<ParticipantResult>,
    },
    SystemMessage {
        match_id: MatchId,
        message: String,
    },
}

impl MatchEvent {
    /// Builds a combat-action event, choosing the NPC variant when the
    /// actor is an NPC.
    pub fn action(
        match_id: MatchId,
        actor: &crate::combatant::Participant,
        target: Option<&crate::combatant::Participant>,
        action: &str,
        damage: u32,
        critical: bool,
    ) -> Self {
        let target_id = target.map(|t| t.id);
        let target_name = target.map(|t| t.name.clone());
        if actor.combatant.is_npc() {
            MatchEvent::NpcCombatAction {
                match_id,
                actor: actor.id,
                actor_name: actor.name.clone(),
                target: target_id,
                target_name,
                action: action.to_string(),
                damage,
                critical,
            }
        } else {
            MatchEvent::CombatAction {
                match_id,
                actor: actor.id,
                actor_name: actor.name.clone(),
                target: target_id,
                target_name,
                action: action.to_string(),
                damage,
                critical,
            }
        }
    }

    /// Builds an HP-update event from a participant's current state.
    pub fn hp(match_id: MatchId, participant: &crate::combatant::Participant) -> Self {
        MatchEvent::HpUpdate {
            match_id,
            participant: participant.id,
            name: participant.name.clone(),
            hp: participant.hp,
            hp_max: participant.hp_max,
        }
    }

    /// The match this event belongs to; used for channel routing.
    pub fn match_id(&self) -> MatchId {
        match self {
            MatchEvent::Countdown { match_id, .. }
            | MatchEvent::MatchStart { match_id }
            | MatchEvent::CombatAction { match_id, .. }
            | MatchEvent::HpUpdate { match_id, .. }
            | MatchEvent::NpcCombatAction { match_id, .. }
            | MatchEvent::NpcDefeated { match_id, .. }
            | MatchEvent::MatchResult { match_id, .. }
            | MatchEvent::SystemMessage { match_id, .. } => *match_id,
        }
    }
}
