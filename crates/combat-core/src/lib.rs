//! Deterministic combat resolution for a persistent multiplayer RPG.
//!
//! `combat-core` defines the canonical rules: damage and crit formulas,
//! single-turn resolution, effect bookkeeping, NPC decision-making, the two
//! match state machines (real-time alternating and simultaneous rounds),
//! the Elo ladder, and reward distribution. Everything here is pure given a
//! seeded RNG — no I/O, no clocks, no global random state — so a fixed seed
//! reproduces an identical fight and the whole crate is testable without a
//! runtime.
//!
//! State mutation flows through [`processor::MatchEngine`] and
//! [`round::RoundEngine`]; the async orchestration around them lives in the
//! `combat-runtime` crate.

pub mod action;
pub mod ai;
pub mod battle;
pub mod body;
pub mod combatant;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod formula;
pub mod ids;
pub mod log;
pub mod npc;
pub mod processor;
pub mod rating;
pub mod rewards;
pub mod rng;
pub mod round;
pub mod stats;
pub mod turn;

pub use action::{AttackIntent, PlayerAction, SkillIntent, SkillKind, SkillSpec, TurnBundle};
pub use ai::{BehaviorProfile, NpcDecision};
pub use battle::{Battle, BattleKind, BattleStatus, CombatMode, MatchOutcome};
pub use body::{BodyPart, PartDamage};
pub use combatant::{CombatTallies, Combatant, Participant, ParticipantSpec};
pub use config::CombatConfig;
pub use effect::{ActiveEffect, EffectDefinition, EffectSet, StatChanges};
pub use error::CombatError;
pub use event::{MatchEvent, ParticipantResult};
pub use formula::{AttackOutcome, AttackResult};
pub use ids::{CharacterId, MatchId, NpcId, ParticipantId, TeamId, ZoneId};
pub use log::{CombatLog, CombatLogEntry, LogLine};
pub use npc::NpcTemplate;
pub use processor::{ActionReport, MatchClose, MatchEngine};
pub use rating::{LadderKind, RatingRecord};
pub use rewards::{ItemDrop, ItemRarity, MatchFormat, RewardGrant, RewardTable};
pub use rng::{CombatRng, compute_seed};
pub use round::{RoundEngine, RoundReport, SubmitOutcome};
pub use stats::StatSnapshot;
pub use turn::{AbilityRef, TurnOutcome, resolve_turn};
