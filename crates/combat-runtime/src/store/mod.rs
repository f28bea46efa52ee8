//! Persistence collaborator contracts.
//!
//! The combat core reaches character/NPC stat records, ratings, and
//! inventory through these traits as plain synchronous calls; the only
//! contract beyond success/failure is the read-modify-write discipline in
//! the default methods, which re-read current state immediately before
//! mutating to avoid lost updates.
//!
//! Failures surface as [`StoreError`] and are never retried automatically.

mod memory;

pub use memory::{InMemoryCharacterStore, InMemoryNpcStore, InMemoryRatingStore};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use combat_core::{
    CharacterId, Combatant, ItemDrop, LadderKind, NpcId, NpcTemplate, ParticipantSpec,
    RatingRecord, TeamId,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("character {0:?} not found")]
    CharacterNotFound(CharacterId),

    #[error("npc template {0:?} not found")]
    NpcNotFound(NpcId),

    #[error("no npc template available to sample")]
    NoNpcAvailable,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistent character record as the combat core sees it: stat fields,
/// progression, and inventory. Equipped bonuses are already folded into the
/// stat numbers by the owning system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub gold: u64,
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub hp_max: u32,
    pub mp_max: u32,
    pub items: Vec<ItemDrop>,
}

impl CharacterRecord {
    /// Builds an enrollment spec for this character on the given team.
    pub fn to_spec(&self, team: TeamId, initiative: i32) -> ParticipantSpec {
        ParticipantSpec {
            combatant: Combatant::Player(self.id),
            name: self.name.clone(),
            team,
            initiative,
            level: self.level,
            attack: self.attack,
            defense: self.defense,
            accuracy: self.accuracy,
            evasion: self.evasion,
            hp_max: self.hp_max,
            mp_max: self.mp_max,
            profile: None,
        }
    }
}

/// Character stat and inventory access.
pub trait CharacterStore: Send + Sync {
    fn get(&self, id: CharacterId) -> Result<CharacterRecord, StoreError>;

    fn put(&self, record: CharacterRecord) -> Result<(), StoreError>;

    /// Grants (or removes, for negative deltas) experience. XP never goes
    /// below zero.
    fn add_xp(&self, id: CharacterId, delta: i64) -> Result<(), StoreError> {
        let mut record = self.get(id)?;
        record.xp = if delta.is_negative() {
            record.xp.saturating_sub(delta.unsigned_abs())
        } else {
            record.xp + delta as u64
        };
        self.put(record)
    }

    fn add_gold(&self, id: CharacterId, amount: u64) -> Result<(), StoreError> {
        let mut record = self.get(id)?;
        record.gold += amount;
        self.put(record)
    }

    fn add_item(&self, id: CharacterId, item: ItemDrop) -> Result<(), StoreError> {
        let mut record = self.get(id)?;
        record.items.push(item);
        self.put(record)
    }

    /// Applies the post-defeat trauma penalty: a proportional XP loss.
    /// Returns the amount removed.
    fn apply_trauma(&self, id: CharacterId, percent: u32) -> Result<u64, StoreError> {
        let mut record = self.get(id)?;
        let loss = record.xp * percent.min(100) as u64 / 100;
        record.xp -= loss;
        self.put(record)?;
        Ok(loss)
    }
}

/// NPC template access and sampling for PvE pairing.
pub trait NpcStore: Send + Sync {
    fn template(&self, id: NpcId) -> Result<NpcTemplate, StoreError>;

    /// Picks a template suitable for an opponent of the given level.
    fn sample(&self, level: u32) -> Result<NpcTemplate, StoreError>;
}

/// Ladder rating access. Absent records read as the initial rating.
pub trait RatingStore: Send + Sync {
    fn get(&self, id: CharacterId, ladder: LadderKind) -> Result<RatingRecord, StoreError>;

    fn put(
        &self,
        id: CharacterId,
        ladder: LadderKind,
        record: RatingRecord,
    ) -> Result<(), StoreError>;
}
