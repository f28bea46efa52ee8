//! Combatant identity and per-match participant state.

use serde::{Deserialize, Serialize};

use crate::action::TurnBundle;
use crate::ai::BehaviorProfile;
use crate::body::{BodyPart, PartDamage};
use crate::effect::EffectSet;
use crate::ids::{CharacterId, NpcId, ParticipantId, TeamId};
use crate::stats::StatSnapshot;

/// Who is fighting: a player character or an NPC template instance.
///
/// Exactly one identity, enforced by construction; resolution code pattern
/// matches on the variant instead of null-checking two references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combatant {
    Player(CharacterId),
    Npc(NpcId),
}

impl Combatant {
    pub fn is_player(&self) -> bool {
        matches!(self, Combatant::Player(_))
    }

    pub fn is_npc(&self) -> bool {
        matches!(self, Combatant::Npc(_))
    }

    pub fn character(&self) -> Option<CharacterId> {
        match self {
            Combatant::Player(id) => Some(*id),
            Combatant::Npc(_) => None,
        }
    }
}

/// Cumulative per-match statistics for one participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatTallies {
    pub damage_dealt: u64,
    pub damage_received: u64,
    pub hits_landed: u32,
    pub hits_blocked: u32,
    pub fatigue: f64,
}

/// Inputs needed to enroll one combatant into a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSpec {
    pub combatant: Combatant,
    pub name: String,
    pub team: TeamId,
    pub initiative: i32,
    pub level: u32,
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub hp_max: u32,
    pub mp_max: u32,
    /// Behavior override for NPCs; ignored for players.
    pub profile: Option<BehaviorProfile>,
}

/// One combatant's runtime state within a battle.
///
/// Created at battle setup, mutated every resolution round, and never
/// deleted independently of the battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub combatant: Combatant,
    pub name: String,
    pub team: TeamId,
    pub initiative: i32,
    pub level: u32,
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub hp: u32,
    pub hp_max: u32,
    pub mp: u32,
    pub mp_max: u32,
    pub part_damage: PartDamage,
    pub effects: EffectSet,
    /// Intents submitted for the current round; cleared after resolution.
    pub pending: TurnBundle,
    /// Whether this participant has submitted for the current round.
    pub submitted: bool,
    pub profile: Option<BehaviorProfile>,
    pub tallies: CombatTallies,
}

impl Participant {
    pub(crate) fn from_spec(id: ParticipantId, spec: ParticipantSpec) -> Self {
        Self {
            id,
            combatant: spec.combatant,
            name: spec.name,
            team: spec.team,
            initiative: spec.initiative,
            level: spec.level,
            attack: spec.attack,
            defense: spec.defense,
            accuracy: spec.accuracy,
            evasion: spec.evasion,
            hp: spec.hp_max,
            hp_max: spec.hp_max,
            mp: spec.mp_max,
            mp_max: spec.mp_max,
            part_damage: PartDamage::default(),
            effects: EffectSet::empty(),
            pending: TurnBundle::default(),
            submitted: false,
            profile: spec.profile,
            tallies: CombatTallies::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Current HP as a ratio of maximum.
    pub fn hp_ratio(&self) -> f64 {
        if self.hp_max == 0 {
            return 0.0;
        }
        self.hp as f64 / self.hp_max as f64
    }

    /// Point-in-time stat view with active effects folded in.
    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            level: self.level,
            attack: self.attack,
            defense: self.defense,
            accuracy: self.accuracy,
            evasion: self.evasion,
            hp: self.hp,
            hp_max: self.hp_max,
            mp: self.mp,
            mp_max: self.mp_max,
        }
        .with_effects(&self.effects)
    }

    /// Applies damage, recording per-part accumulation and tallies.
    pub fn take_damage(&mut self, amount: u32, part: Option<BodyPart>) {
        self.hp = self.hp.saturating_sub(amount);
        if let Some(part) = part {
            self.part_damage.record(part, amount);
        }
        self.tallies.damage_received += amount as u64;
    }

    /// Restores HP, clamped to maximum.
    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.hp_max);
    }

    /// Spends mana; returns false (without mutation) when short.
    pub fn spend_mp(&mut self, cost: u32) -> bool {
        if self.mp < cost {
            return false;
        }
        self.mp -= cost;
        true
    }

    /// Natural MP regeneration as a percentage of maximum.
    pub fn regen_mp(&mut self, percent: u32) {
        let gain = self.mp_max * percent / 100;
        self.mp = (self.mp + gain).min(self.mp_max);
    }

    /// Decays fatigue by the configured per-round amount, floored at zero.
    pub fn decay_fatigue(&mut self, amount: f64) {
        self.tallies.fatigue = (self.tallies.fatigue - amount).max(0.0);
    }
}
