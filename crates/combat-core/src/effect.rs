//! Timed buff/debuff bookkeeping for one participant.
//!
//! Effects are stored as serialized entries (name, total duration, remaining
//! duration, stat deltas) on the participant and advanced once per round.
//! Durations never go negative between ticks; an effect applied with
//! `duration = 0` is expired on the next tick.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Upper bound on simultaneously active effects per participant.
pub const MAX_ACTIVE_EFFECTS: usize = 16;

/// Stat deltas contributed by one effect while it is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatChanges {
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    /// HP delta applied during end-of-round upkeep (negative = damage over
    /// time, positive = regeneration).
    pub hp_per_round: i32,
}

impl StatChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Definition of an effect as carried by skills and abilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub name: String,
    /// Number of rounds the effect lasts.
    pub duration: u32,
    pub changes: StatChanges,
}

impl EffectDefinition {
    pub fn new(name: impl Into<String>, duration: u32, changes: StatChanges) -> Self {
        Self {
            name: name.into(),
            duration,
            changes,
        }
    }
}

/// One effect attached to a participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub name: String,
    pub duration: u32,
    pub remaining: u32,
    pub changes: StatChanges,
}

/// Active buffs/debuffs on one participant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSet {
    effects: ArrayVec<ActiveEffect, MAX_ACTIVE_EFFECTS>,
}

impl EffectSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends effects from definitions.
    ///
    /// Re-applying an effect with a name that is already active refreshes it:
    /// the remaining duration is extended to the longer of the two and the
    /// stat deltas are replaced. Effects past the capacity bound are dropped.
    pub fn apply(&mut self, definitions: &[EffectDefinition]) {
        for def in definitions {
            if let Some(existing) = self.effects.iter_mut().find(|e| e.name == def.name) {
                existing.remaining = existing.remaining.max(def.duration);
                existing.duration = existing.duration.max(def.duration);
                existing.changes = def.changes;
                continue;
            }
            if !self.effects.is_full() {
                self.effects.push(ActiveEffect {
                    name: def.name.clone(),
                    duration: def.duration,
                    remaining: def.duration,
                    changes: def.changes,
                });
            }
        }
    }

    /// Returns the active effects as domain objects, ready to be folded into
    /// stat calculations.
    pub fn materialized(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    /// Advances every effect by one round and prunes expired entries.
    ///
    /// Called exactly once per resolved round.
    pub fn tick(&mut self) {
        for effect in self.effects.iter_mut() {
            effect.remaining = effect.remaining.saturating_sub(1);
        }
        self.effects.retain(|e| e.remaining > 0);
    }

    /// Sum of all active stat deltas.
    pub fn total_changes(&self) -> StatChanges {
        let mut total = StatChanges::default();
        for effect in &self.effects {
            total.attack += effect.changes.attack;
            total.defense += effect.changes.defense;
            total.accuracy += effect.changes.accuracy;
            total.evasion += effect.changes.evasion;
            total.hp_per_round += effect.changes.hp_per_round;
        }
        total
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buff(name: &str, duration: u32, attack: i32) -> EffectDefinition {
        EffectDefinition::new(
            name,
            duration,
            StatChanges {
                attack,
                ..Default::default()
            },
        )
    }

    #[test]
    fn tick_decrements_and_prunes() {
        let mut set = EffectSet::empty();
        set.apply(&[buff("war_cry", 2, 5), buff("focus", 1, 2)]);
        assert_eq!(set.len(), 2);

        set.tick();
        assert_eq!(set.len(), 1);
        assert_eq!(set.total_changes().attack, 5);

        set.tick();
        assert!(set.is_empty());
    }

    #[test]
    fn zero_duration_effect_expires_on_next_tick() {
        let mut set = EffectSet::empty();
        set.apply(&[buff("flash", 0, 3)]);
        assert_eq!(set.len(), 1);
        set.tick();
        assert!(set.is_empty());
    }

    #[test]
    fn reapplying_extends_rather_than_duplicates() {
        let mut set = EffectSet::empty();
        set.apply(&[buff("war_cry", 2, 5)]);
        set.tick();
        set.apply(&[buff("war_cry", 3, 5)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.materialized().next().unwrap().remaining, 3);
    }

    #[test]
    fn total_changes_sums_across_effects() {
        let mut set = EffectSet::empty();
        set.apply(&[buff("a", 2, 5), buff("b", 2, -2)]);
        assert_eq!(set.total_changes().attack, 3);
    }
}
