//! Stat snapshots for combat resolution.
//!
//! A snapshot captures a combatant's numbers at action initiation and is
//! immutable afterwards, so resolution stays deterministic regardless of
//! state changes made mid-round.

use serde::{Deserialize, Serialize};

use crate::effect::EffectSet;

/// Point-in-time view of one combatant's stats.
///
/// Equipped bonuses are already folded in when the snapshot is built from
/// persistence; active effects are folded in by [`StatSnapshot::with_effects`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub level: u32,
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub hp: u32,
    pub hp_max: u32,
    pub mp: u32,
    pub mp_max: u32,
}

impl StatSnapshot {
    /// Returns a copy with active effect deltas applied.
    ///
    /// HP/MP are not touched here; over-time changes are handled by round
    /// upkeep, not by stat folding.
    pub fn with_effects(mut self, effects: &EffectSet) -> Self {
        let changes = effects.total_changes();
        self.attack += changes.attack;
        self.defense += changes.defense;
        self.accuracy += changes.accuracy;
        self.evasion += changes.evasion;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Current HP as a ratio of maximum, in `[0.0, 1.0]`.
    pub fn hp_ratio(&self) -> f64 {
        if self.hp_max == 0 {
            return 0.0;
        }
        self.hp as f64 / self.hp_max as f64
    }

    pub fn has_mp(&self, cost: u32) -> bool {
        self.mp >= cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectDefinition, StatChanges};

    fn base() -> StatSnapshot {
        StatSnapshot {
            level: 10,
            attack: 20,
            defense: 12,
            accuracy: 8,
            evasion: 6,
            hp: 80,
            hp_max: 100,
            mp: 30,
            mp_max: 50,
        }
    }

    #[test]
    fn effects_fold_into_snapshot() {
        let mut effects = EffectSet::empty();
        effects.apply(&[EffectDefinition::new(
            "war_cry",
            2,
            StatChanges {
                attack: 5,
                defense: -3,
                ..Default::default()
            },
        )]);

        let snapshot = base().with_effects(&effects);
        assert_eq!(snapshot.attack, 25);
        assert_eq!(snapshot.defense, 9);
        // Untouched fields pass through
        assert_eq!(snapshot.hp, 80);
    }

    #[test]
    fn hp_ratio_handles_zero_max() {
        let mut snapshot = base();
        snapshot.hp_max = 0;
        assert_eq!(snapshot.hp_ratio(), 0.0);

        let snapshot = base();
        assert!((snapshot.hp_ratio() - 0.8).abs() < f64::EPSILON);
    }
}
