//! Body-part targeting.
//!
//! Attacks and blocks in simultaneous-round combat name one of four body
//! parts. A block only mitigates attacks aimed at the blocked part.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::rng::CombatRng;

/// Targetable body part.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Head,
    Torso,
    Stomach,
    Legs,
}

impl BodyPart {
    pub const ALL: [BodyPart; 4] = [
        BodyPart::Head,
        BodyPart::Torso,
        BodyPart::Stomach,
        BodyPart::Legs,
    ];

    /// Picks a body part uniformly at random.
    pub fn roll(rng: &mut CombatRng) -> Self {
        Self::ALL[rng.pick_index(Self::ALL.len())]
    }

    /// Stable index for per-part accumulation arrays.
    pub fn index(self) -> usize {
        match self {
            BodyPart::Head => 0,
            BodyPart::Torso => 1,
            BodyPart::Stomach => 2,
            BodyPart::Legs => 3,
        }
    }
}

/// Cumulative damage taken per body part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDamage([u64; 4]);

impl PartDamage {
    pub fn record(&mut self, part: BodyPart, amount: u32) {
        self.0[part.index()] += amount as u64;
    }

    pub fn taken(&self, part: BodyPart) -> u64 {
        self.0[part.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_covers_every_part() {
        let mut rng = CombatRng::from_seed(5);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[BodyPart::roll(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn part_damage_accumulates() {
        let mut damage = PartDamage::default();
        damage.record(BodyPart::Head, 10);
        damage.record(BodyPart::Head, 5);
        damage.record(BodyPart::Legs, 3);
        assert_eq!(damage.taken(BodyPart::Head), 15);
        assert_eq!(damage.taken(BodyPart::Torso), 0);
        assert_eq!(damage.total(), 18);
    }
}
