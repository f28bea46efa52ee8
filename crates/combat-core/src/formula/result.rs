//! Complete attack resolution (hit check + crit + damage).

use serde::{Deserialize, Serialize};

use crate::body::BodyPart;
use crate::config::CombatConfig;
use crate::rng::CombatRng;
use crate::stats::StatSnapshot;

use super::damage::{calculate_damage, crit_multiplier};
use super::hit::check_hit;

/// Outcome of an attack attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    Miss,
    Hit,
    Critical,
}

/// Result of one resolved attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub outcome: AttackOutcome,
    /// Damage dealt (None on a miss).
    pub damage: Option<u32>,
}

impl AttackResult {
    pub fn connected(&self) -> bool {
        self.outcome != AttackOutcome::Miss
    }

    pub fn is_critical(&self) -> bool {
        self.outcome == AttackOutcome::Critical
    }
}

/// Resolve one attack: hit roll, then crit roll, then damage with the
/// body-part multiplier applied.
///
/// RNG advance order is fixed (hit, crit, variance), so a given seed
/// produces an identical result.
pub fn resolve_attack(
    attacker: &StatSnapshot,
    defender: &StatSnapshot,
    part: Option<BodyPart>,
    rng: &mut CombatRng,
    config: &CombatConfig,
) -> AttackResult {
    let roll = rng.roll_d100();
    if !check_hit(attacker, defender, roll, config) {
        return AttackResult {
            outcome: AttackOutcome::Miss,
            damage: None,
        };
    }

    let multiplier = crit_multiplier(attacker, defender, rng, config);
    let critical = multiplier > 1.0;

    let raw = calculate_damage(attacker, defender, rng, config);
    let part_multiplier = part.map_or(1.0, |p| config.part_multiplier(p));
    let damage = ((raw as f64 * multiplier * part_multiplier).round() as u32)
        .max(config.minimum_damage);

    AttackResult {
        outcome: if critical {
            AttackOutcome::Critical
        } else {
            AttackOutcome::Hit
        },
        damage: Some(damage),
    }
}
