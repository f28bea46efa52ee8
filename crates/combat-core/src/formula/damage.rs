//! Damage calculation.

use crate::config::CombatConfig;
use crate::rng::CombatRng;
use crate::stats::StatSnapshot;

/// Calculate raw damage for a connecting attack.
///
/// # Formula
///
/// ```text
/// base = attack + variance roll in [0, attack/4]
/// reduced = base - (defense / defense_divisor)
/// final = max(reduced, minimum)   // minimum is 1 by default
/// ```
///
/// The variance roll advances the RNG exactly once, so the same seed yields
/// the same damage.
pub fn calculate_damage(
    attacker: &StatSnapshot,
    defender: &StatSnapshot,
    rng: &mut CombatRng,
    config: &CombatConfig,
) -> u32 {
    let base = attacker.attack.max(0) as u32;
    let variance = rng.range(0, base / 4);
    let raw = base + variance;

    let reduction = (defender.defense.max(0) as u32) / config.defense_divisor.max(1);
    raw.saturating_sub(reduction).max(config.minimum_damage)
}

/// Critical multiplier for one attack.
///
/// Rolls against the base critical rate adjusted by the accuracy/evasion
/// gap. Returns the configured multiplier on a crit, 1.0 otherwise — always
/// at least 1.0.
pub fn crit_multiplier(
    attacker: &StatSnapshot,
    defender: &StatSnapshot,
    rng: &mut CombatRng,
    config: &CombatConfig,
) -> f64 {
    let chance = config.base_crit_percent as i32 + (attacker.accuracy - defender.evasion) / 4;
    let chance = chance.clamp(0, 100) as u32;
    if rng.chance(chance) {
        config.crit_multiplier.max(1.0)
    } else {
        1.0
    }
}

/// Apply damage to current HP, clamped at zero.
pub fn apply_damage(current_hp: u32, damage: u32) -> u32 {
    current_hp.saturating_sub(damage)
}
