//! Combat configuration value object.
//!
//! All tunable rates and costs live here. The config is loaded once at
//! process start (or built per test) and passed explicitly into every
//! component that needs it; nothing reads balance data from ambient state.
//! Missing fields in a configuration document fall back to the defaults
//! below rather than failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::body::BodyPart;

/// Tunable combat parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Per-round action-point budget for simultaneous-round matches.
    pub action_points_per_round: u32,
    /// Per-round mana budget cap.
    pub mana_per_round: u32,

    /// Base action-point cost of one attack (technique overrides below).
    pub attack_cost: u32,
    /// Action-point cost of declaring one block.
    pub block_cost: u32,
    /// Action-point cost of one skill use.
    pub skill_cost: u32,
    /// Extra action-point penalty by simultaneous attack count (0-5+).
    pub multi_attack_penalty: [u32; 6],
    /// Action-point cost per technique, keyed by technique identifier.
    /// Techniques absent from the map cost `attack_cost`.
    pub technique_costs: HashMap<String, u32>,

    /// Base chance to hit, in percent.
    pub base_hit_percent: u32,
    /// Hit chance clamp after accuracy/evasion adjustment.
    pub hit_percent_min: u32,
    pub hit_percent_max: u32,
    /// Base critical chance, in percent.
    pub base_crit_percent: u32,
    /// Damage multiplier on a critical hit.
    pub crit_multiplier: f64,
    /// Defense is divided by this before subtracting from raw damage.
    pub defense_divisor: u32,
    /// Damage floor whenever an attack connects.
    pub minimum_damage: u32,

    /// Chance that a matching block engages, in percent.
    pub block_success_percent: u32,
    /// Fraction of damage that goes through a successful block, in percent.
    pub blocked_damage_percent: u32,
    /// Flat defense bonus granted by the Defend action for one round.
    pub guard_defense_bonus: i32,

    /// Damage multipliers per targeted body part.
    pub head_multiplier: f64,
    pub torso_multiplier: f64,
    pub stomach_multiplier: f64,
    pub legs_multiplier: f64,

    /// Natural MP regeneration per round, as percent of maximum.
    pub mp_regen_percent: u32,
    /// Fatigue lost per round (floored at zero).
    pub fatigue_decay: f64,
    /// Fatigue gained per executed attack.
    pub fatigue_per_attack: f64,

    /// Bounds of the pre-match countdown, in seconds.
    pub countdown_min_secs: u32,
    pub countdown_max_secs: u32,
    /// Lifetime of an open application before it expires, in seconds.
    pub application_expiry_secs: u64,
}

impl CombatConfig {
    pub const DEFAULT_ACTION_POINTS: u32 = 80;
    pub const DEFAULT_MANA_BUDGET: u32 = 50;
    pub const DEFAULT_MULTI_ATTACK_PENALTY: [u32; 6] = [0, 0, 25, 75, 150, 250];
    pub const DEFAULT_HIT_PERCENT: u32 = 85;
    pub const DEFAULT_CRIT_PERCENT: u32 = 10;
    pub const DEFAULT_BLOCK_SUCCESS_PERCENT: u32 = 50;
    pub const DEFAULT_BLOCKED_DAMAGE_PERCENT: u32 = 20;
    pub const DEFAULT_APPLICATION_EXPIRY_SECS: u64 = 600;

    pub fn new() -> Self {
        Self {
            action_points_per_round: Self::DEFAULT_ACTION_POINTS,
            mana_per_round: Self::DEFAULT_MANA_BUDGET,
            attack_cost: 10,
            block_cost: 5,
            skill_cost: 15,
            multi_attack_penalty: Self::DEFAULT_MULTI_ATTACK_PENALTY,
            technique_costs: HashMap::new(),
            base_hit_percent: Self::DEFAULT_HIT_PERCENT,
            hit_percent_min: 5,
            hit_percent_max: 95,
            base_crit_percent: Self::DEFAULT_CRIT_PERCENT,
            crit_multiplier: 2.0,
            defense_divisor: 2,
            minimum_damage: 1,
            block_success_percent: Self::DEFAULT_BLOCK_SUCCESS_PERCENT,
            blocked_damage_percent: Self::DEFAULT_BLOCKED_DAMAGE_PERCENT,
            guard_defense_bonus: 10,
            head_multiplier: 1.5,
            torso_multiplier: 1.0,
            stomach_multiplier: 1.1,
            legs_multiplier: 0.8,
            mp_regen_percent: 5,
            fatigue_decay: 0.5,
            fatigue_per_attack: 1.0,
            countdown_min_secs: 120,
            countdown_max_secs: 300,
            application_expiry_secs: Self::DEFAULT_APPLICATION_EXPIRY_SECS,
        }
    }

    /// Action-point cost of a technique, falling back to the base attack cost.
    pub fn technique_cost(&self, technique: &str) -> u32 {
        self.technique_costs
            .get(technique)
            .copied()
            .unwrap_or(self.attack_cost)
    }

    /// Extra action-point penalty for submitting `attacks` attacks in one round.
    pub fn attack_count_penalty(&self, attacks: usize) -> u32 {
        let idx = attacks.min(self.multi_attack_penalty.len() - 1);
        self.multi_attack_penalty[idx]
    }

    /// Damage multiplier for the targeted body part.
    pub fn part_multiplier(&self, part: BodyPart) -> f64 {
        match part {
            BodyPart::Head => self.head_multiplier,
            BodyPart::Torso => self.torso_multiplier,
            BodyPart::Stomach => self.stomach_multiplier,
            BodyPart::Legs => self.legs_multiplier,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
