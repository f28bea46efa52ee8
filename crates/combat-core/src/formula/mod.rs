//! Damage, hit, and critical formulas.
//!
//! Pure functions over stat snapshots and a seeded RNG. Given the same RNG
//! state advance sequence the results are identical, which is what makes a
//! fixed seed reproduce an entire fight.

pub mod damage;
pub mod hit;
pub mod result;

pub use damage::{apply_damage, calculate_damage, crit_multiplier};
pub use hit::{calculate_hit_chance, check_hit};
pub use result::{AttackOutcome, AttackResult, resolve_attack};
