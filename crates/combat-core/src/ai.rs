//! NPC combat decision-making.
//!
//! Given a seeded RNG and the current battle state, an NPC decides whether
//! to attack or defend, parameterized by a behavior profile resolved from
//! its template (overridable per instance). All randomness flows through
//! the supplied RNG, so a given seed yields an identical decision sequence.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::action::{AttackIntent, TurnBundle};
use crate::body::BodyPart;
use crate::combatant::Participant;
use crate::error::CombatError;
use crate::ids::ParticipantId;
use crate::rng::CombatRng;

/// Behavior archetype for non-player combatants.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BehaviorProfile {
    /// Always attacks.
    Aggressive,
    /// Defends 40% of the time once below 70% HP.
    Defensive,
    /// Defends 20% of the time once below 40% HP.
    Balanced,
    /// Defends ~80% of the time regardless of HP.
    Passive,
}

impl BehaviorProfile {
    /// Whether to defend this turn, given current HP ratio.
    ///
    /// Consumes at most one roll; aggressive NPCs never roll.
    fn wants_to_defend(&self, hp_ratio: f64, rng: &mut CombatRng) -> bool {
        match self {
            BehaviorProfile::Aggressive => false,
            BehaviorProfile::Defensive => hp_ratio < 0.70 && rng.chance(40),
            BehaviorProfile::Balanced => hp_ratio < 0.40 && rng.chance(20),
            BehaviorProfile::Passive => rng.chance(80),
        }
    }
}

/// What an NPC chose to do this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NpcDecision {
    Attack {
        target: ParticipantId,
        part: Option<BodyPart>,
    },
    Defend {
        part: BodyPart,
    },
}

/// Decides an NPC's action.
///
/// Attack targets the living opponent with the lowest current HP, ties
/// broken by enrollment order. The body part is rolled uniformly when the
/// combat mode supports part targeting.
///
/// `opponents` must contain only living participants; an empty slice is an
/// error since there is nothing left to fight.
pub fn decide(
    profile: BehaviorProfile,
    hp_ratio: f64,
    opponents: &[&Participant],
    rng: &mut CombatRng,
    part_targeting: bool,
) -> Result<NpcDecision, CombatError> {
    if opponents.is_empty() {
        return Err(CombatError::NoLivingTarget);
    }

    if profile.wants_to_defend(hp_ratio, rng) {
        return Ok(NpcDecision::Defend {
            part: BodyPart::roll(rng),
        });
    }

    let target = opponents
        .iter()
        .min_by_key(|p| (p.hp, p.id))
        .map(|p| p.id)
        .ok_or(CombatError::NoLivingTarget)?;

    let part = part_targeting.then(|| BodyPart::roll(rng));
    Ok(NpcDecision::Attack { target, part })
}

/// Builds an NPC's round submission for simultaneous-round combat.
///
/// An attacking NPC queues one basic attack at the rolled part; a defending
/// NPC declares one block.
pub fn npc_bundle(
    profile: BehaviorProfile,
    actor: &Participant,
    opponents: &[&Participant],
    rng: &mut CombatRng,
) -> Result<TurnBundle, CombatError> {
    let mut bundle = TurnBundle::default();
    match decide(profile, actor.hp_ratio(), opponents, rng, true)? {
        NpcDecision::Attack { part, .. } => {
            bundle
                .attacks
                .push(AttackIntent::basic(part.unwrap_or(BodyPart::Torso)));
        }
        NpcDecision::Defend { part } => {
            bundle.blocks.push(part);
        }
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Combatant, ParticipantSpec};
    use crate::ids::{NpcId, TeamId};

    fn opponent(id: u32, hp: u32) -> Participant {
        let mut p = Participant::from_spec(
            ParticipantId(id),
            ParticipantSpec {
                combatant: Combatant::Npc(NpcId(id as u64)),
                name: format!("npc-{id}"),
                team: TeamId(1),
                initiative: 0,
                level: 1,
                attack: 5,
                defense: 5,
                accuracy: 5,
                evasion: 5,
                hp_max: 100,
                mp_max: 0,
                profile: None,
            },
        );
        p.hp = hp;
        p
    }

    fn count_defends(profile: BehaviorProfile, hp_ratio: f64, trials: u32) -> u32 {
        let target = opponent(0, 50);
        let opponents = vec![&target];
        let mut defends = 0;
        for seed in 0..trials as u64 {
            let mut rng = CombatRng::from_seed(seed);
            let decision = decide(profile, hp_ratio, &opponents, &mut rng, true).unwrap();
            if matches!(decision, NpcDecision::Defend { .. }) {
                defends += 1;
            }
        }
        defends
    }

    #[test]
    fn aggressive_never_defends_even_at_low_hp() {
        assert_eq!(count_defends(BehaviorProfile::Aggressive, 0.10, 1_000), 0);
    }

    #[test]
    fn passive_defends_a_clear_majority() {
        let defends = count_defends(BehaviorProfile::Passive, 1.0, 1_000);
        assert!(defends > 700, "passive defended only {defends}/1000");
    }

    #[test]
    fn defensive_only_defends_below_threshold() {
        assert_eq!(count_defends(BehaviorProfile::Defensive, 0.90, 1_000), 0);
        let low = count_defends(BehaviorProfile::Defensive, 0.50, 1_000);
        assert!((250..=550).contains(&low), "defensive defended {low}/1000");
    }

    #[test]
    fn balanced_defends_sparingly_below_threshold() {
        assert_eq!(count_defends(BehaviorProfile::Balanced, 0.50, 1_000), 0);
        let low = count_defends(BehaviorProfile::Balanced, 0.30, 1_000);
        assert!((100..=320).contains(&low), "balanced defended {low}/1000");
    }

    #[test]
    fn attack_targets_lowest_hp_with_enrollment_tiebreak() {
        let a = opponent(0, 40);
        let b = opponent(1, 30);
        let c = opponent(2, 30);
        let opponents = vec![&a, &b, &c];
        let mut rng = CombatRng::from_seed(1);
        let decision =
            decide(BehaviorProfile::Aggressive, 1.0, &opponents, &mut rng, false).unwrap();
        assert_eq!(
            decision,
            NpcDecision::Attack {
                target: ParticipantId(1),
                part: None
            }
        );
    }

    #[test]
    fn no_opponents_is_an_error() {
        let mut rng = CombatRng::from_seed(1);
        let err = decide(BehaviorProfile::Aggressive, 1.0, &[], &mut rng, false).unwrap_err();
        assert_eq!(err, CombatError::NoLivingTarget);
    }

    #[test]
    fn same_seed_same_decision_sequence() {
        let target = opponent(0, 50);
        let opponents = vec![&target];
        let run = |seed| {
            let mut rng = CombatRng::from_seed(seed);
            (0..20)
                .map(|_| {
                    decide(BehaviorProfile::Passive, 0.5, &opponents, &mut rng, true).unwrap()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
    }
}
