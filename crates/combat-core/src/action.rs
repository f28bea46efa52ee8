//! Action submissions.
//!
//! A [`TurnBundle`] is the transient, per-round list of intents one
//! participant submits for simultaneous-round combat. It exists only
//! between submit and resolve and is cleared unconditionally after each
//! round. [`PlayerAction`] is the single-action counterpart used by
//! real-time alternating matches.

use serde::{Deserialize, Serialize};

use crate::body::BodyPart;
use crate::config::CombatConfig;
use crate::effect::EffectDefinition;
use crate::ids::ParticipantId;

/// One queued attack: a body part, an optional technique key, and an
/// optional mana cost for empowered techniques.
///
/// The target is not part of the intent; simultaneous-round resolution
/// selects a living opponent at random when the attack executes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackIntent {
    pub part: BodyPart,
    pub technique: Option<String>,
    pub mana_cost: u32,
}

impl AttackIntent {
    pub fn basic(part: BodyPart) -> Self {
        Self {
            part,
            technique: None,
            mana_cost: 0,
        }
    }

    pub fn technique(part: BodyPart, technique: impl Into<String>, mana_cost: u32) -> Self {
        Self {
            part,
            technique: Some(technique.into()),
            mana_cost,
        }
    }
}

/// What a skill does when it executes in the skills phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkillKind {
    /// Attach effects to the target.
    Buff(Vec<EffectDefinition>),
    /// Restore HP on the target.
    Heal(u32),
    /// Direct spell damage on the target, resolved before the combat phase.
    Damage(u32),
}

/// A usable skill with its mana price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillSpec {
    pub name: String,
    pub mana_cost: u32,
    pub kind: SkillKind,
}

/// One queued skill use against an explicit target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillIntent {
    pub skill: SkillSpec,
    pub target: ParticipantId,
}

/// Everything one participant submits for one simultaneous round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnBundle {
    pub attacks: Vec<AttackIntent>,
    pub blocks: Vec<BodyPart>,
    pub skills: Vec<SkillIntent>,
}

impl TurnBundle {
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty() && self.blocks.is_empty() && self.skills.is_empty()
    }

    pub fn clear(&mut self) {
        self.attacks.clear();
        self.blocks.clear();
        self.skills.clear();
    }

    /// Total action-point cost: per-intent costs plus the penalty that grows
    /// with the number of simultaneous attacks.
    pub fn action_point_cost(&self, config: &CombatConfig) -> u32 {
        let attacks: u32 = self
            .attacks
            .iter()
            .map(|a| match &a.technique {
                Some(technique) => config.technique_cost(technique),
                None => config.attack_cost,
            })
            .sum();
        let blocks = self.blocks.len() as u32 * config.block_cost;
        let skills = self.skills.len() as u32 * config.skill_cost;
        attacks + blocks + skills + config.attack_count_penalty(self.attacks.len())
    }

    /// Total mana cost across attacks and skills.
    pub fn mana_cost(&self) -> u32 {
        let attacks: u32 = self.attacks.iter().map(|a| a.mana_cost).sum();
        let skills: u32 = self.skills.iter().map(|s| s.skill.mana_cost).sum();
        attacks + skills
    }

    /// True when the declared blocks cover the given body part.
    pub fn blocks_part(&self, part: BodyPart) -> bool {
        self.blocks.contains(&part)
    }
}

/// A single action in a real-time alternating match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Strike the opponent, optionally aiming at a body part.
    Attack { part: Option<BodyPart> },
    /// Guard for one round (defense bonus until the actor's next action).
    Defend,
    /// Cast a skill at a target.
    Skill {
        skill: SkillSpec,
        target: ParticipantId,
    },
    /// Abandon the match; the actor's team forfeits.
    Flee,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_cost_includes_multi_attack_penalty() {
        let config = CombatConfig::default();
        let bundle = TurnBundle {
            attacks: vec![
                AttackIntent::basic(BodyPart::Head),
                AttackIntent::basic(BodyPart::Torso),
                AttackIntent::basic(BodyPart::Legs),
            ],
            blocks: vec![BodyPart::Head],
            skills: vec![],
        };
        // 3 attacks * 10 + 1 block * 5 + penalty(3) = 30 + 5 + 75
        assert_eq!(bundle.action_point_cost(&config), 110);
    }

    #[test]
    fn technique_costs_override_base_attack_cost() {
        let mut config = CombatConfig::default();
        config.technique_costs.insert("haymaker".into(), 40);
        let bundle = TurnBundle {
            attacks: vec![AttackIntent::technique(BodyPart::Head, "haymaker", 5)],
            blocks: vec![],
            skills: vec![],
        };
        assert_eq!(bundle.action_point_cost(&config), 40);
        assert_eq!(bundle.mana_cost(), 5);
    }

    #[test]
    fn clear_empties_every_queue() {
        let mut bundle = TurnBundle {
            attacks: vec![AttackIntent::basic(BodyPart::Head)],
            blocks: vec![BodyPart::Torso],
            skills: vec![],
        };
        bundle.clear();
        assert!(bundle.is_empty());
    }
}
