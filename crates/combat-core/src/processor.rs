//! Real-time alternating combat processor.
//!
//! The per-match state machine for 1v1 fights: pending → active →
//! completed. Each submitted action resolves immediately; when the opponent
//! is an NPC and the match should not yet end, the NPC's counter-turn
//! resolves in the same step using a seed derived from the match seed and
//! decision counter.
//!
//! All operations are pure state transitions that return the events to
//! publish; a runtime adapter performs the actual broadcast.

use chrono::{DateTime, Utc};

use crate::action::{PlayerAction, SkillKind, SkillSpec};
use crate::ai::{self, NpcDecision};
use crate::battle::{Battle, BattleStatus, MatchOutcome};
use crate::body::BodyPart;
use crate::config::CombatConfig;
use crate::effect::{EffectDefinition, StatChanges};
use crate::error::CombatError;
use crate::event::MatchEvent;
use crate::ids::{ParticipantId, TeamId};
use crate::log::LogLine;
use crate::turn::resolve_turn;

/// Final outcome of a closed match, before rewards are computed.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchClose {
    pub winner: Option<TeamId>,
    pub outcomes: Vec<(ParticipantId, MatchOutcome)>,
}

/// What one processed action produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReport {
    pub events: Vec<MatchEvent>,
    /// Present when this action closed the match.
    pub close: Option<MatchClose>,
}

/// Mutating view over one battle in alternating mode.
pub struct MatchEngine<'a> {
    battle: &'a mut Battle,
    config: &'a CombatConfig,
}

impl<'a> MatchEngine<'a> {
    pub fn new(battle: &'a mut Battle, config: &'a CombatConfig) -> Self {
        Self { battle, config }
    }

    /// Moves a pending/matching battle to active.
    pub fn start_match(&mut self, now: DateTime<Utc>) -> Result<Vec<MatchEvent>, CombatError> {
        match self.battle.status {
            BattleStatus::Pending | BattleStatus::Matching => {}
            status => return Err(CombatError::NotStartable { status }),
        }
        self.battle.status = BattleStatus::Active;
        self.battle.started_at = Some(now);
        self.battle.advance_round();
        self.battle.push_log(LogLine::message("match started").tag("system"));

        Ok(vec![MatchEvent::MatchStart {
            match_id: self.battle.id,
        }])
    }

    /// True when every member of some team is defeated.
    pub fn should_end(&self) -> bool {
        self.battle.should_end()
    }

    /// Processes one participant action.
    ///
    /// Fails without mutation when the match is not active, the actor is
    /// not a participant, or the actor is defeated.
    pub fn process_action(
        &mut self,
        actor: ParticipantId,
        action: PlayerAction,
        now: DateTime<Utc>,
    ) -> Result<ActionReport, CombatError> {
        self.battle.ensure_can_act(actor)?;

        let mut events = Vec::new();
        match action {
            PlayerAction::Attack { part } => self.handle_attack(actor, part, &mut events)?,
            PlayerAction::Defend => self.handle_defend(actor, &mut events)?,
            PlayerAction::Skill { skill, target } => {
                self.handle_skill(actor, &skill, target, &mut events)?
            }
            PlayerAction::Flee => {
                return self.handle_flee(actor, now, events);
            }
        }

        // NPC counter-turn: the opponent answers immediately unless the
        // match is already decided.
        if !self.battle.should_end()
            && let Some(npc) = self.next_living_npc_opponent(actor)
        {
            self.npc_turn(npc, &mut events)?;
        }

        self.battle.advance_round();

        // Effect durations count action exchanges in this mode.
        for idx in 0..self.battle.participants().len() {
            self.battle
                .participant_mut(ParticipantId(idx as u32))?
                .effects
                .tick();
        }

        let close = if self.battle.should_end() {
            let winner = self.battle.winning_team();
            Some(self.finalize(BattleStatus::Completed, winner, now)?)
        } else {
            None
        };

        Ok(ActionReport { events, close })
    }

    /// Closes an active match with the given winner (None = draw).
    ///
    /// Idempotent by validation: a second call fails with `AlreadyEnded`
    /// and leaves state untouched.
    pub fn end_match(
        &mut self,
        winner: Option<TeamId>,
        now: DateTime<Utc>,
    ) -> Result<MatchClose, CombatError> {
        self.finalize(BattleStatus::Completed, winner, now)
    }

    // ------------------------------------------------------------------
    // Action handlers
    // ------------------------------------------------------------------

    fn handle_attack(
        &mut self,
        actor: ParticipantId,
        part: Option<BodyPart>,
        events: &mut Vec<MatchEvent>,
    ) -> Result<(), CombatError> {
        let part = if self.battle.mode.supports_part_targeting() {
            part
        } else {
            None
        };
        let target = self.lowest_hp_opponent(actor)?;
        self.resolve_strike(actor, target, "strikes", part, events)
    }

    fn handle_defend(
        &mut self,
        actor: ParticipantId,
        events: &mut Vec<MatchEvent>,
    ) -> Result<(), CombatError> {
        // Applied mid-exchange: duration 2 survives this exchange's tick
        // and covers the opponent's next action.
        let guard = EffectDefinition::new(
            "guard",
            2,
            StatChanges {
                defense: self.config.guard_defense_bonus,
                ..Default::default()
            },
        );
        let name = {
            let p = self.battle.participant_mut(actor)?;
            p.effects.apply(std::slice::from_ref(&guard));
            p.name.clone()
        };
        self.battle.push_log(
            LogLine::message(format!("{name} takes a defensive stance"))
                .actor(actor)
                .tag("defend"),
        );
        events.push(MatchEvent::action(
            self.battle.id,
            self.battle.participant(actor)?,
            None,
            "defend",
            0,
            false,
        ));
        Ok(())
    }

    fn handle_skill(
        &mut self,
        actor: ParticipantId,
        skill: &SkillSpec,
        target: ParticipantId,
        events: &mut Vec<MatchEvent>,
    ) -> Result<(), CombatError> {
        self.battle.participant(target)?;

        {
            let p = self.battle.participant_mut(actor)?;
            if !p.spend_mp(skill.mana_cost) {
                return Err(CombatError::InsufficientMana {
                    cost: skill.mana_cost,
                    available: p.mp,
                });
            }
        }

        let actor_name = self.battle.participant(actor)?.name.clone();
        let target_name = self.battle.participant(target)?.name.clone();

        let damage_done = match &skill.kind {
            SkillKind::Buff(effects) => {
                self.battle.participant_mut(target)?.effects.apply(effects);
                self.battle.push_log(
                    LogLine::message(format!(
                        "{actor_name} casts {} on {target_name}",
                        skill.name
                    ))
                    .actor(actor)
                    .target(target)
                    .tag("skill"),
                );
                0
            }
            SkillKind::Heal(amount) => {
                let healed = {
                    let p = self.battle.participant_mut(target)?;
                    let before = p.hp;
                    p.heal(*amount);
                    p.hp - before
                };
                self.battle.push_log(
                    LogLine::message(format!("{actor_name} heals {target_name} for {healed}"))
                        .actor(actor)
                        .target(target)
                        .healing(healed)
                        .tag("skill"),
                );
                0
            }
            SkillKind::Damage(amount) => {
                self.battle
                    .participant_mut(target)?
                    .take_damage(*amount, None);
                self.battle.participant_mut(actor)?.tallies.damage_dealt += *amount as u64;
                self.battle.push_log(
                    LogLine::message(format!(
                        "{actor_name} blasts {target_name} with {} for {amount} damage",
                        skill.name
                    ))
                    .actor(actor)
                    .target(target)
                    .damage(*amount)
                    .tag("skill"),
                );
                *amount
            }
        };

        events.push(MatchEvent::action(
            self.battle.id,
            self.battle.participant(actor)?,
            Some(self.battle.participant(target)?),
            &skill.name,
            damage_done,
            false,
        ));
        if !matches!(skill.kind, SkillKind::Buff(_)) {
            events.push(MatchEvent::hp(
                self.battle.id,
                self.battle.participant(target)?,
            ));
        }
        if damage_done > 0 {
            self.note_if_defeated(target, events);
        }
        Ok(())
    }

    fn handle_flee(
        &mut self,
        actor: ParticipantId,
        now: DateTime<Utc>,
        mut events: Vec<MatchEvent>,
    ) -> Result<ActionReport, CombatError> {
        let (name, team) = {
            let p = self.battle.participant(actor)?;
            (p.name.clone(), p.team)
        };
        let winner = self.battle.teams().into_iter().find(|&t| t != team);

        self.battle
            .push_log(LogLine::message(format!("{name} flees the fight")).actor(actor));
        events.push(MatchEvent::SystemMessage {
            match_id: self.battle.id,
            message: format!("{name} has fled"),
        });

        let close = self.finalize(BattleStatus::Forfeited, winner, now)?;
        Ok(ActionReport {
            events,
            close: Some(close),
        })
    }

    // ------------------------------------------------------------------
    // NPC counter-turn
    // ------------------------------------------------------------------

    fn npc_turn(
        &mut self,
        npc: ParticipantId,
        events: &mut Vec<MatchEvent>,
    ) -> Result<(), CombatError> {
        let profile = match self.battle.participant(npc)?.profile {
            Some(profile) => profile,
            None => return Ok(()),
        };
        let hp_ratio = self.battle.participant(npc)?.hp_ratio();
        let part_targeting = self.battle.mode.supports_part_targeting();

        let mut rng = self.battle.rng_for(npc, 1);
        let decision = {
            let opponents = self.battle.living_opponents(npc);
            ai::decide(profile, hp_ratio, &opponents, &mut rng, part_targeting)?
        };

        match decision {
            NpcDecision::Attack { target, part } => {
                self.resolve_strike(npc, target, "strikes", part, events)?;
            }
            NpcDecision::Defend { .. } => {
                self.handle_defend(npc, events)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared resolution helpers
    // ------------------------------------------------------------------

    fn resolve_strike(
        &mut self,
        actor: ParticipantId,
        target: ParticipantId,
        action: &str,
        part: Option<BodyPart>,
        events: &mut Vec<MatchEvent>,
    ) -> Result<(), CombatError> {
        let mut rng = self.battle.rng_for(actor, 0);
        let attacker = self.battle.participant(actor)?.clone();
        let defender = self.battle.participant(target)?.clone();

        let outcome = resolve_turn(
            &attacker,
            &defender,
            action,
            &mut rng,
            None,
            part,
            self.config,
        );

        let damage = outcome.result.damage.unwrap_or(0);
        if damage > 0 {
            let defender_mut = self.battle.participant_mut(target)?;
            defender_mut.take_damage(damage, part);
            if !outcome.effects_applied.is_empty() {
                defender_mut.effects.apply(&outcome.effects_applied);
            }
            let attacker_mut = self.battle.participant_mut(actor)?;
            attacker_mut.tallies.damage_dealt += damage as u64;
            attacker_mut.tallies.hits_landed += 1;
            attacker_mut.tallies.fatigue += self.config.fatigue_per_attack;
        }

        self.battle.push_log(
            LogLine::message(outcome.line.clone())
                .actor(actor)
                .target(target)
                .damage(damage)
                .payload(serde_json::json!({
                    "action": action,
                    "critical": outcome.result.is_critical(),
                    "part": part.map(|p| p.to_string()),
                }))
                .tag("attack"),
        );

        events.push(MatchEvent::action(
            self.battle.id,
            self.battle.participant(actor)?,
            Some(self.battle.participant(target)?),
            action,
            damage,
            outcome.result.is_critical(),
        ));
        if damage > 0 {
            events.push(MatchEvent::hp(
                self.battle.id,
                self.battle.participant(target)?,
            ));
            self.note_if_defeated(target, events);
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        status: BattleStatus,
        winner: Option<TeamId>,
        now: DateTime<Utc>,
    ) -> Result<MatchClose, CombatError> {
        let outcomes = self.battle.finalize(status, winner, now)?;
        Ok(MatchClose { winner, outcomes })
    }

    /// Living opponent with the lowest HP, ties broken by enrollment order.
    fn lowest_hp_opponent(&self, of: ParticipantId) -> Result<ParticipantId, CombatError> {
        self.battle
            .living_opponents(of)
            .iter()
            .min_by_key(|p| (p.hp, p.id))
            .map(|p| p.id)
            .ok_or(CombatError::NoLivingTarget)
    }

    /// First living NPC on an opposing team, if any.
    fn next_living_npc_opponent(&self, of: ParticipantId) -> Option<ParticipantId> {
        let actor_is_player = self
            .battle
            .participant(of)
            .map(|p| p.combatant.is_player())
            .unwrap_or(false);
        if !actor_is_player {
            return None;
        }
        self.battle
            .living_opponents(of)
            .iter()
            .find(|p| p.combatant.is_npc())
            .map(|p| p.id)
    }

    fn note_if_defeated(&self, target: ParticipantId, events: &mut Vec<MatchEvent>) {
        if let Ok(p) = self.battle.participant(target)
            && !p.is_alive()
            && p.combatant.is_npc()
        {
            events.push(MatchEvent::NpcDefeated {
                match_id: self.battle.id,
                participant: p.id,
                name: p.name.clone(),
            });
        }
    }

}
