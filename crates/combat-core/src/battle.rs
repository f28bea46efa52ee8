//! The battle aggregate: one active or historical fight.
//!
//! A battle owns its participants, combat log, round counter, and seed. All
//! mutation flows through the engines in [`crate::processor`] and
//! [`crate::round`]; once the status reaches a terminal state the battle is
//! immutable history and every mutating operation fails validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::combatant::{Participant, ParticipantSpec};
use crate::error::CombatError;
use crate::ids::{MatchId, ParticipantId, TeamId, ZoneId};
use crate::log::{CombatLog, LogLine};
use crate::rating::LadderKind;
use crate::rng::{CombatRng, compute_seed};

/// Fight category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleKind {
    /// Open-world fight against NPCs.
    Pve,
    /// Player-versus-player duel.
    Pvp,
    /// Ranked arena bout.
    Arena,
    /// Tactical grid match.
    Tactical,
}

impl BattleKind {
    /// The ladder this kind reports to, if any. PvE and tactical skirmishes
    /// never touch rating.
    pub fn ladder(&self) -> Option<LadderKind> {
        match self {
            BattleKind::Pvp => Some(LadderKind::Pvp),
            BattleKind::Arena => Some(LadderKind::Arena),
            BattleKind::Pve | BattleKind::Tactical => None,
        }
    }
}

/// Lifecycle state of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleStatus {
    /// Created, waiting to start.
    Pending,
    /// Being assembled by the matchmaker.
    Matching,
    /// Live; actions are accepted.
    Active,
    /// Finished with a result.
    Completed,
    /// Abandoned before completion.
    Cancelled,
    /// Ended by a fleeing/forfeiting side.
    Forfeited,
}

impl BattleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BattleStatus::Completed | BattleStatus::Cancelled | BattleStatus::Forfeited
        )
    }
}

/// How actions are sequenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatMode {
    /// Real-time 1v1: each submitted action resolves immediately.
    Alternating,
    /// Everyone submits a bundle; the round resolves when all are ready.
    SimultaneousRounds,
}

impl CombatMode {
    /// Body-part targeting is a simultaneous-rounds mechanic.
    pub fn supports_part_targeting(&self) -> bool {
        matches!(self, CombatMode::SimultaneousRounds)
    }
}

/// Final outcome for one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Victory,
    Defeat,
    Draw,
}

/// One fight, live or historical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: MatchId,
    pub kind: BattleKind,
    pub mode: CombatMode,
    pub status: BattleStatus,
    /// Round/turn counter; 0 until the match starts.
    pub round: u32,
    pub zone: Option<ZoneId>,
    /// Base seed fixed at creation; all in-match randomness derives from it.
    pub seed: u64,
    /// Decision counter for deriving per-decision seeds.
    nonce: u64,
    /// Post-loss XP penalty percent carried from the application.
    pub trauma_percent: u32,
    participants: Vec<Participant>,
    pub log: CombatLog,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner: Option<TeamId>,
}

impl Battle {
    pub fn new(id: MatchId, kind: BattleKind, mode: CombatMode, seed: u64) -> Self {
        Self {
            id,
            kind,
            mode,
            status: BattleStatus::Pending,
            round: 0,
            zone: None,
            seed,
            nonce: 0,
            trauma_percent: 0,
            participants: Vec::new(),
            log: CombatLog::new(),
            started_at: None,
            ended_at: None,
            winner: None,
        }
    }

    pub fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn with_trauma_percent(mut self, percent: u32) -> Self {
        self.trauma_percent = percent;
        self
    }

    /// Enrolls a combatant. Ids are assigned in enrollment order.
    pub fn add_participant(&mut self, spec: ParticipantSpec) -> ParticipantId {
        let id = ParticipantId(self.participants.len() as u32);
        self.participants.push(Participant::from_spec(id, spec));
        id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Result<&Participant, CombatError> {
        self.participants
            .get(id.0 as usize)
            .ok_or(CombatError::UnknownParticipant { id })
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, CombatError> {
        self.participants
            .get_mut(id.0 as usize)
            .ok_or(CombatError::UnknownParticipant { id })
    }

    /// Distinct team labels in enrollment order.
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams = Vec::new();
        for p in &self.participants {
            if !teams.contains(&p.team) {
                teams.push(p.team);
            }
        }
        teams
    }

    pub fn living_on_team(&self, team: TeamId) -> usize {
        self.participants
            .iter()
            .filter(|p| p.team == team && p.is_alive())
            .count()
    }

    /// Living opponents of a participant, in enrollment order.
    pub fn living_opponents(&self, of: ParticipantId) -> Vec<&Participant> {
        let Ok(actor) = self.participant(of) else {
            return Vec::new();
        };
        let team = actor.team;
        self.participants
            .iter()
            .filter(|p| p.team != team && p.is_alive())
            .collect()
    }

    /// True when every member of some team is at 0 HP.
    pub fn should_end(&self) -> bool {
        self.teams()
            .iter()
            .any(|&team| self.living_on_team(team) == 0)
    }

    /// The sole team with survivors, if exactly one remains.
    pub fn winning_team(&self) -> Option<TeamId> {
        let mut alive = self
            .teams()
            .into_iter()
            .filter(|&team| self.living_on_team(team) > 0);
        match (alive.next(), alive.next()) {
            (Some(team), None) => Some(team),
            _ => None,
        }
    }

    /// Participant ids ordered by initiative (highest first, enrollment
    /// order breaking ties).
    pub fn initiative_order(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.participants.iter().map(|p| p.id).collect();
        ids.sort_by_key(|&id| {
            let p = &self.participants[id.0 as usize];
            (std::cmp::Reverse(p.initiative), id)
        });
        ids
    }

    /// Derives a fresh RNG for one decision point. Advances the decision
    /// counter so successive calls get independent streams.
    pub fn rng_for(&mut self, actor: ParticipantId, context: u32) -> CombatRng {
        self.nonce += 1;
        CombatRng::from_seed(compute_seed(self.seed, self.nonce, actor.0, context))
    }

    /// Appends a log line; the battle assigns `(round, sequence)`.
    pub fn push_log(&mut self, line: LogLine) {
        let round = self.round;
        self.log.append(round, line);
    }

    /// Starts the next round: bumps the counter and resets log sequencing.
    pub fn advance_round(&mut self) {
        self.round += 1;
        self.log.begin_round();
    }

    pub fn ensure_active(&self) -> Result<(), CombatError> {
        if self.status != BattleStatus::Active {
            return Err(CombatError::NotActive {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Closes an active battle with a terminal status and winner, returning
    /// each participant's outcome.
    ///
    /// A battle already in a terminal state fails with `AlreadyEnded` and is
    /// left untouched, which makes match closing idempotent by validation.
    pub fn finalize(
        &mut self,
        status: BattleStatus,
        winner: Option<TeamId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ParticipantId, MatchOutcome)>, CombatError> {
        if self.status.is_terminal() {
            return Err(CombatError::AlreadyEnded);
        }
        self.ensure_active()?;

        self.status = status;
        self.ended_at = Some(now);
        self.winner = winner;

        let outcomes = self
            .participants
            .iter()
            .map(|p| {
                let outcome = match winner {
                    Some(team) if team == p.team => MatchOutcome::Victory,
                    Some(_) => MatchOutcome::Defeat,
                    None => MatchOutcome::Draw,
                };
                (p.id, outcome)
            })
            .collect();

        self.push_log(
            LogLine::message(match winner {
                Some(team) => format!("match ended, {team} wins"),
                None => "match ended in a draw".to_string(),
            })
            .tag("system"),
        );

        Ok(outcomes)
    }

    /// Cancels a battle that has not reached a terminal state. Used when a
    /// scheduled match is abandoned before it starts.
    pub fn cancel(&mut self) -> Result<(), CombatError> {
        if self.status.is_terminal() {
            return Err(CombatError::AlreadyEnded);
        }
        self.status = BattleStatus::Cancelled;
        Ok(())
    }

    /// Validates that `id` names a living participant of an active match.
    pub fn ensure_can_act(&self, id: ParticipantId) -> Result<(), CombatError> {
        self.ensure_active()?;
        let participant = self.participant(id)?;
        if !participant.is_alive() {
            return Err(CombatError::Defeated {
                name: participant.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Combatant;
    use crate::ids::CharacterId;

    fn spec(name: &str, team: u8, hp: u32) -> ParticipantSpec {
        ParticipantSpec {
            combatant: Combatant::Player(CharacterId(team as u64 * 10)),
            name: name.into(),
            team: TeamId(team),
            initiative: 10,
            level: 5,
            attack: 10,
            defense: 5,
            accuracy: 5,
            evasion: 5,
            hp_max: hp,
            mp_max: 20,
            profile: None,
        }
    }

    fn two_sided() -> Battle {
        let mut battle = Battle::new(MatchId(1), BattleKind::Pvp, CombatMode::Alternating, 7);
        battle.add_participant(spec("Aric", 0, 100));
        battle.add_participant(spec("Gorag", 1, 100));
        battle
    }

    #[test]
    fn ids_follow_enrollment_order() {
        let battle = two_sided();
        assert_eq!(battle.participants()[0].id, ParticipantId(0));
        assert_eq!(battle.participants()[1].id, ParticipantId(1));
    }

    #[test]
    fn should_end_when_one_team_is_wiped() {
        let mut battle = two_sided();
        assert!(!battle.should_end());

        battle
            .participant_mut(ParticipantId(1))
            .unwrap()
            .take_damage(100, None);
        assert!(battle.should_end());
        assert_eq!(battle.winning_team(), Some(TeamId(0)));
    }

    #[test]
    fn winning_team_is_none_while_both_sides_stand() {
        let battle = two_sided();
        assert_eq!(battle.winning_team(), None);
    }

    #[test]
    fn actions_rejected_outside_active_status() {
        let battle = two_sided();
        let err = battle.ensure_can_act(ParticipantId(0)).unwrap_err();
        assert!(matches!(err, CombatError::NotActive { .. }));
    }

    #[test]
    fn defeated_participants_cannot_act() {
        let mut battle = two_sided();
        battle.status = BattleStatus::Active;
        battle
            .participant_mut(ParticipantId(0))
            .unwrap()
            .take_damage(100, None);
        let err = battle.ensure_can_act(ParticipantId(0)).unwrap_err();
        assert!(matches!(err, CombatError::Defeated { .. }));
    }
}
