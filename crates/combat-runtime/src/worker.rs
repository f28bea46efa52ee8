//! Per-match worker task.
//!
//! One worker owns one [`Battle`] and is that match's serialization
//! boundary: action submission, round resolution, match end, log sequence
//! assignment, and rating/reward persistence all happen inside its command
//! loop, so two simultaneous submissions interleave safely and a completed
//! match is never observable with partial results. Workers for different
//! matches share nothing mutable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use combat_core::{
    Battle, CombatConfig, CombatRng, Combatant, MatchClose, MatchEngine, MatchEvent, MatchOutcome,
    ParticipantId, ParticipantResult, PlayerAction, RewardGrant, RewardTable, RoundEngine, TeamId,
    TurnBundle, compute_seed, rating, rewards,
};

use crate::bus::MatchEventBus;
use crate::error::Result;
use crate::store::{CharacterStore, RatingStore};

/// Reply to a processed real-time action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSummary {
    /// True when the action closed the match.
    pub ended: bool,
}

/// Reply to a round submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitSummary {
    /// True when this submission completed readiness and the round
    /// resolved.
    pub resolved: bool,
    /// True when the resolved round closed the match.
    pub ended: bool,
}

/// Commands that can be sent to a match worker.
pub enum Command {
    /// Start the match (from pending/matching).
    Start { reply: oneshot::Sender<Result<()>> },
    /// Process one real-time action.
    PlayerAction {
        actor: ParticipantId,
        action: PlayerAction,
        reply: oneshot::Sender<Result<ActionSummary>>,
    },
    /// Submit a round bundle; resolves the round when it completes
    /// readiness.
    SubmitTurn {
        actor: ParticipantId,
        bundle: TurnBundle,
        reply: oneshot::Sender<Result<SubmitSummary>>,
    },
    /// Cancel a match that has not finished.
    Cancel { reply: oneshot::Sender<Result<()>> },
    /// Read-only snapshot of the battle.
    QueryState { reply: oneshot::Sender<Battle> },
}

/// Background task that owns the authoritative battle state.
pub struct MatchWorker {
    battle: Battle,
    config: Arc<CombatConfig>,
    rewards: Arc<RewardTable>,
    characters: Arc<dyn CharacterStore>,
    ratings: Arc<dyn RatingStore>,
    bus: MatchEventBus,
    command_rx: mpsc::Receiver<Command>,
}

impl MatchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        battle: Battle,
        config: Arc<CombatConfig>,
        rewards: Arc<RewardTable>,
        characters: Arc<dyn CharacterStore>,
        ratings: Arc<dyn RatingStore>,
        bus: MatchEventBus,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            battle,
            config,
            rewards,
            characters,
            ratings,
            bus,
            command_rx,
        }
    }

    /// Main worker loop. Runs until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(
            target: "combat_runtime::worker",
            match_id = ?self.battle.id,
            "match worker stopped"
        );
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::PlayerAction {
                actor,
                action,
                reply,
            } => {
                let _ = reply.send(self.player_action(actor, action));
            }
            Command::SubmitTurn {
                actor,
                bundle,
                reply,
            } => {
                let _ = reply.send(self.submit_turn(actor, bundle));
            }
            Command::Cancel { reply } => {
                let result = self.battle.cancel().map_err(Into::into);
                if result.is_ok() {
                    self.bus.publish(MatchEvent::SystemMessage {
                        match_id: self.battle.id,
                        message: "match cancelled".into(),
                    });
                }
                let _ = reply.send(result);
            }
            Command::QueryState { reply } => {
                let _ = reply.send(self.battle.clone());
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        let events = MatchEngine::new(&mut self.battle, &self.config).start_match(Utc::now())?;
        self.publish_all(events);
        Ok(())
    }

    fn player_action(&mut self, actor: ParticipantId, action: PlayerAction) -> Result<ActionSummary> {
        let report =
            MatchEngine::new(&mut self.battle, &self.config).process_action(actor, action, Utc::now())?;
        self.publish_all(report.events);

        match report.close {
            Some(close) => {
                self.settle(close)?;
                Ok(ActionSummary { ended: true })
            }
            None => Ok(ActionSummary { ended: false }),
        }
    }

    fn submit_turn(&mut self, actor: ParticipantId, bundle: TurnBundle) -> Result<SubmitSummary> {
        let outcome = RoundEngine::new(&mut self.battle, &self.config).submit_turn(actor, bundle)?;
        if !outcome.ready {
            return Ok(SubmitSummary {
                resolved: false,
                ended: false,
            });
        }

        // Resolution triggers synchronously on whichever submission
        // completed readiness; nobody polls.
        let report = RoundEngine::new(&mut self.battle, &self.config).resolve_round(Utc::now())?;
        self.publish_all(report.events);

        match report.close {
            Some(close) => {
                self.settle(close)?;
                Ok(SubmitSummary {
                    resolved: true,
                    ended: true,
                })
            }
            None => Ok(SubmitSummary {
                resolved: true,
                ended: false,
            }),
        }
    }

    /// Applies ratings and rewards to the stores, then publishes the final
    /// result. Store writes strictly precede the `MatchResult` event, so no
    /// observer can read a completed match before its side effects landed.
    fn settle(&mut self, close: MatchClose) -> Result<()> {
        let rating_deltas = self.apply_ratings(&close)?;
        let grants = self.apply_rewards(close.winner)?;

        let outcome_by_participant: HashMap<ParticipantId, MatchOutcome> =
            close.outcomes.iter().copied().collect();

        let results = grants
            .iter()
            .map(|grant| {
                let participant = self.battle.participant(grant.participant)?;
                Ok(ParticipantResult {
                    participant: grant.participant,
                    name: participant.name.clone(),
                    outcome: outcome_by_participant
                        .get(&grant.participant)
                        .copied()
                        .unwrap_or(MatchOutcome::Draw),
                    rating_delta: rating_deltas
                        .get(&grant.participant)
                        .copied()
                        .unwrap_or(0),
                    xp: grant.xp,
                    gold: grant.gold,
                    items: grant.item.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.bus.publish(MatchEvent::MatchResult {
            match_id: self.battle.id,
            winner: close.winner,
            results,
        });
        Ok(())
    }

    /// Elo update for ladder-eligible, decisive results. Draws and PvE
    /// matches leave ratings untouched.
    fn apply_ratings(&self, close: &MatchClose) -> Result<HashMap<ParticipantId, i32>> {
        let mut deltas = HashMap::new();
        let Some(ladder) = self.battle.kind.ladder() else {
            return Ok(deltas);
        };
        let Some(winner) = close.winner else {
            return Ok(deltas);
        };

        let mut winners: Vec<(ParticipantId, combat_core::CharacterId)> = Vec::new();
        let mut losers: Vec<(ParticipantId, combat_core::CharacterId)> = Vec::new();
        for p in self.battle.participants() {
            if let Combatant::Player(character) = p.combatant {
                if p.team == winner {
                    winners.push((p.id, character));
                } else {
                    losers.push((p.id, character));
                }
            }
        }
        if winners.is_empty() || losers.is_empty() {
            return Ok(deltas);
        }

        // Re-read current records immediately before mutating.
        let mut winner_records = winners
            .iter()
            .map(|(_, character)| self.ratings.get(*character, ladder))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut loser_records = losers
            .iter()
            .map(|(_, character)| self.ratings.get(*character, ladder))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let delta = rating::apply_team_result(&mut winner_records, &mut loser_records);

        for ((participant, character), record) in winners.iter().zip(winner_records) {
            self.ratings.put(*character, ladder, record)?;
            deltas.insert(*participant, delta);
        }
        for ((participant, character), record) in losers.iter().zip(loser_records) {
            self.ratings.put(*character, ladder, record)?;
            deltas.insert(*participant, -delta);
        }
        Ok(deltas)
    }

    /// Computes grants and applies them to character records.
    fn apply_rewards(&mut self, winner: Option<TeamId>) -> Result<Vec<RewardGrant>> {
        let mut rng = CombatRng::from_seed(compute_seed(
            self.battle.seed,
            self.battle.round as u64,
            u32::MAX,
            7,
        ));
        let grants = rewards::distribute(&self.battle, &self.rewards, winner, &mut rng);

        for grant in &grants {
            let participant = self.battle.participant(grant.participant)?;
            let Combatant::Player(character) = participant.combatant else {
                continue;
            };
            if grant.trauma_percent > 0 {
                let loss = self.characters.apply_trauma(character, grant.trauma_percent)?;
                debug!(
                    target: "combat_runtime::worker",
                    ?character,
                    loss,
                    "applied trauma penalty"
                );
            }
            if grant.xp != 0 {
                self.characters.add_xp(character, grant.xp)?;
            }
            if grant.gold > 0 {
                self.characters.add_gold(character, grant.gold)?;
            }
            if let Some(item) = grant.item {
                self.characters.add_item(character, item)?;
            }
        }
        Ok(grants)
    }

    fn publish_all(&self, events: Vec<MatchEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }
}

/// Spawns a worker for a battle and returns the command sender.
pub(crate) fn spawn_worker(
    battle: Battle,
    config: Arc<CombatConfig>,
    rewards: Arc<RewardTable>,
    characters: Arc<dyn CharacterStore>,
    ratings: Arc<dyn RatingStore>,
    bus: MatchEventBus,
) -> mpsc::Sender<Command> {
    let (tx, rx) = mpsc::channel(64);
    let worker = MatchWorker::new(battle, config, rewards, characters, ratings, bus, rx);
    tokio::spawn(async move {
        worker.run().await;
    });
    tx
}

impl std::fmt::Debug for MatchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchWorker")
            .field("match_id", &self.battle.id)
            .field("status", &self.battle.status)
            .finish()
    }
}
