//! Combat service: registry of live matches and the matchmaking surface.
//!
//! The service creates battles (queue pairing, applications, PvE
//! encounters), spawns one worker per match, and routes deferred-task
//! firings. Cross-match operations are fully independent — there is no
//! global lock across matches, only the registry map guarding handle
//! lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use combat_core::{
    Battle, BattleKind, BattleStatus, CharacterId, CombatConfig, CombatMode, CombatRng, MatchEvent,
    MatchId, NpcId, RewardTable, TeamId, ZoneId,
};
use combat_content::{ConfigLoader, NpcLoader, RewardLoader};

use crate::bus::MatchEventBus;
use crate::error::{Result, RuntimeError};
use crate::handle::MatchHandle;
use crate::matchmaker::{Application, ApplicationId, ApplicationRequest, Matchmaker};
use crate::scheduler::{DeferredScheduler, ScheduledTask, TokioScheduler};
use crate::store::{
    CharacterStore, InMemoryCharacterStore, InMemoryNpcStore, InMemoryRatingStore, NpcStore,
    RatingStore,
};
use crate::worker;

/// One side of a queued match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueEntry {
    Character { id: CharacterId, team: TeamId },
    Npc { id: NpcId, team: TeamId },
}

/// Builder for [`CombatService`]. Stores default to in-memory
/// implementations; balance data defaults to the built-in tables.
pub struct CombatServiceBuilder {
    config: CombatConfig,
    rewards: RewardTable,
    characters: Arc<dyn CharacterStore>,
    npcs: Arc<dyn NpcStore>,
    ratings: Arc<dyn RatingStore>,
    zone_capacity: usize,
}

impl CombatServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: CombatConfig::default(),
            rewards: RewardTable::default(),
            characters: Arc::new(InMemoryCharacterStore::new()),
            npcs: Arc::new(InMemoryNpcStore::new()),
            ratings: Arc::new(InMemoryRatingStore::new()),
            zone_capacity: 16,
        }
    }

    pub fn config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn characters(mut self, store: Arc<dyn CharacterStore>) -> Self {
        self.characters = store;
        self
    }

    pub fn npcs(mut self, store: Arc<dyn NpcStore>) -> Self {
        self.npcs = store;
        self
    }

    pub fn ratings(mut self, store: Arc<dyn RatingStore>) -> Self {
        self.ratings = store;
        self
    }

    pub fn zone_capacity(mut self, capacity: usize) -> Self {
        self.zone_capacity = capacity;
        self
    }

    /// Loads balance config, NPC templates, and reward tables from a
    /// content directory (`combat.toml`, `npcs.toml`, `rewards.toml`).
    /// Missing documents fall back to the built-in defaults.
    pub fn with_content_dir(mut self, dir: &Path) -> Self {
        self.config = ConfigLoader::load_or_default(&dir.join("combat.toml"));
        self.rewards = RewardLoader::load_or_default(&dir.join("rewards.toml"));
        match NpcLoader::load(&dir.join("npcs.toml")) {
            Ok(templates) => {
                self.npcs = Arc::new(InMemoryNpcStore::with_templates(templates));
            }
            Err(e) => {
                debug!(target: "combat_runtime::service", error = %e, "no NPC document loaded");
            }
        }
        self
    }

    /// Builds the service and spawns its deferred-task loop. Must be
    /// called inside a tokio runtime.
    pub fn build(self) -> Arc<CombatService> {
        let (scheduler, task_rx) = TokioScheduler::new();
        let service = Arc::new(CombatService {
            config: Arc::new(self.config),
            rewards: Arc::new(self.rewards),
            characters: self.characters,
            npcs: self.npcs,
            ratings: self.ratings,
            bus: MatchEventBus::new(),
            matches: RwLock::new(HashMap::new()),
            matchmaker: Matchmaker::new(self.zone_capacity),
            scheduler: Arc::new(scheduler),
            next_match_id: AtomicU64::new(1),
        });
        tokio::spawn(CombatService::drive_deferred(
            Arc::downgrade(&service),
            task_rx,
        ));
        service
    }
}

impl Default for CombatServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates matches, matchmaking, and deferred starts.
pub struct CombatService {
    config: Arc<CombatConfig>,
    rewards: Arc<RewardTable>,
    characters: Arc<dyn CharacterStore>,
    npcs: Arc<dyn NpcStore>,
    ratings: Arc<dyn RatingStore>,
    bus: MatchEventBus,
    matches: RwLock<HashMap<MatchId, MatchHandle>>,
    matchmaker: Matchmaker,
    scheduler: Arc<dyn DeferredScheduler>,
    next_match_id: AtomicU64,
}

impl CombatService {
    pub fn builder() -> CombatServiceBuilder {
        CombatServiceBuilder::new()
    }

    pub fn bus(&self) -> &MatchEventBus {
        &self.bus
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Handle for a live (or historical, still-registered) match.
    pub async fn handle(&self, id: MatchId) -> Result<MatchHandle> {
        self.matches
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::MatchNotFound(id))
    }

    // ------------------------------------------------------------------
    // Match creation
    // ------------------------------------------------------------------

    /// Pairs queued participants into a new match.
    ///
    /// Requires at least two entries. Enrollment is all-or-nothing: the
    /// battle is assembled in `matching` state and only flipped to
    /// `pending` and spawned once every participant resolved; any store
    /// failure aborts the whole operation with nothing created.
    pub async fn queue(
        &self,
        entries: Vec<QueueEntry>,
        kind: BattleKind,
        mode: CombatMode,
    ) -> Result<MatchHandle> {
        self.create_match(entries, kind, mode, 0, None).await
    }

    /// Starts an open-world PvE encounter: the character versus an NPC
    /// sampled near their level. The match starts immediately.
    pub async fn engage_npc(&self, character: CharacterId) -> Result<MatchHandle> {
        let record = self.characters.get(character)?;
        let template = self.npcs.sample(record.level)?;
        let handle = self
            .create_match(
                vec![
                    QueueEntry::Character {
                        id: character,
                        team: TeamId(0),
                    },
                    QueueEntry::Npc {
                        id: template.id,
                        team: TeamId(1),
                    },
                ],
                BattleKind::Pve,
                CombatMode::Alternating,
                0,
                None,
            )
            .await?;
        handle.start().await?;
        Ok(handle)
    }

    async fn create_match(
        &self,
        entries: Vec<QueueEntry>,
        kind: BattleKind,
        mode: CombatMode,
        trauma_percent: u32,
        zone: Option<ZoneId>,
    ) -> Result<MatchHandle> {
        if entries.len() < 2 {
            return Err(RuntimeError::TooFewParticipants { got: entries.len() });
        }

        let id = MatchId(self.next_match_id.fetch_add(1, Ordering::Relaxed));
        let seed: u64 = rand::random();
        let mut battle = Battle::new(id, kind, mode, seed);
        battle.status = BattleStatus::Matching;
        battle.trauma_percent = trauma_percent;
        battle.zone = zone;

        // Resolve every participant before touching the battle so a store
        // failure aborts with nothing enrolled.
        let mut init_rng = CombatRng::from_seed(seed);
        let mut specs = Vec::with_capacity(entries.len());
        for entry in &entries {
            let initiative = init_rng.roll_die(20) as i32;
            let spec = match entry {
                QueueEntry::Character { id, team } => {
                    self.characters.get(*id)?.to_spec(*team, initiative)
                }
                QueueEntry::Npc { id, team } => {
                    self.npcs.template(*id)?.to_spec(*team, initiative)
                }
            };
            specs.push(spec);
        }
        for spec in specs {
            battle.add_participant(spec);
        }
        battle.status = BattleStatus::Pending;

        self.bus.open(id);
        let tx = worker::spawn_worker(
            battle,
            Arc::clone(&self.config),
            Arc::clone(&self.rewards),
            Arc::clone(&self.characters),
            Arc::clone(&self.ratings),
            self.bus.clone(),
        );
        let handle = MatchHandle::new(id, tx);
        self.matches.write().await.insert(id, handle.clone());

        info!(
            target: "combat_runtime::service",
            match_id = ?id,
            ?kind,
            participants = entries.len(),
            "match created"
        );
        Ok(handle)
    }

    // ------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------

    /// Opens an application and schedules its automatic expiry.
    pub async fn create_application(&self, request: ApplicationRequest) -> Result<Application> {
        // The applicant must exist before the entry is persisted.
        self.characters.get(request.applicant)?;

        let application = self.matchmaker.create(
            request,
            Utc::now(),
            self.config.application_expiry_secs,
        )?;
        self.scheduler.schedule(
            Duration::from_secs(self.config.application_expiry_secs),
            ScheduledTask::ExpireApplication(application.id),
        );
        Ok(application)
    }

    /// Open applications the character could accept right now.
    pub fn available_applications(&self, character: CharacterId) -> Result<Vec<Application>> {
        let record = self.characters.get(character)?;
        Ok(self
            .matchmaker
            .available_for(character, record.level, Utc::now()))
    }

    /// Accepts an application: converts it to matched, creates the match
    /// with both sides enrolled, and schedules the deferred start after the
    /// application's countdown.
    pub async fn accept_application(
        &self,
        id: ApplicationId,
        acceptor: CharacterId,
    ) -> Result<(Application, MatchHandle)> {
        let record = self.characters.get(acceptor)?;
        let application = self
            .matchmaker
            .accept(id, acceptor, record.level, Utc::now())?;

        let handle = self
            .create_match(
                vec![
                    QueueEntry::Character {
                        id: application.applicant,
                        team: TeamId(0),
                    },
                    QueueEntry::Character {
                        id: acceptor,
                        team: TeamId(1),
                    },
                ],
                application.kind,
                application.mode,
                application.trauma_percent,
                application.zone,
            )
            .await?;

        let countdown = application
            .countdown_secs
            .clamp(self.config.countdown_min_secs, self.config.countdown_max_secs);
        self.bus.publish(MatchEvent::Countdown {
            match_id: handle.match_id(),
            seconds: countdown,
        });
        self.scheduler.schedule(
            Duration::from_secs(countdown as u64),
            ScheduledTask::StartMatch(handle.match_id()),
        );
        Ok((application, handle))
    }

    pub fn cancel_application(&self, id: ApplicationId) -> Result<()> {
        self.matchmaker.cancel(id)
    }

    /// Sweeps overdue applications. Normally driven by the per-entry
    /// expiry timers; exposed for maintenance callers.
    pub fn expire_due_applications(&self) -> Vec<ApplicationId> {
        self.matchmaker.expire_due(Utc::now())
    }

    pub fn application(&self, id: ApplicationId) -> Result<Application> {
        self.matchmaker.get(id)
    }

    // ------------------------------------------------------------------
    // Deferred tasks
    // ------------------------------------------------------------------

    async fn drive_deferred(
        service: Weak<CombatService>,
        mut task_rx: mpsc::UnboundedReceiver<ScheduledTask>,
    ) {
        while let Some(task) = task_rx.recv().await {
            let Some(service) = service.upgrade() else {
                break;
            };
            service.fire(task).await;
        }
    }

    /// Executes one fired task, re-validating entity state first: the
    /// match may have been cancelled and the application may already be
    /// matched since the timer was set.
    async fn fire(&self, task: ScheduledTask) {
        match task {
            ScheduledTask::StartMatch(id) => {
                let Ok(handle) = self.handle(id).await else {
                    debug!(target: "combat_runtime::service", match_id = ?id, "start task for unknown match");
                    return;
                };
                if let Err(e) = handle.start().await {
                    // Cancelled or already started; the task is void.
                    warn!(
                        target: "combat_runtime::service",
                        match_id = ?id,
                        error = %e,
                        "scheduled start skipped"
                    );
                }
            }
            ScheduledTask::ExpireApplication(id) => {
                if self.matchmaker.expire(id, Utc::now()) {
                    debug!(
                        target: "combat_runtime::service",
                        application = ?id,
                        "application expired"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for CombatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatService").finish_non_exhaustive()
    }
}
