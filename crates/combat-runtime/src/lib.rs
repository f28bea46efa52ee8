//! Async orchestration for the combat core.
//!
//! This crate wires the pure state machines from `combat-core` into a
//! running service: one tokio worker per match (the per-match
//! serialization boundary), a broadcast event bus keyed by match id with a
//! spectator mirror, matchmaking and applications, deferred task
//! scheduling, and persistence-collaborator traits with in-memory
//! implementations.
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the orchestrator and builder
//! - [`worker`] and [`handle`] implement the per-match actor
//! - [`bus`] broadcasts typed match events
//! - [`matchmaker`] owns queue entries and acceptance rules
//! - [`scheduler`] provides the deferred-task facility
//! - [`store`] defines the persistence contracts

pub mod bus;
pub mod error;
pub mod handle;
pub mod matchmaker;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod worker;

pub use bus::MatchEventBus;
pub use error::{Result, RuntimeError};
pub use handle::MatchHandle;
pub use matchmaker::{
    Application, ApplicationId, ApplicationRequest, ApplicationStatus, Matchmaker,
};
pub use scheduler::{DeferredScheduler, ScheduledTask, TokioScheduler};
pub use service::{CombatService, CombatServiceBuilder, QueueEntry};
pub use store::{
    CharacterRecord, CharacterStore, InMemoryCharacterStore, InMemoryNpcStore,
    InMemoryRatingStore, NpcStore, RatingStore, StoreError,
};
pub use worker::{ActionSummary, Command, MatchWorker, SubmitSummary};
