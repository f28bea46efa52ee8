//! Content loaders for combat balance data.
//!
//! Converts TOML documents into `combat-core` value objects: balance
//! configuration, NPC templates, and reward tables. Loaders are used once
//! at process start; the resulting values are passed explicitly into the
//! components that need them.

pub mod loaders;

pub use loaders::{ConfigLoader, NpcLoader, RewardLoader};
