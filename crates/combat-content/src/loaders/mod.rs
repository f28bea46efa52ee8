//! Loaders for reading combat content from files.

pub mod config;
pub mod npcs;
pub mod rewards;

pub use config::ConfigLoader;
pub use npcs::NpcLoader;
pub use rewards::RewardLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
