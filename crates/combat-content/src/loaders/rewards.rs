//! Reward table loader.

use std::path::Path;

use combat_core::RewardTable;

use crate::loaders::{LoadResult, read_file};

/// Loader for the per-format reward table from TOML files.
pub struct RewardLoader;

impl RewardLoader {
    /// Load a reward table from a TOML file.
    pub fn load(path: &Path) -> LoadResult<RewardTable> {
        let content = read_file(path)?;
        let table: RewardTable = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse reward table TOML: {}", e))?;
        Ok(table)
    }

    /// Load a reward table, falling back to the built-in payouts when the
    /// document is absent or unreadable.
    pub fn load_or_default(path: &Path) -> RewardTable {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::MatchFormat;
    use std::io::Write;

    #[test]
    fn overridden_rows_apply_and_missing_rows_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[tournament]
win_xp = 500
win_gold = 400
lose_xp = 100
lose_gold = 50
drop_percent = 40
"#
        )
        .unwrap();

        let table = RewardLoader::load(file.path()).unwrap();
        assert_eq!(table.row(MatchFormat::Tournament).win_xp, 500);
        assert_eq!(
            table.row(MatchFormat::Duel),
            RewardTable::default().row(MatchFormat::Duel)
        );
    }

    #[test]
    fn missing_document_falls_back_to_defaults() {
        let table = RewardLoader::load_or_default(Path::new("/nonexistent/rewards.toml"));
        assert_eq!(table, RewardTable::default());
    }
}
