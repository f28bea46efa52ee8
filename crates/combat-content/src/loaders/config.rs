//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat balance configuration from TOML files.
///
/// The document may override any subset of fields (action-point costs per
/// technique, global rates, body-part multipliers); everything it omits
/// keeps the built-in default.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        let config: CombatConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse combat config TOML: {}", e))?;
        Ok(config)
    }

    /// Load config data, falling back to hardcoded defaults when the
    /// document is absent or unreadable. Never fatal.
    pub fn load_or_default(path: &Path) -> CombatConfig {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_document_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
action_points_per_round = 120
base_hit_percent = 90

[technique_costs]
haymaker = 35
"#
        )
        .unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.action_points_per_round, 120);
        assert_eq!(config.base_hit_percent, 90);
        assert_eq!(config.technique_cost("haymaker"), 35);
        // Untouched fields keep their defaults
        assert_eq!(config.mana_per_round, CombatConfig::DEFAULT_MANA_BUDGET);
        assert_eq!(
            config.multi_attack_penalty,
            CombatConfig::DEFAULT_MULTI_ATTACK_PENALTY
        );
    }

    #[test]
    fn missing_document_falls_back_to_defaults() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/balance.toml"));
        assert_eq!(config, CombatConfig::default());
    }
}
