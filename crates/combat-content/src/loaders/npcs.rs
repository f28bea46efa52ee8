//! NPC template loader.

use std::path::Path;

use combat_core::NpcTemplate;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

#[derive(Deserialize)]
struct NpcFile {
    #[serde(default)]
    npcs: Vec<NpcTemplate>,
}

/// Loader for NPC template definitions from TOML files.
pub struct NpcLoader;

impl NpcLoader {
    /// Load NPC templates from a TOML file.
    pub fn load(path: &Path) -> LoadResult<Vec<NpcTemplate>> {
        let content = read_file(path)?;
        let file: NpcFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse NPC TOML: {}", e))?;
        Ok(file.npcs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{BehaviorProfile, NpcId};
    use std::io::Write;

    #[test]
    fn templates_parse_with_behavior_profiles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[npcs]]
id = 1
name = "Gorag"
level = 8
attack = 18
defense = 6
accuracy = 5
evasion = 5
hp_max = 120
mp_max = 0
profile = "aggressive"

[[npcs]]
id = 2
name = "Warden"
level = 12
attack = 14
defense = 12
accuracy = 6
evasion = 7
hp_max = 160
mp_max = 30
profile = "defensive"
"#
        )
        .unwrap();

        let npcs = NpcLoader::load(file.path()).unwrap();
        assert_eq!(npcs.len(), 2);
        assert_eq!(npcs[0].id, NpcId(1));
        assert_eq!(npcs[0].profile, BehaviorProfile::Aggressive);
        assert_eq!(npcs[1].profile, BehaviorProfile::Defensive);
        assert_eq!(npcs[1].hp_max, 160);
    }
}
