//! In-memory store implementations for tests and local play.

use std::collections::HashMap;
use std::sync::RwLock;

use rand::seq::SliceRandom;

use combat_core::{CharacterId, LadderKind, NpcId, NpcTemplate, RatingRecord};

use super::{CharacterRecord, CharacterStore, NpcStore, RatingStore, StoreError};

/// Character records behind an `RwLock` map.
#[derive(Default)]
pub struct InMemoryCharacterStore {
    records: RwLock<HashMap<CharacterId, CharacterRecord>>,
}

impl InMemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = CharacterRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().expect("fresh lock");
            for record in records {
                map.insert(record.id, record);
            }
        }
        store
    }
}

impl CharacterStore for InMemoryCharacterStore {
    fn get(&self, id: CharacterId) -> Result<CharacterRecord, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("character store lock poisoned".into()))?
            .get(&id)
            .cloned()
            .ok_or(StoreError::CharacterNotFound(id))
    }

    fn put(&self, record: CharacterRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("character store lock poisoned".into()))?
            .insert(record.id, record);
        Ok(())
    }
}

/// NPC templates behind an `RwLock` map.
#[derive(Default)]
pub struct InMemoryNpcStore {
    templates: RwLock<HashMap<NpcId, NpcTemplate>>,
}

impl InMemoryNpcStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: impl IntoIterator<Item = NpcTemplate>) -> Self {
        let store = Self::new();
        {
            let mut map = store.templates.write().expect("fresh lock");
            for template in templates {
                map.insert(template.id, template);
            }
        }
        store
    }
}

impl NpcStore for InMemoryNpcStore {
    fn template(&self, id: NpcId) -> Result<NpcTemplate, StoreError> {
        self.templates
            .read()
            .map_err(|_| StoreError::Backend("npc store lock poisoned".into()))?
            .get(&id)
            .cloned()
            .ok_or(StoreError::NpcNotFound(id))
    }

    /// Samples uniformly among templates within three levels of the target,
    /// widening to the whole pool when the band is empty.
    fn sample(&self, level: u32) -> Result<NpcTemplate, StoreError> {
        let templates = self
            .templates
            .read()
            .map_err(|_| StoreError::Backend("npc store lock poisoned".into()))?;
        let pool: Vec<&NpcTemplate> = templates
            .values()
            .filter(|t| t.level.abs_diff(level) <= 3)
            .collect();
        let mut rng = rand::thread_rng();
        if let Some(template) = pool.choose(&mut rng) {
            return Ok((*template).clone());
        }
        templates
            .values()
            .collect::<Vec<_>>()
            .choose(&mut rng)
            .map(|t| (*t).clone())
            .ok_or(StoreError::NoNpcAvailable)
    }
}

/// Rating records behind an `RwLock` map. Absent entries read as the
/// initial rating.
#[derive(Default)]
pub struct InMemoryRatingStore {
    records: RwLock<HashMap<(CharacterId, LadderKind), RatingRecord>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for InMemoryRatingStore {
    fn get(&self, id: CharacterId, ladder: LadderKind) -> Result<RatingRecord, StoreError> {
        Ok(self
            .records
            .read()
            .map_err(|_| StoreError::Backend("rating store lock poisoned".into()))?
            .get(&(id, ladder))
            .copied()
            .unwrap_or_default())
    }

    fn put(
        &self,
        id: CharacterId,
        ladder: LadderKind,
        record: RatingRecord,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("rating store lock poisoned".into()))?
            .insert((id, ladder), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{BehaviorProfile, ItemDrop, ItemRarity};

    fn record(id: u64, xp: u64) -> CharacterRecord {
        CharacterRecord {
            id: CharacterId(id),
            name: format!("c{id}"),
            level: 10,
            xp,
            gold: 100,
            attack: 10,
            defense: 5,
            accuracy: 5,
            evasion: 5,
            hp_max: 100,
            mp_max: 50,
            items: vec![],
        }
    }

    #[test]
    fn trauma_removes_a_proportional_slice() {
        let store = InMemoryCharacterStore::with_records([record(1, 1_000)]);
        let loss = store.apply_trauma(CharacterId(1), 15).unwrap();
        assert_eq!(loss, 150);
        assert_eq!(store.get(CharacterId(1)).unwrap().xp, 850);
    }

    #[test]
    fn negative_xp_saturates_at_zero() {
        let store = InMemoryCharacterStore::with_records([record(1, 50)]);
        store.add_xp(CharacterId(1), -200).unwrap();
        assert_eq!(store.get(CharacterId(1)).unwrap().xp, 0);
    }

    #[test]
    fn items_and_gold_accumulate() {
        let store = InMemoryCharacterStore::with_records([record(1, 0)]);
        store.add_gold(CharacterId(1), 25).unwrap();
        store
            .add_item(
                CharacterId(1),
                ItemDrop {
                    rarity: ItemRarity::Rare,
                    tier: 2,
                },
            )
            .unwrap();
        let rec = store.get(CharacterId(1)).unwrap();
        assert_eq!(rec.gold, 125);
        assert_eq!(rec.items.len(), 1);
    }

    #[test]
    fn missing_rating_reads_as_initial() {
        let store = InMemoryRatingStore::new();
        let record = store.get(CharacterId(9), LadderKind::Arena).unwrap();
        assert_eq!(record.rating, combat_core::rating::INITIAL_RATING);
    }

    #[test]
    fn npc_sampling_prefers_the_level_band() {
        let template = |id: u64, level: u32| NpcTemplate {
            id: NpcId(id),
            name: format!("npc{id}"),
            level,
            attack: 10,
            defense: 5,
            accuracy: 5,
            evasion: 5,
            hp_max: 80,
            mp_max: 0,
            profile: BehaviorProfile::Balanced,
        };
        let store = InMemoryNpcStore::with_templates([template(1, 5), template(2, 40)]);
        for _ in 0..20 {
            assert_eq!(store.sample(5).unwrap().id, NpcId(1));
        }
        // Out-of-band levels still find an opponent.
        assert!(store.sample(100).is_ok());
    }
}
