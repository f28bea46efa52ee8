//! NPC template definitions.
//!
//! Templates are static content describing a non-player combatant; the
//! runtime instantiates them into [`crate::combatant::Participant`]s when a
//! battle is set up.

use serde::{Deserialize, Serialize};

use crate::ai::BehaviorProfile;
use crate::combatant::{Combatant, ParticipantSpec};
use crate::ids::{NpcId, TeamId};

/// Static definition of one NPC kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NpcTemplate {
    pub id: NpcId,
    pub name: String,
    pub level: u32,
    pub attack: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub hp_max: u32,
    pub mp_max: u32,
    /// Default behavior; a battle may override per instance.
    pub profile: BehaviorProfile,
}

impl NpcTemplate {
    /// Builds an enrollment spec for this template on the given team.
    pub fn to_spec(&self, team: TeamId, initiative: i32) -> ParticipantSpec {
        ParticipantSpec {
            combatant: Combatant::Npc(self.id),
            name: self.name.clone(),
            team,
            initiative,
            level: self.level,
            attack: self.attack,
            defense: self.defense,
            accuracy: self.accuracy,
            evasion: self.evasion,
            hp_max: self.hp_max,
            mp_max: self.mp_max,
            profile: Some(self.profile),
        }
    }
}
