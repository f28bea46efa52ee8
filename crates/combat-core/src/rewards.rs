//! Post-match reward distribution.
//!
//! Computes XP/gold grants, item drops, and loser trauma from the match
//! outcome. Grants are pure values; applying them to character records is
//! the runtime's job, inside the same serialization boundary that completes
//! the match.

use serde::{Deserialize, Serialize};

use crate::battle::{Battle, BattleKind, MatchOutcome};
use crate::ids::{ParticipantId, TeamId};
use crate::rng::CombatRng;

/// Reward bracket derived from match type and size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchFormat {
    Duel,
    Skirmish,
    Tournament,
    Group,
    FreeForAll,
}

/// Base payout row for one format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRow {
    pub win_xp: u64,
    pub win_gold: u64,
    pub lose_xp: u64,
    pub lose_gold: u64,
    /// Chance of an item drop per winner, in percent.
    pub drop_percent: u32,
}

/// Base XP/gold/drop table per match format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub duel: RewardRow,
    pub skirmish: RewardRow,
    pub tournament: RewardRow,
    pub group: RewardRow,
    pub free_for_all: RewardRow,
}

impl RewardTable {
    pub fn row(&self, format: MatchFormat) -> RewardRow {
        match format {
            MatchFormat::Duel => self.duel,
            MatchFormat::Skirmish => self.skirmish,
            MatchFormat::Tournament => self.tournament,
            MatchFormat::Group => self.group,
            MatchFormat::FreeForAll => self.free_for_all,
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            duel: RewardRow {
                win_xp: 100,
                win_gold: 50,
                lose_xp: 25,
                lose_gold: 0,
                drop_percent: 10,
            },
            skirmish: RewardRow {
                win_xp: 150,
                win_gold: 75,
                lose_xp: 40,
                lose_gold: 10,
                drop_percent: 15,
            },
            tournament: RewardRow {
                win_xp: 300,
                win_gold: 200,
                lose_xp: 75,
                lose_gold: 25,
                drop_percent: 25,
            },
            group: RewardRow {
                win_xp: 200,
                win_gold: 100,
                lose_xp: 50,
                lose_gold: 15,
                drop_percent: 20,
            },
            free_for_all: RewardRow {
                win_xp: 250,
                win_gold: 125,
                lose_xp: 60,
                lose_gold: 20,
                drop_percent: 20,
            },
        }
    }
}

/// Item rarity, rolled per drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
}

/// One dropped item: rarity plus a tier gated by the winner's level band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub rarity: ItemRarity,
    pub tier: u8,
}

/// Item tier by level band: 1-10 / 11-25 / 26-50 / 51+.
pub fn tier_for_level(level: u32) -> u8 {
    match level {
        0..=10 => 1,
        11..=25 => 2,
        26..=50 => 3,
        _ => 4,
    }
}

/// Weighted rarity roll: epic 3%, rare 10%, uncommon 25%, common 62%.
fn roll_rarity(rng: &mut CombatRng) -> ItemRarity {
    match rng.roll_d100() {
        1..=3 => ItemRarity::Epic,
        4..=13 => ItemRarity::Rare,
        14..=38 => ItemRarity::Uncommon,
        _ => ItemRarity::Common,
    }
}

/// Rolls an independent drop for one winner.
pub fn roll_drop(level: u32, drop_percent: u32, rng: &mut CombatRng) -> Option<ItemDrop> {
    if !rng.chance(drop_percent) {
        return None;
    }
    Some(ItemDrop {
        rarity: roll_rarity(rng),
        tier: tier_for_level(level),
    })
}

/// Level multiplier on base payouts: `1 + level/100`, boosted by 0.02 per
/// level of upward gap against a higher-level opponent, capped at 3x.
pub fn level_multiplier(own_level: u32, opponent_level: u32) -> f64 {
    let base = 1.0 + own_level as f64 / 100.0;
    let gap_bonus = 0.02 * opponent_level.saturating_sub(own_level) as f64;
    (base + gap_bonus).min(3.0)
}

/// Derives the reward format from battle kind and party shape.
pub fn format_for(kind: BattleKind, team_count: usize, largest_team: usize) -> MatchFormat {
    if team_count > 2 {
        return MatchFormat::FreeForAll;
    }
    match kind {
        BattleKind::Arena => MatchFormat::Tournament,
        _ => match largest_team {
            0 | 1 => MatchFormat::Duel,
            2 | 3 => MatchFormat::Skirmish,
            _ => MatchFormat::Group,
        },
    }
}

/// Everything one participant walks away with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardGrant {
    pub participant: ParticipantId,
    pub outcome: MatchOutcome,
    pub xp: i64,
    pub gold: u64,
    pub item: Option<ItemDrop>,
    /// Proportional XP penalty for losers; percent of the character's
    /// stored XP, applied by the runtime.
    pub trauma_percent: u32,
}

/// Distributes rewards for a completed battle.
///
/// Winners draw from the win row (scaled by their level multiplier against
/// the highest opposing level) and roll an independent item drop. Losers
/// draw the consolation row and carry the battle's trauma percent. A draw
/// pays every side the loser row without trauma.
pub fn distribute(
    battle: &Battle,
    table: &RewardTable,
    winner: Option<TeamId>,
    rng: &mut CombatRng,
) -> Vec<RewardGrant> {
    let teams = battle.teams();
    let largest_team = teams
        .iter()
        .map(|&t| battle.participants().iter().filter(|p| p.team == t).count())
        .max()
        .unwrap_or(1);
    let format = format_for(battle.kind, teams.len(), largest_team);
    let row = table.row(format);

    battle
        .participants()
        .iter()
        .map(|p| {
            let opponent_level = battle
                .participants()
                .iter()
                .filter(|o| o.team != p.team)
                .map(|o| o.level)
                .max()
                .unwrap_or(p.level);
            let multiplier = level_multiplier(p.level, opponent_level);

            match winner {
                Some(team) if team == p.team => RewardGrant {
                    participant: p.id,
                    outcome: MatchOutcome::Victory,
                    xp: (row.win_xp as f64 * multiplier).round() as i64,
                    gold: (row.win_gold as f64 * multiplier).round() as u64,
                    item: roll_drop(p.level, row.drop_percent, rng),
                    trauma_percent: 0,
                },
                Some(_) => RewardGrant {
                    participant: p.id,
                    outcome: MatchOutcome::Defeat,
                    xp: (row.lose_xp as f64 * multiplier).round() as i64,
                    gold: row.lose_gold,
                    item: None,
                    trauma_percent: battle.trauma_percent,
                },
                None => RewardGrant {
                    participant: p.id,
                    outcome: MatchOutcome::Draw,
                    xp: (row.lose_xp as f64 * multiplier).round() as i64,
                    gold: row.lose_gold,
                    item: None,
                    trauma_percent: 0,
                },
            }
        })
        .collect()
}
