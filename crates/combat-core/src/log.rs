//! Append-only combat log.
//!
//! Entries are ordered by a `(round, sequence)` tuple. The sequence is
//! assigned by the battle under its serialization boundary — never by the
//! writer — which keeps the order total and gap-free per round even when
//! several handlers contribute entries for the same resolution.

use serde::{Deserialize, Serialize};

use crate::ids::ParticipantId;

/// One record in the match history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub round: u32,
    /// Strictly increasing within a round, starting at 0.
    pub sequence: u32,
    pub message: String,
    pub payload: serde_json::Value,
    pub actor: Option<ParticipantId>,
    pub target: Option<ParticipantId>,
    pub damage: u32,
    pub healing: u32,
    pub tags: Vec<String>,
}

/// Draft entry before the battle assigns `(round, sequence)`.
#[derive(Clone, Debug, Default)]
pub struct LogLine {
    pub message: String,
    pub payload: serde_json::Value,
    pub actor: Option<ParticipantId>,
    pub target: Option<ParticipantId>,
    pub damage: u32,
    pub healing: u32,
    pub tags: Vec<String>,
}

impl LogLine {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn actor(mut self, actor: ParticipantId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn target(mut self, target: ParticipantId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    pub fn healing(mut self, healing: u32) -> Self {
        self.healing = healing;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Ordered log owned by one battle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<CombatLogEntry>,
    next_sequence: u32,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a draft, assigning the next sequence for the given round.
    pub fn append(&mut self, round: u32, line: LogLine) -> &CombatLogEntry {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(CombatLogEntry {
            round,
            sequence,
            message: line.message,
            payload: line.payload,
            actor: line.actor,
            target: line.target,
            damage: line.damage,
            healing: line.healing,
            tags: line.tags,
        });
        self.entries.last().expect("entry just pushed")
    }

    /// Resets the per-round sequence counter. Called when a round begins.
    pub fn begin_round(&mut self) {
        self.next_sequence = 0;
    }

    pub fn entries(&self) -> &[CombatLogEntry] {
        &self.entries
    }

    pub fn round_entries(&self, round: u32) -> impl Iterator<Item = &CombatLogEntry> {
        self.entries.iter().filter(move |e| e.round == round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_gap_free_within_a_round() {
        let mut log = CombatLog::new();
        log.begin_round();
        for _ in 0..5 {
            log.append(1, LogLine::message("swing"));
        }
        let seqs: Vec<u32> = log.round_entries(1).map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn begin_round_resets_the_counter() {
        let mut log = CombatLog::new();
        log.begin_round();
        log.append(1, LogLine::message("a"));
        log.begin_round();
        let entry = log.append(2, LogLine::message("b")).clone();
        assert_eq!(entry.round, 2);
        assert_eq!(entry.sequence, 0);
    }
}
