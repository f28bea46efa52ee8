//! Per-match broadcast channels.
//!
//! Every match gets a participant channel and a spectator mirror. The
//! combat core returns events from its state transitions; the match worker
//! publishes them here. Publishing is best-effort — a match with no
//! listeners is normal.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use combat_core::{MatchEvent, MatchId};

struct MatchChannels {
    participants: broadcast::Sender<MatchEvent>,
    spectators: broadcast::Sender<MatchEvent>,
}

/// Event bus keyed by match id.
pub struct MatchEventBus {
    channels: Arc<RwLock<HashMap<MatchId, MatchChannels>>>,
    capacity: usize,
}

impl MatchEventBus {
    /// Creates a bus with default per-channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Creates the channels for a match. Idempotent.
    pub fn open(&self, match_id: MatchId) {
        if let Ok(mut channels) = self.channels.try_write() {
            channels.entry(match_id).or_insert_with(|| MatchChannels {
                participants: broadcast::channel(self.capacity).0,
                spectators: broadcast::channel(self.capacity).0,
            });
        }
    }

    /// Drops the channels for a finished match.
    pub fn close(&self, match_id: MatchId) {
        if let Ok(mut channels) = self.channels.try_write() {
            channels.remove(&match_id);
        }
    }

    /// Publishes an event to its match channel and mirrors it to the
    /// spectator channel. Best-effort: missing channels or absent
    /// subscribers are not errors.
    pub fn publish(&self, event: MatchEvent) {
        let match_id = event.match_id();
        match self.channels.try_read() {
            Ok(channels) => {
                if let Some(entry) = channels.get(&match_id) {
                    let _ = entry.spectators.send(event.clone());
                    if entry.participants.send(event).is_err() {
                        tracing::trace!(?match_id, "no subscribers for match channel");
                    }
                } else {
                    tracing::trace!(?match_id, "publish to unopened match channel");
                }
            }
            Err(_) => {
                // Bus under contention; events are best-effort.
                tracing::debug!(?match_id, "failed to acquire event bus lock");
            }
        }
    }

    /// Subscribes to a match's participant channel.
    pub fn subscribe(&self, match_id: MatchId) -> Option<broadcast::Receiver<MatchEvent>> {
        let channels = self.channels.try_read().ok()?;
        channels.get(&match_id).map(|c| c.participants.subscribe())
    }

    /// Subscribes to a match's spectator mirror.
    pub fn subscribe_spectators(
        &self,
        match_id: MatchId,
    ) -> Option<broadcast::Receiver<MatchEvent>> {
        let channels = self.channels.try_read().ok()?;
        channels.get(&match_id).map(|c| c.spectators.subscribe())
    }
}

impl Clone for MatchEventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            capacity: self.capacity,
        }
    }
}

impl Default for MatchEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_mirror_to_spectators() {
        let bus = MatchEventBus::new();
        let match_id = MatchId(1);
        bus.open(match_id);

        let mut participants = bus.subscribe(match_id).unwrap();
        let mut spectators = bus.subscribe_spectators(match_id).unwrap();

        bus.publish(MatchEvent::MatchStart { match_id });

        assert!(matches!(
            participants.try_recv().unwrap(),
            MatchEvent::MatchStart { .. }
        ));
        assert!(matches!(
            spectators.try_recv().unwrap(),
            MatchEvent::MatchStart { .. }
        ));
    }

    #[tokio::test]
    async fn publish_without_channel_is_a_no_op() {
        let bus = MatchEventBus::new();
        bus.publish(MatchEvent::MatchStart {
            match_id: MatchId(99),
        });
    }

    #[tokio::test]
    async fn closed_channels_stop_accepting_subscribers() {
        let bus = MatchEventBus::new();
        let match_id = MatchId(2);
        bus.open(match_id);
        bus.close(match_id);
        assert!(bus.subscribe(match_id).is_none());
    }
}
