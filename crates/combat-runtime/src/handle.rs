//! Client handle for one match worker.

use tokio::sync::{mpsc, oneshot};

use combat_core::{Battle, MatchId, ParticipantId, PlayerAction, TurnBundle};

use crate::error::{Result, RuntimeError};
use crate::worker::{ActionSummary, Command, SubmitSummary};

/// Cloneable handle to a running match.
///
/// Every call is serialized through the match's worker; callers block only
/// on that boundary, never on other participants.
#[derive(Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    tx: mpsc::Sender<Command>,
}

impl MatchHandle {
    pub(crate) fn new(match_id: MatchId, tx: mpsc::Sender<Command>) -> Self {
        Self { match_id, tx }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Starts the match.
    pub async fn start(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Processes one real-time action for a participant.
    pub async fn player_action(
        &self,
        actor: ParticipantId,
        action: PlayerAction,
    ) -> Result<ActionSummary> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PlayerAction {
            actor,
            action,
            reply,
        })
        .await?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Submits a round bundle; resolves the round when this submission
    /// completes readiness.
    pub async fn submit_turn(
        &self,
        actor: ParticipantId,
        bundle: TurnBundle,
    ) -> Result<SubmitSummary> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitTurn {
            actor,
            bundle,
            reply,
        })
        .await?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Forfeits on behalf of a participant.
    pub async fn forfeit(&self, actor: ParticipantId) -> Result<ActionSummary> {
        self.player_action(actor, PlayerAction::Flee).await
    }

    /// Cancels a match that has not finished.
    pub async fn cancel(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Cancel { reply }).await?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Read-only snapshot of the battle.
    pub async fn state(&self) -> Result<Battle> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::QueryState { reply }).await?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}

impl std::fmt::Debug for MatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchHandle")
            .field("match_id", &self.match_id)
            .finish()
    }
}
