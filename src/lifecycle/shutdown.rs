//! Shutdown coordination for the streamer.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Coordinator for graceful shutdown.
///
/// Servers subscribe to the broadcast channel; tail sessions hang off a
/// cancellation token. Triggering fires both.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Parent of every tail session's token.
    sessions: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            sessions: CancellationToken::new(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Token for a new tail session; cancelled when shutdown triggers.
    pub fn session_token(&self) -> CancellationToken {
        self.sessions.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.sessions.cancel();
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.sessions.is_cancelled()
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger, then wait until every subscriber has dropped its receiver.
    pub async fn trigger_and_drain(&self) {
        self.trigger();
        while self.receiver_count() > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
