//! Broadcast channel for committed state updates.
//!
//! Every committed write to the session-state projection publishes one
//! [`StateUpdate`] here. Subscribers (browser transports, the voice agent
//! bridge) re-render from pushes instead of polling. The notifier is
//! constructor-injected wherever it is needed; there is no ambient global.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::{EditorState, TerminalState, TestCase};

/// One committed change to a session's projection.
#[derive(Debug, Clone)]
pub enum StateUpdate {
    Editor {
        session_id: Uuid,
        editor: EditorState,
    },
    Terminal {
        session_id: Uuid,
        terminal: TerminalState,
    },
    TestCases {
        session_id: Uuid,
        test_cases: Vec<TestCase>,
    },
    Stage {
        session_id: Uuid,
        stage_index: u32,
    },
}

impl StateUpdate {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Editor { session_id, .. }
            | Self::Terminal { session_id, .. }
            | Self::TestCases { session_id, .. }
            | Self::Stage { session_id, .. } => *session_id,
        }
    }
}

pub struct StateNotifier {
    tx: broadcast::Sender<StateUpdate>,
}

impl StateNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an update. Lagging or absent subscribers are not an error;
    /// the projection in storage stays authoritative.
    pub fn publish(&self, update: StateUpdate) {
        let _ = self.tx.send(update);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StateNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let notifier = StateNotifier::new(8);
        let mut rx = notifier.subscribe();

        let session_id = Uuid::new_v4();
        notifier.publish(StateUpdate::Editor {
            session_id,
            editor: EditorState {
                language: "python".to_string(),
                content: "x".to_string(),
                last_updated: Utc::now(),
            },
        });

        let update = rx.recv().await.unwrap();
        assert_eq!(update.session_id(), session_id);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let notifier = StateNotifier::new(8);
        notifier.publish(StateUpdate::Stage {
            session_id: Uuid::new_v4(),
            stage_index: 1,
        });
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
