//! Client-side synchronization of editor content.
//!
//! One instance per connected editing client. Local keystrokes update the
//! local view immediately and arm the debouncer; the trailing-edge fire
//! commits the settled content to the state store and logs exactly one
//! content-changed event spanning the whole burst. Server pushes from other
//! origins are adopted only when no local edit is in flight.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::EventPayload;

use super::debounce::Debouncer;
use super::event_log::EventLog;
use super::state_store::StateStore;

struct SyncInner {
    /// What the client currently displays.
    local: String,
    /// Last content known committed to the store.
    committed: String,
    /// Local edits not yet committed.
    dirty: bool,
    connected: bool,
}

pub struct EditorSync {
    session_id: Uuid,
    inner: Arc<Mutex<SyncInner>>,
    debouncer: Debouncer<String>,
}

impl EditorSync {
    /// Attaches to a session's current editor state and starts the debounce
    /// worker.
    pub async fn connect(
        session_id: Uuid,
        state_store: Arc<StateStore>,
        event_log: Arc<EventLog>,
        debounce: Duration,
    ) -> DomainResult<Self> {
        let state = state_store.state(session_id).await?;
        let state_id = state.id;

        let inner = Arc::new(Mutex::new(SyncInner {
            local: state.editor.content.clone(),
            committed: state.editor.content,
            dirty: false,
            connected: true,
        }));

        let commit_inner = Arc::clone(&inner);
        let debouncer = Debouncer::new(debounce, move |latest: String| {
            let inner = Arc::clone(&commit_inner);
            let store = Arc::clone(&state_store);
            let log = Arc::clone(&event_log);
            async move {
                let before = inner.lock().await.committed.clone();
                if latest == before {
                    let mut guard = inner.lock().await;
                    guard.dirty = guard.local != guard.committed;
                    return;
                }

                if let Err(e) = store.patch_editor(session_id, &latest).await {
                    warn!(%session_id, error = %e, "editor commit failed");
                    return;
                }
                if let Err(e) = log
                    .append(
                        state_id,
                        &EventPayload::ContentChanged {
                            before,
                            after: latest.clone(),
                        },
                    )
                    .await
                {
                    warn!(%session_id, error = %e, "content-changed event append failed");
                }

                let mut guard = inner.lock().await;
                guard.committed = latest;
                // a keystroke may have landed during the async commit
                guard.dirty = guard.local != guard.committed;
            }
        });

        Ok(Self {
            session_id,
            inner,
            debouncer,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// A local keystroke. Returns false when the client is disconnected
    /// (read-only) or the content is unchanged; otherwise updates the local
    /// view and restarts the debounce timer.
    pub async fn on_edit(&self, content: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if !guard.connected || guard.local == content {
            return false;
        }
        guard.local = content.to_string();
        guard.dirty = true;
        drop(guard);

        self.debouncer.submit(content.to_string());
        true
    }

    /// A server push of committed content from another origin. Echoes of our
    /// own commits are ignored; a genuinely different push is adopted only
    /// when no local edit is pending, because in-flight local edits win.
    pub async fn on_push(&self, content: &str) {
        let mut guard = self.inner.lock().await;
        if guard.committed == content {
            return;
        }
        if guard.dirty {
            return;
        }
        guard.committed = content.to_string();
        guard.local = content.to_string();
    }

    /// Forces any pending edit through immediately.
    pub async fn flush(&self) {
        self.debouncer.flush().await;
    }

    /// Connects or disconnects the client. Disconnecting flushes the pending
    /// edit first; edits are then rejected until the client reconnects.
    pub async fn set_connected(&self, connected: bool) {
        if !connected {
            self.flush().await;
        }
        self.inner.lock().await.connected = connected;
    }

    pub async fn local_content(&self) -> String {
        self.inner.lock().await.local.clone()
    }

    pub async fn is_dirty(&self) -> bool {
        self.inner.lock().await.dirty
    }
}
