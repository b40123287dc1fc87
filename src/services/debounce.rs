//! Trailing-edge debouncer.
//!
//! Collapses a burst of values into one commit: each new value restarts the
//! quiet timer, and only the latest value is delivered once the timer runs
//! out. Intermediate values are dropped by design.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum DebounceMsg<T> {
    Value(T),
    Flush(oneshot::Sender<()>),
}

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<DebounceMsg<T>>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the debounce worker. `on_fire` runs once per settled burst
    /// with the latest submitted value.
    pub fn new<F, Fut>(quiet: Duration, mut on_fire: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<DebounceMsg<T>>();

        let worker = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    Some(value) => match tokio::time::timeout(quiet, rx.recv()).await {
                        // newer value supersedes; the timer restarts
                        Ok(Some(DebounceMsg::Value(v))) => pending = Some(v),
                        Ok(Some(DebounceMsg::Flush(ack))) => {
                            on_fire(value).await;
                            let _ = ack.send(());
                        }
                        Ok(None) => {
                            on_fire(value).await;
                            break;
                        }
                        // quiet period elapsed
                        Err(_) => on_fire(value).await,
                    },
                    None => match rx.recv().await {
                        Some(DebounceMsg::Value(v)) => pending = Some(v),
                        Some(DebounceMsg::Flush(ack)) => {
                            let _ = ack.send(());
                        }
                        None => break,
                    },
                }
            }
        });

        Self { tx, worker }
    }

    /// Submits a value, restarting the quiet timer.
    pub fn submit(&self, value: T) {
        let _ = self.tx.send(DebounceMsg::Value(value));
    }

    /// Forces any pending value through immediately and waits for the commit
    /// to finish. Used on disconnect and in tests.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(DebounceMsg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
