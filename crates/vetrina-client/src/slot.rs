//! # Resource Slot
//!
//! Async request coordinator over one [`Slot`]: the single-value
//! counterpart of [`ResourceStream`](crate::stream::ResourceStream), with
//! the same lock / fetch / apply cycle and the same generation discipline.

use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use vetrina_core::{ApplyOutcome, Slot, SlotSnapshot, SlotTicket};

use crate::error::ClientError;
use crate::fetcher::ValueFetcher;
use crate::stream::LoadOutcome;

/// One observable single-value resource.
pub struct ResourceSlot<F: ValueFetcher> {
    fetcher: F,
    state: RwLock<Slot<F::Value, F::Key>>,
    updates: watch::Sender<SlotSnapshot<F::Value, F::Key>>,
    request_timeout: Duration,
}

impl<F: ValueFetcher> ResourceSlot<F> {
    pub fn new(fetcher: F, request_timeout: Duration) -> Self {
        let slot = Slot::new();
        let (updates, _) = watch::channel(slot.snapshot());

        ResourceSlot {
            fetcher,
            state: RwLock::new(slot),
            updates,
            request_timeout,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn snapshot(&self) -> SlotSnapshot<F::Value, F::Key> {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SlotSnapshot<F::Value, F::Key>> {
        self.updates.subscribe()
    }

    /// Loads the value for `key`. The previous value stays visible until
    /// the new one lands.
    pub async fn load(&self, key: F::Key) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            let ticket = state.begin_load(key);
            self.publish(&state);
            ticket
        };
        self.run(ticket).await
    }

    /// Reloads the held key. Skipped when nothing has been loaded.
    pub async fn refresh(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.write().await;
            match state.begin_refresh() {
                Some(ticket) => {
                    self.publish(&state);
                    ticket
                }
                None => return LoadOutcome::Skipped,
            }
        };
        self.run(ticket).await
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.clear();
        self.publish(&state);
    }

    async fn run(&self, ticket: SlotTicket<F::Key>) -> LoadOutcome {
        let resource = self.fetcher.resource();
        debug!(%resource, key = ?ticket.key(), refresh = ticket.is_refresh(), "Loading value");

        let fetch = self.fetcher.fetch(ticket.key());
        let result = match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.request_timeout.as_secs())),
        };

        let generation = ticket.generation();
        let mut state = self.state.write().await;

        match result {
            Ok(value) => match state.apply_value(ticket, value) {
                ApplyOutcome::Applied => {
                    self.publish(&state);
                    info!(%resource, "Value applied");
                    LoadOutcome::Applied
                }
                ApplyOutcome::Stale => {
                    debug!(%resource, generation, "Dropping stale value");
                    LoadOutcome::Stale
                }
            },
            Err(err) => {
                let message = err.to_string();
                match state.apply_failure(&ticket, message.clone()) {
                    ApplyOutcome::Applied => {
                        self.publish(&state);
                        warn!(%resource, error = %message, "Load failed");
                        LoadOutcome::Failed(message)
                    }
                    ApplyOutcome::Stale => LoadOutcome::Stale,
                }
            }
        }
    }

    fn publish(&self, state: &Slot<F::Value, F::Key>) {
        self.updates.send_replace(state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use vetrina_core::{Resource, SlotPhase};

    use crate::error::ClientResult;

    /// Echoes the key back, or waits on a gate registered for it.
    #[derive(Default)]
    struct EchoFetcher {
        gates: Mutex<HashMap<String, oneshot::Receiver<ClientResult<String>>>>,
        calls: Mutex<usize>,
    }

    impl EchoFetcher {
        fn gate(&self, key: &str) -> oneshot::Sender<ClientResult<String>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(key.to_string(), rx);
            tx
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ValueFetcher for EchoFetcher {
        type Value = String;
        type Key = String;

        fn resource(&self) -> Resource {
            Resource::ProductDetail
        }

        async fn fetch(&self, key: &String) -> ClientResult<String> {
            let gate = {
                *self.calls.lock().unwrap() += 1;
                self.gates.lock().unwrap().remove(key)
            };
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".into()))),
                None => Ok(format!("detail of {}", key)),
            }
        }
    }

    fn slot() -> Arc<ResourceSlot<EchoFetcher>> {
        Arc::new(ResourceSlot::new(EchoFetcher::default(), Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn test_load_and_refresh() {
        let slot = slot();
        assert_eq!(slot.refresh().await, LoadOutcome::Skipped);

        assert_eq!(slot.load("7178.0010".to_string()).await, LoadOutcome::Applied);
        let snap = slot.snapshot();
        assert_eq!(snap.value.as_deref(), Some("detail of 7178.0010"));
        assert_eq!(snap.key.as_deref(), Some("7178.0010"));
        assert_eq!(snap.phase, SlotPhase::Idle);

        assert_eq!(slot.refresh().await, LoadOutcome::Applied);
        assert_eq!(slot.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn test_newest_key_wins() {
        let slot = slot();
        let gate_a = slot.fetcher().gate("a");

        let s = slot.clone();
        let load_a = tokio::spawn(async move { s.load("a".to_string()).await });
        while slot.fetcher().calls() < 1 {
            tokio::task::yield_now().await;
        }

        assert_eq!(slot.load("b".to_string()).await, LoadOutcome::Applied);
        gate_a.send(Ok("late a".to_string())).unwrap();
        assert_eq!(load_a.await.unwrap(), LoadOutcome::Stale);

        assert_eq!(slot.snapshot().value.as_deref(), Some("detail of b"));
    }

    #[tokio::test]
    async fn test_failure_keeps_value() {
        let slot = slot();
        slot.load("a".to_string()).await;

        let gate = slot.fetcher().gate("a");
        gate.send(Err(ClientError::Http {
            status: 404,
            message: "Product not found".into(),
        }))
        .unwrap();

        let outcome = slot.refresh().await;
        assert_eq!(
            outcome,
            LoadOutcome::Failed("Server returned 404: Product not found".into())
        );
        let snap = slot.snapshot();
        assert_eq!(snap.value.as_deref(), Some("detail of a"));
        assert!(snap.last_error.is_some());
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight() {
        let slot = slot();
        let gate = slot.fetcher().gate("a");

        let s = slot.clone();
        let load = tokio::spawn(async move { s.load("a".to_string()).await });
        while slot.fetcher().calls() < 1 {
            tokio::task::yield_now().await;
        }
        assert!(slot.snapshot().is_loading());

        slot.clear().await;
        gate.send(Ok("late".to_string())).unwrap();

        assert_eq!(load.await.unwrap(), LoadOutcome::Stale);
        assert_eq!(slot.snapshot(), SlotSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let slot = slot();
        let _gate = slot.fetcher().gate("slow");

        let outcome = slot.load("slow".to_string()).await;
        assert_eq!(
            outcome,
            LoadOutcome::Failed("Request timed out after 30 seconds".into())
        );
        assert_eq!(slot.snapshot().phase, SlotPhase::Idle);
    }
}
