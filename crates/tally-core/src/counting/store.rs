use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, warn};

use crate::{
    domain::{iso_timestamp_utc, CounterState, UserId},
    errors::Error,
    ports::StateStore,
    Result,
};

const COUNTER_DOC_KEY: &str = "countData";

/// Durable holder of the canonical count state.
///
/// All mutation goes through `commit_accept` / `commit_reset`, which update
/// `(last_number, last_acceptor_id)` as a unit and write through to the
/// backing store before returning. A hung or failing write degrades the store
/// to in-memory authority for the rest of the process lifetime: the game
/// keeps working, cross-restart continuity is lost.
pub struct CounterStore {
    backend: Arc<dyn StateStore>,
    write_timeout: Duration,
    state: Mutex<CounterState>,
    degraded: AtomicBool,
}

impl CounterStore {
    pub fn new(backend: Arc<dyn StateStore>, write_timeout: Duration) -> Self {
        Self {
            backend,
            write_timeout,
            state: Mutex::new(CounterState::default()),
            degraded: AtomicBool::new(false),
        }
    }

    /// Fetch the persisted snapshot, initializing (and persisting) the zero
    /// state if none exists. On `PersistenceUnavailable` the in-memory state
    /// stays at zero and the caller decides how loudly to log.
    pub async fn load(&self) -> Result<CounterState> {
        let doc = timeout(self.write_timeout, self.backend.get(COUNTER_DOC_KEY))
            .await
            .map_err(|_| Error::PersistenceUnavailable("state load timed out".to_string()))?
            .map_err(|e| Error::PersistenceUnavailable(e.to_string()))?;

        match doc {
            Some(value) => {
                let loaded: CounterState = serde_json::from_value(value)
                    .map_err(|e| Error::PersistenceUnavailable(format!("corrupt counter document: {e}")))?;
                *self.state.lock().await = loaded.clone();
                Ok(loaded)
            }
            None => {
                let initial = self.state.lock().await.clone();
                self.persist(&initial).await;
                Ok(initial)
            }
        }
    }

    pub async fn snapshot(&self) -> CounterState {
        self.state.lock().await.clone()
    }

    /// Atomically advance the count. The only path that moves `last_number`
    /// forward.
    pub async fn commit_accept(&self, number: u64, acceptor: UserId) {
        let committed = {
            let mut st = self.state.lock().await;
            st.last_number = number;
            st.last_acceptor_id = Some(acceptor);
            st.updated_at = iso_timestamp_utc();
            st.clone()
        };
        self.persist(&committed).await;
    }

    /// Atomically reset to `(0, None)`.
    pub async fn commit_reset(&self) {
        let committed = {
            let mut st = self.state.lock().await;
            st.last_number = 0;
            st.last_acceptor_id = None;
            st.updated_at = iso_timestamp_utc();
            st.clone()
        };
        self.persist(&committed).await;
    }

    async fn persist(&self, state: &CounterState) {
        let value = match serde_json::to_value(state) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "counter state not serializable; skipping write");
                return;
            }
        };

        let outcome = timeout(self.write_timeout, self.backend.put(COUNTER_DOC_KEY, value)).await;
        let error = match outcome {
            Ok(Ok(())) => {
                self.degraded.store(false, Ordering::SeqCst);
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "state write timed out".to_string(),
        };

        // Log the degradation loudly once; repeats stay at debug.
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(error = %error, "persistence unavailable; counter state continues in memory only");
        } else {
            debug!(error = %error, "counter state write failed again");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::{collections::HashMap, sync::Mutex as StdMutex};

    #[derive(Default)]
    struct MemoryStore {
        docs: StdMutex<HashMap<String, Value>>,
        fail_writes: bool,
        hang_writes: bool,
    }

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            Ok(self.docs.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: Value) -> Result<()> {
            if self.hang_writes {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail_writes {
                return Err(Error::PersistenceUnavailable("down".to_string()));
            }
            self.docs.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
    }

    fn store_with(backend: Arc<MemoryStore>) -> CounterStore {
        CounterStore::new(backend, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn load_without_document_initializes_and_persists_zero() {
        let backend = Arc::new(MemoryStore::default());
        let store = store_with(backend.clone());

        let state = store.load().await.unwrap();
        assert_eq!(state.last_number, 0);
        assert_eq!(state.last_acceptor_id, None);

        let doc = backend.docs.lock().unwrap().get(COUNTER_DOC_KEY).cloned().unwrap();
        assert_eq!(doc["lastNumber"], 0);
        assert!(doc["lastAcceptorId"].is_null());
    }

    #[tokio::test]
    async fn load_resumes_persisted_state() {
        let backend = Arc::new(MemoryStore::default());
        backend.docs.lock().unwrap().insert(
            COUNTER_DOC_KEY.to_string(),
            serde_json::json!({
                "lastNumber": 42,
                "lastAcceptorId": "U1",
                "updatedAt": "2026-01-01T00:00:00+00:00",
            }),
        );

        let store = store_with(backend);
        let state = store.load().await.unwrap();
        assert_eq!(state.last_number, 42);
        assert_eq!(state.last_acceptor_id, Some(UserId("U1".to_string())));

        // Snapshot reflects the loaded state.
        assert_eq!(store.snapshot().await.last_number, 42);
    }

    #[tokio::test]
    async fn commit_accept_writes_through() {
        let backend = Arc::new(MemoryStore::default());
        let store = store_with(backend.clone());

        store.commit_accept(1, UserId("A".to_string())).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.last_number, 1);
        assert_eq!(snap.last_acceptor_id, Some(UserId("A".to_string())));

        let doc = backend.docs.lock().unwrap().get(COUNTER_DOC_KEY).cloned().unwrap();
        assert_eq!(doc["lastNumber"], 1);
        assert_eq!(doc["lastAcceptorId"], "A");
    }

    #[tokio::test]
    async fn commit_reset_clears_number_and_acceptor_together() {
        let backend = Arc::new(MemoryStore::default());
        let store = store_with(backend.clone());

        store.commit_accept(7, UserId("A".to_string())).await;
        store.commit_reset().await;

        let snap = store.snapshot().await;
        assert_eq!(snap.last_number, 0);
        assert_eq!(snap.last_acceptor_id, None);

        let doc = backend.docs.lock().unwrap().get(COUNTER_DOC_KEY).cloned().unwrap();
        assert_eq!(doc["lastNumber"], 0);
        assert!(doc["lastAcceptorId"].is_null());
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_memory() {
        let backend = Arc::new(MemoryStore {
            fail_writes: true,
            ..Default::default()
        });
        let store = store_with(backend);

        store.commit_accept(1, UserId("A".to_string())).await;
        store.commit_accept(2, UserId("B".to_string())).await;

        // In-memory game continues.
        assert_eq!(store.snapshot().await.last_number, 2);
    }

    #[tokio::test]
    async fn hung_write_times_out_and_degrades() {
        let backend = Arc::new(MemoryStore {
            hang_writes: true,
            ..Default::default()
        });
        let store = store_with(backend);

        // Completes within the write timeout instead of hanging forever.
        store.commit_accept(1, UserId("A".to_string())).await;
        assert_eq!(store.snapshot().await.last_number, 1);
    }

    #[tokio::test]
    async fn corrupt_document_reports_persistence_unavailable() {
        let backend = Arc::new(MemoryStore::default());
        backend
            .docs
            .lock()
            .unwrap()
            .insert(COUNTER_DOC_KEY.to_string(), serde_json::json!("not an object"));

        let store = store_with(backend);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::PersistenceUnavailable(_)));
    }
}
