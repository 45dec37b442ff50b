//! The shared query cache.
//!
//! `QueryClient` maps [`QueryKey`]s to the last fetched payload. Payloads are
//! held as JSON so one cache serves every resource type and can be mirrored
//! to the offline store unchanged.
//!
//! Fetches run as detached tokio tasks. Callers await a shared handle to
//! the task, so identical queries issued while a fetch is running join it
//! instead of starting another, and a caller that goes away early does not
//! stop the result from landing in the cache.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{QueryFilter, QueryKey, QueryOptions, QueryState, QueryStatus};
use crate::api::ApiError;
use crate::cache::{CachedData, OfflineStore};

#[derive(Debug, Clone)]
struct Fetched {
    value: Value,
    fetched_at: DateTime<Utc>,
    from_offline: bool,
}

type FetchOutcome = Result<Fetched, Arc<ApiError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct InFlight {
    epoch: u64,
    fetch: SharedFetch,
}

struct Entry {
    data: Option<CachedData<Value>>,
    error: Option<Arc<ApiError>>,
    invalidated: bool,
    from_offline: bool,
    /// Changes on every invalidation; a fetch may only write to the epoch it
    /// started in.
    epoch: u64,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new(epoch: u64) -> Self {
        Self {
            data: None,
            error: None,
            invalidated: false,
            from_offline: false,
            epoch,
            in_flight: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated
            && self
                .data
                .as_ref()
                .is_some_and(|d| !d.is_older_than(stale_time))
    }

    fn state<T: DeserializeOwned>(&self) -> QueryState<T> {
        let data = match &self.data {
            Some(cached) => match serde_json::from_value::<T>(cached.data.clone()) {
                Ok(data) => Some(data),
                Err(e) => {
                    return QueryState {
                        error: Some(Arc::new(ApiError::Decode(e))),
                        status: QueryStatus::Error,
                        ..QueryState::default()
                    }
                }
            },
            None => None,
        };

        let status = if self.error.is_some() {
            QueryStatus::Error
        } else if data.is_some() {
            QueryStatus::Success
        } else if self.in_flight.is_some() {
            QueryStatus::Loading
        } else {
            QueryStatus::Idle
        };

        QueryState {
            data,
            error: self.error.clone(),
            status,
            is_loading: self.in_flight.is_some(),
            updated_at: self.data.as_ref().map(|d| d.cached_at),
            from_offline: self.from_offline,
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_epoch: AtomicU64,
    offline: Option<OfflineStore>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_epoch(&self) -> u64 {
        self.next_epoch.fetch_add(1, Ordering::Relaxed)
    }

    fn offline_copy(&self, key: &QueryKey) -> Option<CachedData<Value>> {
        let store = self.offline.as_ref()?;
        match store.load(key) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read offline cache");
                None
            }
        }
    }

    /// Record the result of the fetch that started in `epoch`.
    ///
    /// Only a fetch that is still current updates the cache and the offline
    /// store.
    fn complete(
        &self,
        key: &QueryKey,
        epoch: u64,
        outcome: Result<Value, ApiError>,
        offline_fallback: bool,
    ) -> FetchOutcome {
        let outcome = match outcome {
            Ok(value) => Ok(Fetched {
                value,
                fetched_at: Utc::now(),
                from_offline: false,
            }),
            Err(error) if offline_fallback && error.is_transport() => {
                match self.offline_copy(key) {
                    Some(cached) => {
                        warn!(key = %key, error = %error, age = %cached.age_display(), "Network unreachable, serving offline copy");
                        Ok(Fetched {
                            value: cached.data,
                            fetched_at: cached.cached_at,
                            from_offline: true,
                        })
                    }
                    None => Err(Arc::new(error)),
                }
            }
            Err(error) => Err(Arc::new(error)),
        };

        if !self.record(key, epoch, &outcome) {
            return outcome;
        }
        if let (Some(store), Ok(fetched)) = (&self.offline, &outcome) {
            if !fetched.from_offline {
                if let Err(e) = store.save(key, &fetched.value) {
                    warn!(key = %key, error = %e, "Failed to write offline cache");
                }
            }
        }
        outcome
    }

    /// Write `outcome` into the entry if the fetch is still current.
    /// Returns whether it was written.
    fn record(&self, key: &QueryKey, epoch: u64, outcome: &FetchOutcome) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "Query removed while fetching, dropping result");
            return false;
        };
        if entry.in_flight.as_ref().is_some_and(|f| f.epoch == epoch) {
            entry.in_flight = None;
        }
        if entry.epoch != epoch {
            debug!(key = %key, "Discarding result of a fetch superseded by invalidation");
            return false;
        }

        match outcome {
            Ok(fetched) => {
                entry.data = Some(CachedData {
                    data: fetched.value.clone(),
                    cached_at: fetched.fetched_at,
                });
                entry.error = None;
                // Offline copies are shown but refetched on the next read
                entry.invalidated = fetched.from_offline;
                entry.from_offline = fetched.from_offline;
            }
            Err(error) => {
                debug!(key = %key, error = %error, "Fetch failed");
                entry.error = Some(Arc::clone(error));
            }
        }
        true
    }
}

/// Process-wide query cache, passed explicitly to whoever needs it.
///
/// Cloning is cheap and every clone shares the same entries. `fetch_query`
/// spawns onto the current tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.len())
            .field("offline", &self.inner.offline.is_some())
            .finish()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A client that mirrors successful fetches to `store` and falls back
    /// to it when the network is unreachable.
    pub fn with_offline_store(store: OfflineStore) -> Self {
        Self::build(Some(store))
    }

    fn build(offline: Option<OfflineStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_epoch: AtomicU64::new(0),
                offline,
            }),
        }
    }

    pub fn offline_store(&self) -> Option<&OfflineStore> {
        self.inner.offline.as_ref()
    }

    /// Return data for `key`, fetching it with `fetch` unless fresh data is
    /// cached or a fetch for the key is already running.
    ///
    /// A disabled query never calls `fetch`; it reports whatever is cached
    /// with `is_loading == false`.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        fetch: F,
        options: QueryOptions,
    ) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled {
            debug!(key = %key, "Query disabled, not fetching");
            let mut state = self.query_state::<T>(&key);
            state.is_loading = false;
            if state.status == QueryStatus::Loading {
                state.status = QueryStatus::Idle;
            }
            return state;
        }

        let (shared, start) = {
            let mut entries = self.inner.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(self.inner.next_epoch()));

            if entry.is_fresh(options.stale_time) {
                debug!(key = %key, "Cache hit");
                return entry.state();
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(key = %key, "Joining in-flight fetch");
                    (in_flight.fetch.clone(), None)
                }
                None => {
                    let (tx, rx) = oneshot::channel::<FetchOutcome>();
                    let shared = async move {
                        rx.await.unwrap_or_else(|_| {
                            Err(Arc::new(ApiError::Task(
                                "fetch task ended without a result".into(),
                            )))
                        })
                    }
                    .boxed()
                    .shared();
                    entry.in_flight = Some(InFlight {
                        epoch: entry.epoch,
                        fetch: shared.clone(),
                    });
                    (shared, Some((tx, entry.epoch)))
                }
            }
        };

        if let Some((tx, epoch)) = start {
            debug!(key = %key, "Starting fetch");
            let request = fetch();
            let inner = Arc::clone(&self.inner);
            let task_key = key.clone();
            tokio::spawn(async move {
                let outcome = AssertUnwindSafe(async move {
                    let value = request.await?;
                    serde_json::to_value(value).map_err(ApiError::Decode)
                })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ApiError::Task("fetch panicked".into())));
                let outcome = inner.complete(&task_key, epoch, outcome, options.offline_fallback);
                // Every waiter may have gone away; the cache is already updated
                let _ = tx.send(outcome);
            });
        }

        match shared.await {
            Ok(fetched) => match serde_json::from_value::<T>(fetched.value) {
                Ok(data) => QueryState {
                    data: Some(data),
                    error: None,
                    status: QueryStatus::Success,
                    is_loading: false,
                    updated_at: Some(fetched.fetched_at),
                    from_offline: fetched.from_offline,
                },
                Err(e) => QueryState {
                    error: Some(Arc::new(ApiError::Decode(e))),
                    status: QueryStatus::Error,
                    ..QueryState::default()
                },
            },
            Err(error) => {
                let mut state = self.query_state::<T>(&key);
                if state.error.is_none() {
                    // Superseded or removed entries keep no error of their own
                    state.error = Some(error);
                }
                state.status = QueryStatus::Error;
                state.is_loading = false;
                state
            }
        }
    }

    /// Current state for `key` without fetching.
    pub fn query_state<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        self.inner
            .lock()
            .get(key)
            .map(Entry::state)
            .unwrap_or_default()
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, ApiError> {
        let entries = self.inner.lock();
        match entries.get(key).and_then(|e| e.data.as_ref()) {
            Some(cached) => serde_json::from_value(cached.data.clone())
                .map(Some)
                .map_err(ApiError::Decode),
            None => Ok(None),
        }
    }

    /// Replace the data cached under `key`, as if it had just been fetched.
    pub fn set_query_data<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(data).map_err(ApiError::Decode)?;
        let mut entries = self.inner.lock();
        let entry = entries
            .entry(key)
            .or_insert_with(|| Entry::new(self.inner.next_epoch()));
        entry.data = Some(CachedData::new(value));
        entry.error = None;
        entry.invalidated = false;
        entry.from_offline = false;
        Ok(())
    }

    /// Derive new data for `key` from what is cached.
    ///
    /// `update` runs while the cache is locked and must not call back into
    /// this client.
    pub fn update_query_data<T, F>(&self, key: QueryKey, update: F) -> Result<(), ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let mut entries = self.inner.lock();
        let entry = entries
            .entry(key)
            .or_insert_with(|| Entry::new(self.inner.next_epoch()));
        let current = match &entry.data {
            Some(cached) => Some(serde_json::from_value(cached.data.clone()).map_err(ApiError::Decode)?),
            None => None,
        };
        let next = serde_json::to_value(update(current)).map_err(ApiError::Decode)?;
        entry.data = Some(CachedData::new(next));
        entry.error = None;
        entry.invalidated = false;
        entry.from_offline = false;
        Ok(())
    }

    /// Mark every matching entry stale so the next read refetches.
    ///
    /// Running fetches for those keys are detached: their callers still get
    /// a result, but it is not written to the cache. Returns the number of
    /// entries touched.
    pub fn invalidate_queries(&self, filter: &QueryFilter) -> usize {
        let mut entries = self.inner.lock();
        let mut count = 0;
        for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
            debug!(key = %key, "Invalidating query");
            entry.invalidated = true;
            entry.epoch = self.inner.next_epoch();
            entry.in_flight = None;
            count += 1;
        }
        count
    }

    /// Drop matching entries entirely. Returns the number removed.
    pub fn remove_queries(&self, filter: &QueryFilter) -> usize {
        let mut entries = self.inner.lock();
        let before = entries.len();
        entries.retain(|key, _| !filter.matches(key));
        before - entries.len()
    }

    /// Drop every entry. The offline store is left alone.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .lock()
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.inner.lock().get(key).is_some_and(|e| e.invalidated)
    }

    /// Cached keys in sorted order.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.inner.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
