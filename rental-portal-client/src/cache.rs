use std::{
    any::Any,
    collections::HashMap,
    fmt::{Display, Formatter},
    future::Future,
    time::Duration,
};

use common::error::CrResult;
use log::{debug, warn};
use tokio::{sync::RwLock, time::Instant};

/// Ordered list of segments identifying a cached server response, e.g. `["cars", "64f1"]`.
/// Invalidation works on prefixes so `["cars"]` covers every car query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Key with a single `root` segment
    pub fn root(root: &str) -> Self {
        Self(vec![root.to_owned()])
    }

    /// Append a `segment` to the key
    #[must_use]
    pub fn with<S: Display>(mut self, segment: S) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if every segment of `prefix` matches the start of this key
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Freshness of a cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Missing,
    Fresh,
    Stale,
}

/// Cached value and the bookkeeping needed to decide freshness
struct Entry {
    value: Box<dyn Any + Send + Sync>,
    fetched_at: Instant,
    invalidated: bool,
}

impl Entry {
    fn state(&self, stale_time: Duration) -> QueryState {
        if self.invalidated || self.fetched_at.elapsed() >= stale_time {
            QueryState::Stale
        } else {
            QueryState::Fresh
        }
    }
}

/// In-memory cache of server responses keyed by [QueryKey]. Each read states how long a value
/// stays fresh; a stale or invalidated entry is refetched on the next read but can still be
/// peeked for display while the refetch happens.
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value of `key` when fresh, otherwise run `fetcher`, store its result and
    /// return it. Failed fetches leave the previous entry untouched.
    /// # Errors
    /// This function will return an error if the `fetcher` fails
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, stale_time: Duration, fetcher: F) -> CrResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CrResult<T>>,
    {
        if let Some(value) = self.fresh(&key, stale_time).await {
            debug!("Cache hit for {key}");
            return Ok(value);
        }
        debug!("Cache miss for {key}");
        let value = fetcher().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }

    /// Cached value of `key` only if it is still fresh
    async fn fresh<T>(&self, key: &QueryKey, stale_time: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.state(stale_time) != QueryState::Fresh {
            return None;
        }
        downcast(key, entry)
    }

    /// Cached value of `key` regardless of freshness
    pub async fn peek<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| downcast(key, entry))
    }

    /// Freshness of `key` for the given `stale_time`
    pub async fn state(&self, key: &QueryKey, stale_time: Duration) -> QueryState {
        self.entries
            .read()
            .await
            .get(key)
            .map_or(QueryState::Missing, |entry| entry.state(stale_time))
    }

    /// Store `value` under `key`, replacing any previous entry
    pub async fn set<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let entry = Entry {
            value: Box::new(value),
            fetched_at: Instant::now(),
            invalidated: false,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Mark every entry under `prefix` as stale. Returns the number of entries affected.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!("Invalidated {count} cache entries under {prefix}");
        count
    }

    /// Drop the entry of `key`. Returns true if an entry existed.
    pub async fn remove(&self, key: &QueryKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every entry, used on logout
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Read the value of `entry` as `T`. A type mismatch means two queries share a key.
fn downcast<T>(key: &QueryKey, entry: &Entry) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    let value = entry.value.downcast_ref::<T>().cloned();
    if value.is_none() {
        warn!("Cache entry {key} does not hold the requested type");
    }
    value
}
