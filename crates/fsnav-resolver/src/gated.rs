//! Revision-gated memoization.
//!
//! A [`GatedCache`] declares which revision domains it depends on. An entry is
//! reused only while the counters of those domains are unchanged since the
//! entry was created; any bump makes every entry stale. Concurrent readers of
//! the same key share one in-flight fetch. The number of entries is capped;
//! once full, the oldest entry makes room for a new key.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::revision::{Domain, RevisionStamp, RevisionStore};

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Non-blocking view of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<V, E> {
    /// No current entry for the key.
    Empty,
    Loading,
    Ready(V),
    Failed(E),
}

struct Entry<V, E> {
    stamp: RevisionStamp,
    generation: u64,
    fetch: SharedFetch<V, E>,
}

pub struct GatedCache<K, V, E> {
    name: &'static str,
    deps: &'static [Domain],
    revisions: Arc<RevisionStore>,
    entries: Mutex<HashMap<K, Entry<V, E>>>,
    max_entries: usize,
    generations: AtomicU64,
    fetches: AtomicU64,
}

impl<K, V, E> GatedCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(name: &'static str, deps: &'static [Domain], revisions: Arc<RevisionStore>) -> Self {
        Self {
            name,
            deps,
            revisions,
            entries: Mutex::new(HashMap::new()),
            max_entries: DEFAULT_MAX_ENTRIES,
            generations: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Caps the number of live entries (at least one).
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    #[must_use]
    pub fn deps(&self) -> &'static [Domain] {
        self.deps
    }

    /// Returns the current value for `key`, starting `fetch` when there is no
    /// entry created under the current revisions.
    ///
    /// A failed fetch is removed so the next read starts a new one; every
    /// waiter of the failed fetch sees the same error.
    ///
    /// # Errors
    ///
    /// Returns whatever error the shared fetch produced.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (shared, generation) = {
            let mut entries = self.lock();
            // Stamp under the lock: a bump must not slip in before retain.
            let stamp = self.revisions.stamp(self.deps);
            entries.retain(|_, entry| entry.stamp == stamp);
            if let Some(entry) = entries.get(&key) {
                tracing::debug!(cache = self.name, ?key, "cache hit");
                (entry.fetch.clone(), entry.generation)
            } else {
                tracing::debug!(cache = self.name, ?key, "cache miss");
                let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                self.fetches.fetch_add(1, Ordering::Relaxed);
                if entries.len() >= self.max_entries {
                    evict_oldest(&mut entries, self.name);
                }
                let shared = fetch().boxed().shared();
                entries.insert(
                    key.clone(),
                    Entry {
                        stamp,
                        generation,
                        fetch: shared.clone(),
                    },
                );
                (shared, generation)
            }
        };

        let result = shared.await;
        if result.is_err() {
            let mut entries = self.lock();
            if entries
                .get(&key)
                .is_some_and(|entry| entry.generation == generation)
            {
                entries.remove(&key);
            }
        }
        result
    }

    /// Reports the state of the entry for `key` without awaiting it.
    #[must_use]
    pub fn peek(&self, key: &K) -> Loadable<V, E> {
        let entries = self.lock();
        let stamp = self.revisions.stamp(self.deps);
        match entries.get(key) {
            Some(entry) if entry.stamp == stamp => match entry.fetch.peek() {
                Some(Ok(value)) => Loadable::Ready(value.clone()),
                Some(Err(err)) => Loadable::Failed(err.clone()),
                None => Loadable::Loading,
            },
            _ => Loadable::Empty,
        }
    }

    /// Number of fetches started since construction.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of live entries, stale ones included until the next read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V, E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn evict_oldest<K, V, E>(entries: &mut HashMap<K, Entry<V, E>>, cache: &'static str)
where
    K: Eq + Hash + Clone + Debug,
{
    let oldest = entries
        .iter()
        .min_by_key(|(_, entry)| entry.generation)
        .map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        tracing::debug!(cache, ?key, "cache full, evicting oldest entry");
        entries.remove(&key);
    }
}
