//! Generic read-through cache for one entity family.
//!
//! Entries live in a two-level map `scope -> key -> entry` behind a single
//! lock. Each scope is bulk-loaded at most once through its [`ScopeGate`];
//! keys missing after the bulk load are resolved with a point query and
//! inserted on success. Remote calls never run while the store lock is held.
//!
//! Every eviction bumps a per-scope counter. A point query only inserts its
//! result if the counter is unchanged since the query started, so an eviction
//! that lands mid-query is not undone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::domain::errors::{CacheError, CacheResult, RemoteError};
use crate::services::collections::Collection;
use crate::services::pagination::paginate;
use crate::services::scope_gate::{ScopeGate, ScopeState};

type Buckets<C> =
    HashMap<<C as Collection>::Scope, HashMap<String, Arc<<C as Collection>::Entry>>>;

struct Store<C: Collection> {
    buckets: Buckets<C>,
    evictions: HashMap<C::Scope, u64>,
}

impl<C: Collection> Store<C> {
    fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            evictions: HashMap::new(),
        }
    }

    fn eviction_count(&self, scope: &C::Scope) -> u64 {
        self.evictions.get(scope).copied().unwrap_or(0)
    }
}

/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Scope loads that ran to completion.
    pub bulk_loads: u64,
    /// Pages applied, including pages of loads that later failed.
    pub pages: u64,
    /// Records applied from pages.
    pub records: u64,
    pub hits: u64,
    pub fallback_fetches: u64,
    pub not_found: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    bulk_loads: AtomicU64,
    pages: AtomicU64,
    records: AtomicU64,
    hits: AtomicU64,
    fallback_fetches: AtomicU64,
    not_found: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            bulk_loads: self.bulk_loads.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            fallback_fetches: self.fallback_fetches.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Read-through cache over one [`Collection`].
pub struct EntityCache<C: Collection> {
    collection: C,
    entries: RwLock<Store<C>>,
    gates: Mutex<HashMap<C::Scope, Arc<ScopeGate>>>,
    eviction_enabled: bool,
    counters: Counters,
}

impl<C: Collection> EntityCache<C> {
    /// Create an empty cache. With `eviction_enabled` false, [`evict`](Self::evict)
    /// is a logged no-op.
    pub fn new(collection: C, eviction_enabled: bool) -> Self {
        Self {
            collection,
            entries: RwLock::new(Store::new()),
            gates: Mutex::new(HashMap::new()),
            eviction_enabled,
            counters: Counters::default(),
        }
    }

    pub fn eviction_enabled(&self) -> bool {
        self.eviction_enabled
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    pub async fn scope_state(&self, scope: &C::Scope) -> ScopeState {
        self.gates
            .lock()
            .await
            .get(scope)
            .map_or(ScopeState::Unloaded, |gate| gate.state())
    }

    /// Load every record of `scope` unless it is already loaded.
    pub async fn bulk_load(&self, scope: &C::Scope) -> CacheResult<()> {
        self.bulk_load_with_cancel(scope, &CancellationToken::new())
            .await
    }

    /// [`bulk_load`](Self::bulk_load) that gives up when `cancel` fires.
    ///
    /// A cancelled or failed load leaves the scope unloaded; pages applied
    /// before the failure stay in the store and are overwritten by the retry.
    pub async fn bulk_load_with_cancel(
        &self,
        scope: &C::Scope,
        cancel: &CancellationToken,
    ) -> CacheResult<()> {
        let gate = self.gate(scope).await;
        // A caller queued behind another caller's load still honours its own token.
        tokio::select! {
            biased;
            loaded = gate.load_once(|| self.run_bulk_load(scope, &gate, cancel)) => {
                loaded.map(|_| ())
            }
            () = cancel.cancelled() => {
                tracing::debug!(kind = %C::KIND, scope = %scope, "stopped waiting for bulk load");
                Err(self.cancelled(scope))
            }
        }
    }

    /// Look up `key`, loading the scope first and falling back to a point
    /// query when the bulk data does not contain it.
    pub async fn get(&self, scope: &C::Scope, key: &str) -> CacheResult<Arc<C::Entry>> {
        self.get_with_cancel(scope, key, &CancellationToken::new())
            .await
    }

    pub async fn get_with_cancel(
        &self,
        scope: &C::Scope,
        key: &str,
        cancel: &CancellationToken,
    ) -> CacheResult<Arc<C::Entry>> {
        self.bulk_load_with_cancel(scope, cancel).await?;

        if let Some(entry) = self.peek(scope, key).await {
            Counters::bump(&self.counters.hits, 1);
            return Ok(entry);
        }

        self.fetch_fallback(scope, key, cancel).await
    }

    /// Lookup without any remote call.
    pub async fn peek(&self, scope: &C::Scope, key: &str) -> Option<Arc<C::Entry>> {
        self.entries
            .read()
            .await
            .buckets
            .get(scope)
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }

    /// Number of entries currently held for `scope`.
    pub async fn len(&self, scope: &C::Scope) -> usize {
        self.entries.read().await.buckets.get(scope).map_or(0, HashMap::len)
    }

    /// Every entry currently held for `scope`, ordered by key.
    pub async fn entries(&self, scope: &C::Scope) -> Vec<Arc<C::Entry>> {
        let entries = self.entries.read().await;
        let mut held: Vec<_> = entries
            .buckets
            .get(scope)
            .map(|bucket| bucket.iter().collect())
            .unwrap_or_default();
        held.sort_by(|(a, _), (b, _)| a.cmp(b));
        held.into_iter().map(|(_, entry)| Arc::clone(entry)).collect()
    }

    /// Remove `key` from `scope` so the next read re-fetches it.
    ///
    /// Waits for an in-flight load of the same scope first, so a page of that
    /// load cannot resurrect the entry. Point queries already in flight see the
    /// bumped eviction counter and do not insert. Returns whether an entry was
    /// removed.
    #[instrument(skip(self, scope), fields(kind = %C::KIND, scope = %scope))]
    pub async fn evict(&self, scope: &C::Scope, key: &str) -> bool {
        if !self.eviction_enabled {
            tracing::debug!(key, "eviction disabled for this entity, ignoring");
            return false;
        }

        let gate = self.gates.lock().await.get(scope).cloned();
        let Some(gate) = gate else {
            tracing::debug!(key, "scope never loaded, nothing to evict");
            return false;
        };
        gate.settled().await;

        let removed = {
            let mut store = self.entries.write().await;
            *store.evictions.entry(scope.clone()).or_default() += 1;
            store
                .buckets
                .get_mut(scope)
                .and_then(|bucket| bucket.remove(key))
                .is_some()
        };

        if removed {
            Counters::bump(&self.counters.evictions, 1);
        }
        tracing::debug!(key, removed, "evicted");
        removed
    }

    async fn gate(&self, scope: &C::Scope) -> Arc<ScopeGate> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(scope.clone()).or_default())
    }

    #[instrument(skip_all, fields(kind = %C::KIND, scope = %scope))]
    async fn run_bulk_load(
        &self,
        scope: &C::Scope,
        gate: &ScopeGate,
        cancel: &CancellationToken,
    ) -> CacheResult<()> {
        tracing::debug!("starting bulk load");

        let collection = &self.collection;
        let pages = paginate(move |cursor| collection.list_page(scope, cursor));
        futures::pin_mut!(pages);

        let mut page_count = 0u64;
        let mut record_count = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(pages = page_count, "bulk load cancelled");
                    return Err(self.cancelled(scope));
                }
                next = pages.try_next() => next.map_err(|source| {
                    tracing::warn!(pages = page_count, error = %source, "bulk load failed");
                    self.remote_error(scope, source)
                })?,
            };
            let Some(page) = next else { break };

            page_count += 1;
            record_count += page.records.len() as u64;
            Counters::bump(&self.counters.pages, 1);
            Counters::bump(&self.counters.records, page.records.len() as u64);

            let mut store = self.entries.write().await;
            for record in page.records {
                let key = C::key_of(&record).to_string();
                Self::insert_locked(&mut store.buckets, gate, scope, key, record);
            }
        }

        Counters::bump(&self.counters.bulk_loads, 1);
        tracing::info!(pages = page_count, records = record_count, "bulk load complete");
        Ok(())
    }

    #[instrument(skip(self, scope, cancel), fields(kind = %C::KIND, scope = %scope))]
    async fn fetch_fallback(
        &self,
        scope: &C::Scope,
        key: &str,
        cancel: &CancellationToken,
    ) -> CacheResult<Arc<C::Entry>> {
        tracing::debug!("cache miss, running point query");
        let evictions_before = self.entries.read().await.eviction_count(scope);

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(self.cancelled(scope)),
            fetched = self.collection.fetch_one(scope, key) => {
                fetched.map_err(|source| self.remote_error(scope, source))?
            }
        };
        Counters::bump(&self.counters.fallback_fetches, 1);

        let Some(entry) = fetched else {
            Counters::bump(&self.counters.not_found, 1);
            tracing::debug!("point query reports no such item");
            return Err(CacheError::NotFound {
                kind: C::KIND,
                scope: scope.to_string(),
                item: key.to_string(),
            });
        };

        let gate = self.gate(scope).await;
        let mut store = self.entries.write().await;
        if store.eviction_count(scope) != evictions_before {
            tracing::debug!("evicted during point query, not caching result");
            return Ok(Arc::new(entry));
        }
        Ok(Self::insert_locked(
            &mut store.buckets,
            &gate,
            scope,
            key.to_string(),
            entry,
        ))
    }

    /// Insert under `key`, replacing any previous entry.
    ///
    /// # Panics
    ///
    /// When the scope has never begun loading.
    fn insert_locked(
        entries: &mut Buckets<C>,
        gate: &ScopeGate,
        scope: &C::Scope,
        key: String,
        entry: C::Entry,
    ) -> Arc<C::Entry> {
        assert!(
            gate.state() != ScopeState::Unloaded,
            "insert into {scope} before its load began"
        );
        let entry = Arc::new(entry);
        entries
            .entry(scope.clone())
            .or_default()
            .insert(key, Arc::clone(&entry));
        entry
    }

    fn remote_error(&self, scope: &C::Scope, source: RemoteError) -> CacheError {
        CacheError::RemoteQuery {
            kind: C::KIND,
            scope: scope.to_string(),
            source,
        }
    }

    fn cancelled(&self, scope: &C::Scope) -> CacheError {
        CacheError::Cancelled {
            kind: C::KIND,
            scope: scope.to_string(),
        }
    }
}
