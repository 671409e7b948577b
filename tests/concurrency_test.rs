//! Concurrent access to the organization cache.
//!
//! Runs on the multi-threaded runtime with simulated remote latency so that
//! callers really do overlap with in-flight loads.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{cache_over, env, MockGitHub};
use octocache::domain::models::RepoScope;
use octocache::services::{Collection, ScopeState};
use octocache::{EntityCache, EntityKind, EvictionConfig, OrganizationCache, Page, RemoteError};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

fn slow_org(repos: usize, envs_per_repo: usize) -> Arc<MockGitHub> {
    let mock = MockGitHub::new("acme")
        .with_page_size(3)
        .with_latency(Duration::from_millis(20));
    for r in 0..repos {
        let repo = format!("repo-{r}");
        mock.add_repo(&repo);
        for e in 0..envs_per_repo {
            mock.add_env(&repo, env(&format!("env-{e}"), 0, &[]));
        }
    }
    Arc::new(mock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_gets_load_each_scope_once() {
    let mock = slow_org(5, 10);
    let cache = Arc::new(cache_over(&mock, &EvictionConfig::default()));

    let mut tasks = JoinSet::new();
    for r in 0..5 {
        for e in 0..10 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move {
                cache
                    .environment(&format!("repo-{r}"), &format!("env-{e}"))
                    .await
                    .map(|entry| entry.name.clone())
            });
        }
    }

    let mut served = 0;
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
        served += 1;
    }
    assert_eq!(served, 50);

    for r in 0..5 {
        assert_eq!(
            mock.bulk_loads_of(EntityKind::Environment, &format!("repo-{r}")),
            1,
            "repo-{r} should be listed exactly once"
        );
    }
    assert_eq!(mock.point_queries(EntityKind::Environment), 0);
    // 10 environments at 3 per page.
    assert_eq!(mock.list_pages(EntityKind::Environment), 5 * 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_load_is_retried_by_a_waiter() {
    let mock = slow_org(1, 6);
    mock.fail_list_page_once(EntityKind::Environment, 0);
    let cache = Arc::new(cache_over(&mock, &EvictionConfig::default()));

    let mut tasks = JoinSet::new();
    for e in 0..10 {
        let cache = Arc::clone(&cache);
        tasks.spawn(async move { cache.environment("repo-0", &format!("env-{}", e % 6)).await });
    }

    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_err() {
            failures += 1;
        }
    }

    assert_eq!(failures, 1);
    assert_eq!(mock.bulk_loads(EntityKind::Environment), 2);
    assert_eq!(
        cache
            .environments()
            .scope_state(&RepoScope::new("repo-0"))
            .await,
        ScopeState::Loaded
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_eviction_during_load_is_not_undone_by_later_pages() {
    let mock = slow_org(1, 9);
    let cache = Arc::new(cache_over(&mock, &EvictionConfig::default()));
    let scope = RepoScope::new("repo-0");

    let loader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.environment("repo-0", "env-0").await })
    };

    // Wait until the first page is in flight; env-8 arrives on the last page.
    while cache.environments().scope_state(&scope).await != ScopeState::Loading {
        tokio::task::yield_now().await;
    }
    assert!(cache.environments().peek(&scope, "env-8").await.is_none());

    assert!(cache.environment_deleted("repo-0", "env-8").await);
    assert_eq!(
        cache.environments().scope_state(&scope).await,
        ScopeState::Loaded
    );
    assert!(cache.environments().peek(&scope, "env-8").await.is_none());

    loader.await.unwrap().unwrap();
    assert!(cache.environments().peek(&scope, "env-8").await.is_none());
    assert_eq!(cache.environments().len(&scope).await, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_evictions_and_reads() {
    let mock = slow_org(2, 4);
    let cache: Arc<OrganizationCache> = Arc::new(cache_over(&mock, &EvictionConfig::default()));

    let mut tasks = JoinSet::new();
    for i in 0..40 {
        let cache = Arc::clone(&cache);
        let repo = format!("repo-{}", i % 2);
        let name = format!("env-{}", i % 4);
        tasks.spawn(async move {
            if i % 3 == 0 {
                cache.environment_deleted(&repo, &name).await;
                Ok(())
            } else {
                cache.environment(&repo, &name).await.map(|_| ())
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        // Every environment exists upstream, so evicted ones come back by point query.
        joined.unwrap().unwrap();
    }

    for repo in ["repo-0", "repo-1"] {
        assert_eq!(mock.bulk_loads_of(EntityKind::Environment, repo), 1);
    }
    let stats = cache.stats().environments;
    assert_eq!(stats.not_found, 0);
    assert_eq!(stats.bulk_loads, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_caller_stops_waiting_when_cancelled() {
    let mock = MockGitHub::new("acme")
        .with_page_size(3)
        .with_latency(Duration::from_millis(200));
    mock.add_repo("api");
    for e in 0..6 {
        mock.add_env("api", env(&format!("env-{e}"), 0, &[]));
    }
    let mock = Arc::new(mock);
    let cache = Arc::new(cache_over(&mock, &EvictionConfig::default()));
    let scope = RepoScope::new("api");

    let loader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.environment("api", "env-0").await })
    };
    while cache.environments().scope_state(&scope).await != ScopeState::Loading {
        tokio::task::yield_now().await;
    }

    let token = CancellationToken::new();
    let waiter = {
        let cache = Arc::clone(&cache);
        let token = token.clone();
        tokio::spawn(async move {
            cache
                .environments()
                .get_with_cancel(&RepoScope::new("api"), "env-1", &token)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    let cancelled_at = Instant::now();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
    // Well before the two 200ms pages of the running load finish.
    assert!(cancelled_at.elapsed() < Duration::from_millis(150));

    loader.await.unwrap().unwrap();
    assert_eq!(
        cache.environments().scope_state(&scope).await,
        ScopeState::Loaded
    );
    assert_eq!(mock.bulk_loads_of(EntityKind::Environment, "api"), 1);
}

#[derive(Default)]
struct PointQuerySignals {
    present: AtomicBool,
    started: Notify,
    release: Notify,
    point_calls: AtomicUsize,
}

/// Empty listings; point queries capture whether the item exists when they
/// start, then hold until released.
struct HeldPointQueries(Arc<PointQuerySignals>);

#[async_trait]
impl Collection for HeldPointQueries {
    type Scope = String;
    type Entry = String;

    const KIND: EntityKind = EntityKind::Environment;

    fn key_of(entry: &String) -> &str {
        entry
    }

    async fn list_page(
        &self,
        _scope: &String,
        _cursor: Option<String>,
    ) -> Result<Page<String>, RemoteError> {
        Ok(Page::last(vec![]))
    }

    async fn fetch_one(&self, _scope: &String, key: &str) -> Result<Option<String>, RemoteError> {
        let found = self.0.present.load(Ordering::SeqCst);
        self.0.point_calls.fetch_add(1, Ordering::SeqCst);
        self.0.started.notify_one();
        self.0.release.notified().await;
        Ok(found.then(|| key.to_string()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_eviction_during_point_query_is_not_undone() {
    let signals = Arc::new(PointQuerySignals::default());
    signals.present.store(true, Ordering::SeqCst);
    let cache = Arc::new(EntityCache::new(
        HeldPointQueries(Arc::clone(&signals)),
        true,
    ));
    let scope = "api".to_string();
    cache.bulk_load(&scope).await.unwrap();

    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get(&"api".to_string(), "staging").await })
    };
    signals.started.notified().await;

    // Deleted upstream while the point query is still in flight.
    signals.present.store(false, Ordering::SeqCst);
    assert!(!cache.evict(&scope, "staging").await);
    signals.release.notify_one();

    // The reader still gets what it fetched, but it is not cached.
    let stale = reader.await.unwrap().unwrap();
    assert_eq!(stale.as_str(), "staging");
    assert!(cache.peek(&scope, "staging").await.is_none());

    signals.release.notify_one();
    let err = cache.get(&scope, "staging").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(signals.point_calls.load(Ordering::SeqCst), 2);
}
