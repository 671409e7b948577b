//! Common test utilities for integration tests
//!
//! Provides an in-memory `GitHubApi` with a call log, failure injection and
//! optional latency, plus entry builders shared across test files.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use octocache::domain::models::{
    EntryOrigin, EnvironmentEntry, EnvironmentSecretEntry, RepositoryEntry, Reviewer,
    ReviewerKind, SecretVisibility, TeamRepositoryEntry,
};
use octocache::{EntityKind, EvictionConfig, GitHubApi, OrganizationCache, Page, RemoteError};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// One remote call seen by [`MockGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        kind: EntityKind,
        scope: String,
        cursor: Option<String>,
    },
    Get {
        kind: EntityKind,
        scope: String,
        key: String,
    },
}

#[derive(Default)]
struct Upstream {
    repos: BTreeMap<String, RepositoryEntry>,
    envs: BTreeMap<String, BTreeMap<String, EnvironmentEntry>>,
    secrets: BTreeMap<(String, String), BTreeMap<String, EnvironmentSecretEntry>>,
    team_repos: BTreeMap<i64, BTreeMap<String, TeamRepositoryEntry>>,
}

/// In-memory organization. Listing cursors are record offsets.
pub struct MockGitHub {
    owner: String,
    page_size: usize,
    latency: Duration,
    upstream: Mutex<Upstream>,
    calls: Mutex<Vec<Call>>,
    fail_list_at: Mutex<Option<(EntityKind, usize)>>,
    fail_points: AtomicBool,
}

impl MockGitHub {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            page_size: 100,
            latency: Duration::ZERO,
            upstream: Mutex::new(Upstream::default()),
            calls: Mutex::new(Vec::new()),
            fail_list_at: Mutex::new(None),
            fail_points: AtomicBool::new(false),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Delay every remote call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    // Upstream mutation

    pub fn add_repo(&self, name: &str) {
        self.upstream.lock().unwrap().repos.insert(
            name.to_string(),
            RepositoryEntry::named(name, EntryOrigin::BulkLoad),
        );
    }

    pub fn archive_repo(&self, name: &str) {
        if let Some(repo) = self.upstream.lock().unwrap().repos.get_mut(name) {
            repo.is_archived = true;
        }
    }

    pub fn delete_repo(&self, name: &str) {
        self.upstream.lock().unwrap().repos.remove(name);
    }

    pub fn add_env(&self, repo: &str, env: EnvironmentEntry) {
        self.upstream
            .lock()
            .unwrap()
            .envs
            .entry(repo.to_string())
            .or_default()
            .insert(env.name.clone(), env);
    }

    pub fn delete_env(&self, repo: &str, name: &str) {
        if let Some(envs) = self.upstream.lock().unwrap().envs.get_mut(repo) {
            envs.remove(name);
        }
    }

    pub fn add_secret(&self, repo: &str, env: &str, name: &str) {
        self.upstream
            .lock()
            .unwrap()
            .secrets
            .entry((repo.to_string(), env.to_string()))
            .or_default()
            .insert(name.to_string(), secret(name));
    }

    pub fn delete_secret(&self, repo: &str, env: &str, name: &str) {
        if let Some(secrets) = self
            .upstream
            .lock()
            .unwrap()
            .secrets
            .get_mut(&(repo.to_string(), env.to_string()))
        {
            secrets.remove(name);
        }
    }

    pub fn grant_team(&self, team_id: i64, repo: &str, permission: &str) {
        self.upstream
            .lock()
            .unwrap()
            .team_repos
            .entry(team_id)
            .or_default()
            .insert(
                repo.to_string(),
                TeamRepositoryEntry {
                    repository: repo.to_string(),
                    permission: permission.to_string(),
                    origin: EntryOrigin::BulkLoad,
                },
            );
    }

    pub fn revoke_team(&self, team_id: i64, repo: &str) {
        if let Some(repos) = self.upstream.lock().unwrap().team_repos.get_mut(&team_id) {
            repos.remove(repo);
        }
    }

    // Failure injection

    /// Fail the next listing request for page `index` of `kind`, once.
    pub fn fail_list_page_once(&self, kind: EntityKind, index: usize) {
        *self.fail_list_at.lock().unwrap() = Some((kind, index));
    }

    pub fn fail_point_queries(&self, fail: bool) {
        self.fail_points.store(fail, Ordering::SeqCst);
    }

    // Call log

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of listings started from the first page.
    pub fn bulk_loads(&self, kind: EntityKind) -> usize {
        self.count(|call| {
            matches!(call, Call::List { kind: k, cursor: None, .. } if *k == kind)
        })
    }

    pub fn bulk_loads_of(&self, kind: EntityKind, scope: &str) -> usize {
        self.count(|call| {
            matches!(call, Call::List { kind: k, scope: s, cursor: None } if *k == kind && s == scope)
        })
    }

    pub fn list_pages(&self, kind: EntityKind) -> usize {
        self.count(|call| matches!(call, Call::List { kind: k, .. } if *k == kind))
    }

    pub fn point_queries(&self, kind: EntityKind) -> usize {
        self.count(|call| matches!(call, Call::Get { kind: k, .. } if *k == kind))
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    async fn list<T: Clone>(
        &self,
        kind: EntityKind,
        scope: String,
        cursor: Option<String>,
        records: impl FnOnce(&Upstream) -> Vec<T>,
    ) -> Result<Page<T>, RemoteError> {
        self.calls.lock().unwrap().push(Call::List {
            kind,
            scope,
            cursor: cursor.clone(),
        });
        tokio::time::sleep(self.latency).await;

        let offset: usize = cursor.map_or(0, |c| c.parse().unwrap());
        let index = offset / self.page_size;
        {
            let mut fail = self.fail_list_at.lock().unwrap();
            if *fail == Some((kind, index)) {
                *fail = None;
                return Err(RemoteError::Status {
                    status: 502,
                    body: "upstream unavailable".to_string(),
                });
            }
        }

        let all = records(&self.upstream.lock().unwrap());
        let end = (offset + self.page_size).min(all.len());
        let slice = all.get(offset..end).unwrap_or_default().to_vec();
        Ok(if end < all.len() {
            Page::with_next(slice, end.to_string())
        } else {
            Page::last(slice)
        })
    }

    async fn point<T>(
        &self,
        kind: EntityKind,
        scope: String,
        key: &str,
        lookup: impl FnOnce(&Upstream) -> Option<T>,
    ) -> Result<Option<T>, RemoteError> {
        self.calls.lock().unwrap().push(Call::Get {
            kind,
            scope,
            key: key.to_string(),
        });
        tokio::time::sleep(self.latency).await;

        if self.fail_points.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        Ok(lookup(&self.upstream.lock().unwrap()))
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    fn owner(&self) -> &str {
        &self.owner
    }

    async fn list_repositories(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RepositoryEntry>, RemoteError> {
        self.list(EntityKind::Repository, self.owner.clone(), cursor, |up| {
            up.repos.values().cloned().collect()
        })
        .await
    }

    async fn get_repository(&self, name: &str) -> Result<Option<RepositoryEntry>, RemoteError> {
        self.point(EntityKind::Repository, self.owner.clone(), name, |up| {
            up.repos.get(name).cloned().map(point_query(|r: &mut RepositoryEntry| &mut r.origin))
        })
        .await
    }

    async fn list_environments(
        &self,
        repository: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentEntry>, RemoteError> {
        self.list(EntityKind::Environment, repository.to_string(), cursor, |up| {
            up.envs
                .get(repository)
                .map(|envs| envs.values().cloned().collect())
                .unwrap_or_default()
        })
        .await
    }

    async fn get_environment(
        &self,
        repository: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentEntry>, RemoteError> {
        self.point(EntityKind::Environment, repository.to_string(), environment, |up| {
            up.envs
                .get(repository)
                .and_then(|envs| envs.get(environment))
                .cloned()
                .map(|env| EnvironmentEntry {
                    wait_timer: 0,
                    prevent_self_review: false,
                    protection_rules: Vec::new(),
                    origin: EntryOrigin::PointQuery,
                    ..env
                })
        })
        .await
    }

    async fn list_environment_secrets(
        &self,
        repository: &str,
        environment: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentSecretEntry>, RemoteError> {
        let key = (repository.to_string(), environment.to_string());
        self.list(
            EntityKind::EnvironmentSecret,
            format!("{repository}/{environment}"),
            cursor,
            |up| {
                up.secrets
                    .get(&key)
                    .map(|secrets| secrets.values().cloned().collect())
                    .unwrap_or_default()
            },
        )
        .await
    }

    async fn get_environment_secret(
        &self,
        repository: &str,
        environment: &str,
        secret: &str,
    ) -> Result<Option<EnvironmentSecretEntry>, RemoteError> {
        let key = (repository.to_string(), environment.to_string());
        self.point(
            EntityKind::EnvironmentSecret,
            format!("{repository}/{environment}"),
            secret,
            |up| {
                up.secrets
                    .get(&key)
                    .and_then(|secrets| secrets.get(secret))
                    .cloned()
                    .map(point_query(|s: &mut EnvironmentSecretEntry| &mut s.origin))
            },
        )
        .await
    }

    async fn list_team_repositories(
        &self,
        team_id: i64,
        cursor: Option<String>,
    ) -> Result<Page<TeamRepositoryEntry>, RemoteError> {
        self.list(EntityKind::TeamRepository, team_id.to_string(), cursor, |up| {
            up.team_repos
                .get(&team_id)
                .map(|repos| repos.values().cloned().collect())
                .unwrap_or_default()
        })
        .await
    }

    async fn get_team_repository(
        &self,
        team_id: i64,
        repository: &str,
    ) -> Result<Option<TeamRepositoryEntry>, RemoteError> {
        self.point(EntityKind::TeamRepository, team_id.to_string(), repository, |up| {
            up.team_repos
                .get(&team_id)
                .and_then(|repos| repos.get(repository))
                .cloned()
                .map(point_query(|t: &mut TeamRepositoryEntry| &mut t.origin))
        })
        .await
    }
}

/// Organization cache over `mock` with the given eviction switches.
pub fn cache_over(mock: &Arc<MockGitHub>, eviction: &EvictionConfig) -> OrganizationCache {
    OrganizationCache::new(Arc::clone(mock) as Arc<dyn GitHubApi>, eviction)
}

fn point_query<T>(origin: impl Fn(&mut T) -> &mut EntryOrigin) -> impl Fn(T) -> T {
    move |mut entry| {
        *origin(&mut entry) = EntryOrigin::PointQuery;
        entry
    }
}

/// An environment as a bulk listing reports it.
pub fn env(name: &str, wait_timer: i64, team_reviewers: &[i64]) -> EnvironmentEntry {
    EnvironmentEntry {
        name: name.to_string(),
        can_admins_bypass: true,
        wait_timer,
        prevent_self_review: false,
        reviewers: team_reviewers
            .iter()
            .map(|id| Reviewer {
                kind: ReviewerKind::Team,
                id: *id,
            })
            .collect(),
        deployment_branch_policy: None,
        protection_rules: Vec::new(),
        origin: EntryOrigin::BulkLoad,
    }
}

pub fn secret(name: &str) -> EnvironmentSecretEntry {
    EnvironmentSecretEntry {
        name: name.to_string(),
        created_at: None,
        updated_at: None,
        visibility: SecretVisibility::Private,
        selected_teams: Vec::new(),
        selected_repositories: Vec::new(),
        origin: EntryOrigin::BulkLoad,
    }
}
