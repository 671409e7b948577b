//! The per-organization cache context.
//!
//! Owns one entity cache per collection, all sharing the organization's remote
//! client. Constructed once per provider context and passed to handlers;
//! there is no global instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::errors::CacheResult;
use crate::domain::models::{
    EnvironmentEntry, EnvironmentScope, EnvironmentSecretEntry, EvictionConfig, OrgScope,
    RepoScope, RepositoryEntry, TeamRepositoryEntry, TeamScope,
};
use crate::domain::ports::GitHubApi;
use crate::services::collections::{
    EnvironmentSecrets, Environments, Repositories, TeamRepositories,
};
use crate::services::entity_cache::{CacheStats, EntityCache};

/// Outcome of reading a resource whose parent repository may be gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    Gone(GoneReason),
}

impl<T> Resolution<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Gone(_) => None,
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }
}

/// Why a resource should be dropped from state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoneReason {
    RepositoryMissing,
    RepositoryArchived,
    EntityMissing,
}

impl GoneReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepositoryMissing => "repository does not exist",
            Self::RepositoryArchived => "repository is archived",
            Self::EntityMissing => "resource does not exist",
        }
    }
}

/// Counters of all four caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationStats {
    pub repositories: CacheStats,
    pub environments: CacheStats,
    pub environment_secrets: CacheStats,
    pub team_repositories: CacheStats,
}

/// Read-through metadata cache for one GitHub organization.
pub struct OrganizationCache {
    org: OrgScope,
    pub(crate) repositories: EntityCache<Repositories>,
    pub(crate) environments: EntityCache<Environments>,
    pub(crate) environment_secrets: EntityCache<EnvironmentSecrets>,
    pub(crate) team_repositories: EntityCache<TeamRepositories>,
}

impl OrganizationCache {
    pub fn new(api: Arc<dyn GitHubApi>, eviction: &EvictionConfig) -> Self {
        tracing::debug!(
            owner = api.owner(),
            repositories = eviction.repositories,
            environments = eviction.environments,
            environment_secrets = eviction.environment_secrets,
            team_repositories = eviction.team_repositories,
            "creating organization cache"
        );

        Self {
            org: OrgScope::new(api.owner()),
            repositories: EntityCache::new(
                Repositories::new(Arc::clone(&api)),
                eviction.repositories,
            ),
            environments: EntityCache::new(
                Environments::new(Arc::clone(&api)),
                eviction.environments,
            ),
            environment_secrets: EntityCache::new(
                EnvironmentSecrets::new(Arc::clone(&api)),
                eviction.environment_secrets,
            ),
            team_repositories: EntityCache::new(
                TeamRepositories::new(api),
                eviction.team_repositories,
            ),
        }
    }

    pub fn owner(&self) -> &str {
        self.org.login()
    }

    pub fn org_scope(&self) -> &OrgScope {
        &self.org
    }

    pub async fn repository(&self, name: &str) -> CacheResult<Arc<RepositoryEntry>> {
        self.repositories.get(&self.org, name).await
    }

    pub async fn environment(
        &self,
        repository: &str,
        environment: &str,
    ) -> CacheResult<Arc<EnvironmentEntry>> {
        self.environments
            .get(&RepoScope::new(repository), environment)
            .await
    }

    pub async fn environment_secret(
        &self,
        repository: &str,
        environment: &str,
        secret: &str,
    ) -> CacheResult<Arc<EnvironmentSecretEntry>> {
        self.environment_secrets
            .get(&EnvironmentScope::new(repository, environment), secret)
            .await
    }

    pub async fn team_repository(
        &self,
        team_id: i64,
        repository: &str,
    ) -> CacheResult<Arc<TeamRepositoryEntry>> {
        self.team_repositories
            .get(&TeamScope(team_id), repository)
            .await
    }

    /// Bulk-load the organization's repositories.
    pub async fn warm(&self) -> CacheResult<()> {
        self.repositories.bulk_load(&self.org).await
    }

    /// Read an environment, first checking that its repository still exists
    /// and is not archived.
    pub async fn resolve_environment(
        &self,
        repository: &str,
        environment: &str,
    ) -> CacheResult<Resolution<Arc<EnvironmentEntry>>> {
        if let Some(reason) = self.repository_gone(repository).await? {
            return Ok(Resolution::Gone(reason));
        }
        not_found_as_gone(self.environment(repository, environment).await)
    }

    /// Read a team's binding to a repository, first checking that the
    /// repository still exists and is not archived.
    pub async fn resolve_team_repository(
        &self,
        team_id: i64,
        repository: &str,
    ) -> CacheResult<Resolution<Arc<TeamRepositoryEntry>>> {
        if let Some(reason) = self.repository_gone(repository).await? {
            return Ok(Resolution::Gone(reason));
        }
        not_found_as_gone(self.team_repository(team_id, repository).await)
    }

    pub fn stats(&self) -> OrganizationStats {
        OrganizationStats {
            repositories: self.repositories.stats(),
            environments: self.environments.stats(),
            environment_secrets: self.environment_secrets.stats(),
            team_repositories: self.team_repositories.stats(),
        }
    }

    pub fn repositories(&self) -> &EntityCache<Repositories> {
        &self.repositories
    }

    pub fn environments(&self) -> &EntityCache<Environments> {
        &self.environments
    }

    pub fn environment_secrets(&self) -> &EntityCache<EnvironmentSecrets> {
        &self.environment_secrets
    }

    pub fn team_repositories(&self) -> &EntityCache<TeamRepositories> {
        &self.team_repositories
    }

    async fn repository_gone(&self, repository: &str) -> CacheResult<Option<GoneReason>> {
        match self.repository(repository).await {
            Ok(repo) if repo.is_archived => {
                tracing::info!(repository, "repository is archived, dropping dependent resource");
                Ok(Some(GoneReason::RepositoryArchived))
            }
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => {
                tracing::info!(repository, "repository not found, dropping dependent resource");
                Ok(Some(GoneReason::RepositoryMissing))
            }
            Err(e) => Err(e),
        }
    }
}

fn not_found_as_gone<T>(result: CacheResult<T>) -> CacheResult<Resolution<T>> {
    match result {
        Ok(value) => Ok(Resolution::Found(value)),
        Err(e) if e.is_not_found() => Ok(Resolution::Gone(GoneReason::EntityMissing)),
        Err(e) => Err(e),
    }
}
