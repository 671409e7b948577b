//! Eviction hooks called by delete handlers after the upstream delete succeeded.
//!
//! Each hook evicts the entry that the delete made stale. Whether a given
//! entity family honours eviction is decided by `cache.eviction` in the
//! configuration; a disabled family ignores the hook and keeps serving the
//! entry until the process restarts.

use crate::domain::models::{EnvironmentScope, RepoScope, TeamScope};
use crate::services::organization_cache::OrganizationCache;

impl OrganizationCache {
    /// An environment was deleted from `repository`.
    pub async fn environment_deleted(&self, repository: &str, environment: &str) -> bool {
        let evicted = self
            .environments
            .evict(&RepoScope::new(repository), environment)
            .await;
        tracing::info!(repository, environment, evicted, "environment deleted");
        evicted
    }

    /// A team lost its access to `repository`.
    pub async fn team_repository_removed(&self, team_id: i64, repository: &str) -> bool {
        let evicted = self
            .team_repositories
            .evict(&TeamScope(team_id), repository)
            .await;
        tracing::info!(team_id, repository, evicted, "team repository binding removed");
        evicted
    }

    pub async fn repository_deleted(&self, repository: &str) -> bool {
        let evicted = self.repositories.evict(self.org_scope(), repository).await;
        tracing::info!(repository, evicted, "repository deleted");
        evicted
    }

    pub async fn environment_secret_deleted(
        &self,
        repository: &str,
        environment: &str,
        secret: &str,
    ) -> bool {
        let evicted = self
            .environment_secrets
            .evict(&EnvironmentScope::new(repository, environment), secret)
            .await;
        tracing::info!(repository, environment, secret, evicted, "environment secret deleted");
        evicted
    }
}
