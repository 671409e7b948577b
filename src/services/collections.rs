//! Bindings between the generic entity cache and the four GitHub collections.
//!
//! A [`Collection`] names the scope and entry types of one cache and knows
//! which remote calls enumerate a scope and fetch a single item.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{EntityKind, RemoteError};
use crate::domain::models::{
    EnvironmentEntry, EnvironmentScope, EnvironmentSecretEntry, OrgScope, RepoScope,
    RepositoryEntry, TeamRepositoryEntry, TeamScope,
};
use crate::domain::ports::{GitHubApi, Page};

/// A remote collection that can be bulk-listed per scope and point-queried per item.
#[async_trait]
pub trait Collection: Send + Sync + 'static {
    type Scope: Clone + Eq + Hash + Display + Send + Sync + 'static;
    type Entry: Send + Sync + 'static;

    const KIND: EntityKind;

    /// Key of an entry within its scope.
    fn key_of(entry: &Self::Entry) -> &str;

    /// Fetch one page of the scope's collection.
    async fn list_page(
        &self,
        scope: &Self::Scope,
        cursor: Option<String>,
    ) -> Result<Page<Self::Entry>, RemoteError>;

    /// Point query for one item. `Ok(None)` when it does not exist.
    async fn fetch_one(
        &self,
        scope: &Self::Scope,
        key: &str,
    ) -> Result<Option<Self::Entry>, RemoteError>;
}

/// Repositories of an organization.
pub struct Repositories {
    api: Arc<dyn GitHubApi>,
}

impl Repositories {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Collection for Repositories {
    type Scope = OrgScope;
    type Entry = RepositoryEntry;

    const KIND: EntityKind = EntityKind::Repository;

    fn key_of(entry: &RepositoryEntry) -> &str {
        &entry.name
    }

    async fn list_page(
        &self,
        _scope: &OrgScope,
        cursor: Option<String>,
    ) -> Result<Page<RepositoryEntry>, RemoteError> {
        self.api.list_repositories(cursor).await
    }

    async fn fetch_one(
        &self,
        _scope: &OrgScope,
        key: &str,
    ) -> Result<Option<RepositoryEntry>, RemoteError> {
        self.api.get_repository(key).await
    }
}

/// Deployment environments of a repository.
pub struct Environments {
    api: Arc<dyn GitHubApi>,
}

impl Environments {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Collection for Environments {
    type Scope = RepoScope;
    type Entry = EnvironmentEntry;

    const KIND: EntityKind = EntityKind::Environment;

    fn key_of(entry: &EnvironmentEntry) -> &str {
        &entry.name
    }

    async fn list_page(
        &self,
        scope: &RepoScope,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentEntry>, RemoteError> {
        self.api.list_environments(&scope.repository, cursor).await
    }

    async fn fetch_one(
        &self,
        scope: &RepoScope,
        key: &str,
    ) -> Result<Option<EnvironmentEntry>, RemoteError> {
        self.api.get_environment(&scope.repository, key).await
    }
}

/// Secrets of one repository environment.
pub struct EnvironmentSecrets {
    api: Arc<dyn GitHubApi>,
}

impl EnvironmentSecrets {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Collection for EnvironmentSecrets {
    type Scope = EnvironmentScope;
    type Entry = EnvironmentSecretEntry;

    const KIND: EntityKind = EntityKind::EnvironmentSecret;

    fn key_of(entry: &EnvironmentSecretEntry) -> &str {
        &entry.name
    }

    async fn list_page(
        &self,
        scope: &EnvironmentScope,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentSecretEntry>, RemoteError> {
        self.api
            .list_environment_secrets(&scope.repository, &scope.environment, cursor)
            .await
    }

    async fn fetch_one(
        &self,
        scope: &EnvironmentScope,
        key: &str,
    ) -> Result<Option<EnvironmentSecretEntry>, RemoteError> {
        self.api
            .get_environment_secret(&scope.repository, &scope.environment, key)
            .await
    }
}

/// Repositories a team has been granted access to.
pub struct TeamRepositories {
    api: Arc<dyn GitHubApi>,
}

impl TeamRepositories {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Collection for TeamRepositories {
    type Scope = TeamScope;
    type Entry = TeamRepositoryEntry;

    const KIND: EntityKind = EntityKind::TeamRepository;

    fn key_of(entry: &TeamRepositoryEntry) -> &str {
        &entry.repository
    }

    async fn list_page(
        &self,
        scope: &TeamScope,
        cursor: Option<String>,
    ) -> Result<Page<TeamRepositoryEntry>, RemoteError> {
        self.api.list_team_repositories(scope.id(), cursor).await
    }

    async fn fetch_one(
        &self,
        scope: &TeamScope,
        key: &str,
    ) -> Result<Option<TeamRepositoryEntry>, RemoteError> {
        self.api.get_team_repository(scope.id(), key).await
    }
}
