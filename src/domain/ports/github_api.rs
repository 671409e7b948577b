use async_trait::async_trait;

use crate::domain::errors::RemoteError;
use crate::domain::models::{
    EnvironmentEntry, EnvironmentSecretEntry, RepositoryEntry, TeamRepositoryEntry,
};

/// One page of a collection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records on this page, possibly none.
    pub records: Vec<T>,
    /// Whether the server reports further pages.
    pub has_next_page: bool,
    /// Opaque continuation cursor for the next page.
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// The final page of a collection.
    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            has_next_page: false,
            end_cursor: None,
        }
    }

    /// A page followed by more, continuing at `cursor`.
    pub fn with_next(records: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            records,
            has_next_page: true,
            end_cursor: Some(cursor.into()),
        }
    }
}

/// Remote API port for one GitHub organization.
///
/// List calls take an opaque cursor (`None` = start of the collection). Point
/// calls return `Ok(None)` when the resource does not exist. Implementations
/// never retry; every failure is reported to the caller as-is.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Login of the organization this client is bound to.
    fn owner(&self) -> &str;

    async fn list_repositories(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RepositoryEntry>, RemoteError>;

    async fn get_repository(&self, name: &str) -> Result<Option<RepositoryEntry>, RemoteError>;

    async fn list_environments(
        &self,
        repository: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentEntry>, RemoteError>;

    async fn get_environment(
        &self,
        repository: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentEntry>, RemoteError>;

    async fn list_environment_secrets(
        &self,
        repository: &str,
        environment: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentSecretEntry>, RemoteError>;

    async fn get_environment_secret(
        &self,
        repository: &str,
        environment: &str,
        secret: &str,
    ) -> Result<Option<EnvironmentSecretEntry>, RemoteError>;

    async fn list_team_repositories(
        &self,
        team_id: i64,
        cursor: Option<String>,
    ) -> Result<Page<TeamRepositoryEntry>, RemoteError>;

    async fn get_team_repository(
        &self,
        team_id: i64,
        repository: &str,
    ) -> Result<Option<TeamRepositoryEntry>, RemoteError>;
}
