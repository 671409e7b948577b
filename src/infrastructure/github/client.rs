//! GitHub REST client bound to one organization.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::models::{
    EnvironmentDto, EnvironmentListDto, OrganizationDto, RepositoryDto, SecretDto,
    SecretListDto, TeamRepositoryDto,
};
use crate::domain::errors::RemoteError;
use crate::domain::models::{
    Config, EntryOrigin, EnvironmentEntry, EnvironmentSecretEntry, RepositoryEntry,
    TeamRepositoryEntry,
};
use crate::domain::ports::{GitHubApi, Page};
use crate::infrastructure::logging::SecretScrubber;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "octocache";
const REPOSITORY_MEDIA_TYPE: &str = "application/vnd.github.v3.repository+json";

/// Configuration for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Organization login
    pub owner: String,
    /// API token; requests are anonymous without one
    pub token: Option<String>,
    /// REST API base URL
    pub api_url: String,
    pub timeout_secs: u64,
    /// Records requested per listing page
    pub page_size: u32,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl GitHubClientConfig {
    /// Build from the loaded configuration, taking the token from
    /// `GITHUB_TOKEN` when the config has none.
    pub fn from_config(config: &Config) -> Self {
        let token = config
            .github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty());
        Self {
            owner: config.github.owner.clone(),
            token,
            api_url: config.github.api_url.clone(),
            timeout_secs: config.github.timeout_secs,
            page_size: config.github.page_size,
            requests_per_second: config.rate_limit.requests_per_second,
            burst_size: config.rate_limit.burst_size,
        }
    }
}

/// [`GitHubApi`] over the REST API.
///
/// List calls follow the `Link` header; the `rel="next"` URL is the cursor.
/// Every request waits on a token bucket first. Nothing is retried.
pub struct GitHubClient {
    http_client: ReqwestClient,
    base_url: Url,
    owner: String,
    page_size: u32,
    rate_limiter: DefaultDirectRateLimiter,
    org_id: OnceCell<i64>,
    scrubber: SecretScrubber,
}

impl GitHubClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns an error for an unparseable base URL, a token that is not a
    /// valid header value, or an HTTP client that fails to build
    pub fn new(config: GitHubClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", config.api_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("GitHub token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        let per_second = NonZeroU32::new(config.requests_per_second)
            .context("requests_per_second must be positive")?;
        let burst =
            NonZeroU32::new(config.burst_size).context("burst_size must be positive")?;

        Ok(Self {
            http_client,
            base_url,
            owner: config.owner,
            page_size: config.page_size,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)),
            org_id: OnceCell::new(),
            scrubber: SecretScrubber::new().context("Failed to compile secret patterns")?,
        })
    }

    /// Base URL extended with path-escaped `segments`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Transport(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// First page URL of a listing.
    fn listing(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("per_page", &self.page_size.to_string());
        }
        Ok(url)
    }

    async fn send(&self, url: Url, accept: Option<&'static str>) -> Result<Response, RemoteError> {
        self.rate_limiter.until_ready().await;
        debug!(%url, "GET");

        let mut request = self.http_client.get(url);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }
        Ok(request.send().await?)
    }

    async fn status_error(&self, response: Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        RemoteError::Status {
            status,
            body: self.scrubber.scrub_message(&body),
        }
    }

    /// Fetch one listing page: the first page when `cursor` is `None`, the
    /// cursor URL otherwise.
    async fn fetch_page<D: DeserializeOwned>(
        &self,
        first: impl FnOnce() -> Result<Url, RemoteError>,
        cursor: Option<String>,
    ) -> Result<(D, Option<String>), RemoteError> {
        let url = match cursor {
            Some(cursor) => self.cursor_url(&cursor)?,
            None => first()?,
        };

        let response = self.send(url, None).await?;
        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let next = response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);
        let body = response.json::<D>().await?;
        Ok((body, next))
    }

    /// Parse a `Link` cursor. Cursors on another origin are rejected.
    fn cursor_url(&self, cursor: &str) -> Result<Url, RemoteError> {
        let url = Url::parse(cursor)
            .map_err(|e| RemoteError::Malformed(format!("bad cursor {cursor}: {e}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(RemoteError::Malformed(format!(
                "cursor {cursor} leaves {}",
                self.base_url.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }

    /// GET a single resource; 404 is `Ok(None)`.
    async fn fetch_optional<D: DeserializeOwned>(
        &self,
        url: Url,
        accept: Option<&'static str>,
    ) -> Result<Option<D>, RemoteError> {
        let response = self.send(url, accept).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<D>().await?)),
            _ => Err(self.status_error(response).await),
        }
    }

    /// Numeric id of the organization, resolved on first use.
    async fn org_id(&self) -> Result<i64, RemoteError> {
        self.org_id
            .get_or_try_init(|| async {
                let url = self.endpoint(&["orgs", &self.owner])?;
                let org: OrganizationDto = self
                    .fetch_optional(url, None)
                    .await?
                    .ok_or_else(|| RemoteError::Status {
                        status: 404,
                        body: format!("organization {} not found", self.owner),
                    })?;
                debug!(owner = %self.owner, id = org.id, "resolved organization id");
                Ok::<_, RemoteError>(org.id)
            })
            .await
            .copied()
    }
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        is_next
            .then(|| target.strip_prefix('<')?.strip_suffix('>'))
            .flatten()
            .map(ToString::to_string)
    })
}

fn page<D, T>(
    records: impl IntoIterator<Item = D>,
    next: Option<String>,
    map: impl Fn(D) -> T,
) -> Page<T> {
    let records = records.into_iter().map(map).collect();
    match next {
        Some(cursor) => Page::with_next(records, cursor),
        None => Page::last(records),
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    fn owner(&self) -> &str {
        &self.owner
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn list_repositories(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RepositoryEntry>, RemoteError> {
        let (repos, next) = self
            .fetch_page::<Vec<RepositoryDto>>(
                || self.listing(&["orgs", &self.owner, "repos"], &[("type", "all")]),
                cursor,
            )
            .await?;
        Ok(page(repos, next, |dto| dto.into_entry(EntryOrigin::BulkLoad)))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn get_repository(&self, name: &str) -> Result<Option<RepositoryEntry>, RemoteError> {
        let url = self.endpoint(&["repos", &self.owner, name])?;
        Ok(self
            .fetch_optional::<RepositoryDto>(url, None)
            .await?
            .map(|dto| dto.into_entry(EntryOrigin::PointQuery)))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn list_environments(
        &self,
        repository: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentEntry>, RemoteError> {
        let (list, next) = self
            .fetch_page::<EnvironmentListDto>(
                || self.listing(&["repos", &self.owner, repository, "environments"], &[]),
                cursor,
            )
            .await?;
        Ok(page(list.environments, next, |dto| {
            dto.into_entry(EntryOrigin::BulkLoad)
        }))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn get_environment(
        &self,
        repository: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentEntry>, RemoteError> {
        let url = self.endpoint(&["repos", &self.owner, repository, "environments", environment])?;
        Ok(self
            .fetch_optional::<EnvironmentDto>(url, None)
            .await?
            .map(|dto| dto.into_entry(EntryOrigin::PointQuery)))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn list_environment_secrets(
        &self,
        repository: &str,
        environment: &str,
        cursor: Option<String>,
    ) -> Result<Page<EnvironmentSecretEntry>, RemoteError> {
        let (list, next) = self
            .fetch_page::<SecretListDto>(
                || {
                    self.listing(
                        &["repos", &self.owner, repository, "environments", environment, "secrets"],
                        &[],
                    )
                },
                cursor,
            )
            .await?;
        Ok(page(list.secrets, next, |dto| {
            dto.into_entry(EntryOrigin::BulkLoad)
        }))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn get_environment_secret(
        &self,
        repository: &str,
        environment: &str,
        secret: &str,
    ) -> Result<Option<EnvironmentSecretEntry>, RemoteError> {
        let url = self.endpoint(&[
            "repos",
            &self.owner,
            repository,
            "environments",
            environment,
            "secrets",
            secret,
        ])?;
        Ok(self
            .fetch_optional::<SecretDto>(url, None)
            .await?
            .map(|dto| dto.into_entry(EntryOrigin::PointQuery)))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn list_team_repositories(
        &self,
        team_id: i64,
        cursor: Option<String>,
    ) -> Result<Page<TeamRepositoryEntry>, RemoteError> {
        // Only the first page needs the org id; later pages carry it in the cursor.
        let org_id = match cursor {
            Some(_) => String::new(),
            None => self.org_id().await?.to_string(),
        };
        let team_id = team_id.to_string();
        let (repos, next) = self
            .fetch_page::<Vec<TeamRepositoryDto>>(
                || self.listing(&["organizations", &org_id, "team", &team_id, "repos"], &[]),
                cursor,
            )
            .await?;
        Ok(page(repos, next, |dto| dto.into_entry(EntryOrigin::BulkLoad)))
    }

    #[instrument(skip(self), fields(owner = %self.owner))]
    async fn get_team_repository(
        &self,
        team_id: i64,
        repository: &str,
    ) -> Result<Option<TeamRepositoryEntry>, RemoteError> {
        let org_id = self.org_id().await?.to_string();
        let team_id = team_id.to_string();
        let url = self.endpoint(&[
            "organizations",
            &org_id,
            "team",
            &team_id,
            "repos",
            &self.owner,
            repository,
        ])?;
        Ok(self
            .fetch_optional::<TeamRepositoryDto>(url, Some(REPOSITORY_MEDIA_TYPE))
            .await?
            .map(|dto| dto.into_entry(EntryOrigin::PointQuery)))
    }
}
