use serde::{Deserialize, Serialize};

/// Main configuration structure for octocache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// GitHub organization and API endpoint
    #[serde(default)]
    pub github: GitHubConfig,

    /// Client-side request throttling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// Organization (owner login) whose resources are cached
    #[serde(default)]
    pub owner: String,

    /// API token (falls back to the `GITHUB_TOKEN` environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Records requested per page of a collection listing (1-100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    100
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            token: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Sustained requests per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_burst_size() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Which entity caches honour eviction requests
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// Per-entity eviction switches.
///
/// Environments and team-repository bindings are evicted by their delete
/// handlers. Repositories and environment secrets have never been evicted, so
/// they default to off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvictionConfig {
    #[serde(default)]
    pub repositories: bool,

    #[serde(default = "default_true")]
    pub environments: bool,

    #[serde(default)]
    pub environment_secrets: bool,

    #[serde(default = "default_true")]
    pub team_repositories: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            repositories: false,
            environments: true,
            environment_secrets: false,
            team_repositories: true,
        }
    }
}

impl EvictionConfig {
    /// Every cache honours eviction.
    pub const fn all() -> Self {
        Self {
            repositories: true,
            environments: true,
            environment_secrets: true,
            team_repositories: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
