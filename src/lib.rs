//! octocache - read-through metadata cache for a GitHub organization
//!
//! Resource handlers that read repositories, deployment environments,
//! environment secrets and team-repository grants one at a time would make
//! one API call per resource. The cache lists each parent scope once,
//! answers later reads from memory, and falls back to a single-item query
//! for anything the listing did not contain.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): cached entry models, scope keys, errors and the `GitHubApi` port
//! - **Service Layer** (`services`): pagination, scope gates, the generic entity cache and the organization cache
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging and the REST client
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use octocache::{EvictionConfig, GitHubClient, GitHubClientConfig, OrganizationCache};
//!
//! let client = GitHubClient::new(config)?;
//! let cache = OrganizationCache::new(Arc::new(client), &EvictionConfig::default());
//! let prod = cache.environment("api", "prod").await?;
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CacheConfig, Config, EnvironmentEntry, EnvironmentSecretEntry, EvictionConfig, GitHubConfig,
    LoggingConfig, RateLimitConfig, RepositoryEntry, TeamRepositoryEntry,
};
pub use domain::ports::{GitHubApi, Page};
pub use domain::{CacheError, CacheResult, EntityKind, RemoteError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::github::{GitHubClient, GitHubClientConfig};
pub use services::{EntityCache, GoneReason, OrganizationCache, Resolution};
