pub mod config;
pub mod environment;
pub mod origin;
pub mod repository;
pub mod scope;
pub mod secret;
pub mod team_repository;

pub use config::{
    CacheConfig, Config, EvictionConfig, GitHubConfig, LoggingConfig, RateLimitConfig,
};
pub use environment::{BranchPolicy, EnvironmentEntry, ProtectionRule, Reviewer, ReviewerKind};
pub use origin::EntryOrigin;
pub use repository::{MergeSettings, RepositoryEntry, RepositoryRef, SecurityAnalysis, Visibility};
pub use scope::{EnvironmentScope, OrgScope, RepoScope, TeamScope};
pub use secret::{EnvironmentSecretEntry, SecretVisibility};
pub use team_repository::{normalize_permission, TeamRepositoryEntry};
