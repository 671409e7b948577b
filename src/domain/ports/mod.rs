//! Port trait definitions (Hexagonal Architecture)
//!
//! - GitHubApi: paginated list calls and point queries against one organization
//!
//! The cache services depend only on these traits, so tests can substitute
//! in-memory implementations for the HTTP adapter.

pub mod github_api;

pub use github_api::{GitHubApi, Page};
