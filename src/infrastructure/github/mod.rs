//! GitHub REST adapter
//!
//! Implements the `GitHubApi` port over reqwest with client-side throttling.

pub mod client;
pub mod models;

pub use client::{GitHubClient, GitHubClientConfig};
