//! CLI command implementations.

pub mod environment;
pub mod repo;
pub mod secret;
pub mod team_repo;
pub mod warm;
