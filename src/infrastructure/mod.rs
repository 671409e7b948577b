//! Infrastructure layer module
//!
//! This module contains the adapters around the cache:
//! - Configuration management
//! - Logging infrastructure
//! - GitHub REST client
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod github;
pub mod logging;
