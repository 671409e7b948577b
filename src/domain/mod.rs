//! Domain layer for the organization metadata cache
//!
//! This module contains the cached entry models, scope keys, errors and the
//! port the cache uses to reach the remote API.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CacheError, CacheResult, EntityKind, RemoteError};
