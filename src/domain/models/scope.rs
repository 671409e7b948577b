//! Scope keys: the parent under which a collection is bulk-loaded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An organization (owner login). Scope of the repository collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgScope(pub String);

impl OrgScope {
    pub fn new(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    pub fn login(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "org {}", self.0)
    }
}

/// A repository. Scope of the environment collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoScope {
    pub repository: String,
}

impl RepoScope {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }
}

impl fmt::Display for RepoScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo {}", self.repository)
    }
}

/// A repository environment. Scope of the environment secret collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentScope {
    pub repository: String,
    pub environment: String,
}

impl EnvironmentScope {
    pub fn new(repository: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            environment: environment.into(),
        }
    }
}

impl fmt::Display for EnvironmentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "environment {}/{}", self.repository, self.environment)
    }
}

/// A team, by numeric id. Scope of the team-repository collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamScope(pub i64);

impl TeamScope {
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TeamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}
