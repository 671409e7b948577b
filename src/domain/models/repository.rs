//! Cached repository metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::origin::EntryOrigin;

/// Repository visibility as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Internal => "internal",
        }
    }

    /// Parse a GitHub visibility string, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner/name pair pointing at another repository (fork parent, template).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Security and analysis switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityAnalysis {
    pub advanced_security: bool,
    pub vulnerability_alerts: bool,
}

/// Merge behaviour of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeSettings {
    pub allow_auto_merge: bool,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_squash_merge: bool,
    pub allow_update_branch: bool,
    pub delete_branch_on_merge: bool,
    pub web_commit_signoff_required: bool,
    pub merge_commit_title: String,
    pub merge_commit_message: String,
    pub squash_merge_commit_title: String,
    pub squash_merge_commit_message: String,
}

/// Everything the cache keeps about one repository. Keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub is_archived: bool,
    pub is_private: bool,
    pub is_template: bool,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub homepage_url: String,
    pub has_issues: bool,
    pub has_discussions: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    pub has_pages: bool,
    pub allow_forking: bool,
    pub merge: MergeSettings,
    pub fork: bool,
    pub parent: Option<RepositoryRef>,
    pub template: Option<RepositoryRef>,
    pub html_url: String,
    pub ssh_url: String,
    pub git_url: String,
    pub svn_url: String,
    pub primary_language: String,
    pub security_analysis: SecurityAnalysis,
    pub origin: EntryOrigin,
}

impl RepositoryEntry {
    /// A repository with the given name and every other field defaulted.
    pub fn named(name: impl Into<String>, origin: EntryOrigin) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            visibility: Visibility::default(),
            is_archived: false,
            is_private: false,
            is_template: false,
            topics: Vec::new(),
            default_branch: String::new(),
            homepage_url: String::new(),
            has_issues: false,
            has_discussions: false,
            has_projects: false,
            has_wiki: false,
            has_pages: false,
            allow_forking: false,
            merge: MergeSettings::default(),
            fork: false,
            parent: None,
            template: None,
            html_url: String::new(),
            ssh_url: String::new(),
            git_url: String::new(),
            svn_url: String::new(),
            primary_language: String::new(),
            security_analysis: SecurityAnalysis::default(),
            origin,
        }
    }

    pub fn vulnerability_alerts(&self) -> bool {
        self.security_analysis.vulnerability_alerts
    }
}
