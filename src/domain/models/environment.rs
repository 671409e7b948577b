//! Cached deployment environment metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::origin::EntryOrigin;

/// Kind of a required reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewerKind {
    Team,
    User,
}

impl ReviewerKind {
    /// Parse the reviewer `type` string GitHub uses ("Team" / "User").
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Team" => Some(Self::Team),
            "User" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for ReviewerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team => f.write_str("Team"),
            Self::User => f.write_str("User"),
        }
    }
}

/// A required reviewer of deployments to an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reviewer {
    pub kind: ReviewerKind,
    pub id: i64,
}

/// Which branches may deploy to an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BranchPolicy {
    pub protected_branches: bool,
    pub custom_branch_policies: bool,
}

/// One protection rule attached to an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionRule {
    /// Rule type as reported by GitHub (`wait_timer`, `required_reviewers`, `branch_policy`).
    pub rule_type: String,
    pub wait_timer: i64,
    pub prevent_self_review: bool,
    pub reviewers: Vec<Reviewer>,
}

/// Everything the cache keeps about one environment. Keyed by `name` within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub can_admins_bypass: bool,
    /// Minutes to wait before a deployment proceeds. Defaulted to 0 on point queries.
    pub wait_timer: i64,
    /// Defaulted to `false` on point queries.
    pub prevent_self_review: bool,
    pub reviewers: Vec<Reviewer>,
    pub deployment_branch_policy: Option<BranchPolicy>,
    pub protection_rules: Vec<ProtectionRule>,
    pub origin: EntryOrigin,
}

impl EnvironmentEntry {
    pub fn team_reviewers(&self) -> impl Iterator<Item = i64> + '_ {
        self.reviewers_of(ReviewerKind::Team)
    }

    pub fn user_reviewers(&self) -> impl Iterator<Item = i64> + '_ {
        self.reviewers_of(ReviewerKind::User)
    }

    fn reviewers_of(&self, kind: ReviewerKind) -> impl Iterator<Item = i64> + '_ {
        self.reviewers
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> EnvironmentEntry {
        EnvironmentEntry {
            name: "prod".to_string(),
            can_admins_bypass: true,
            wait_timer: 10,
            prevent_self_review: false,
            reviewers: vec![
                Reviewer { kind: ReviewerKind::Team, id: 42 },
                Reviewer { kind: ReviewerKind::User, id: 7 },
                Reviewer { kind: ReviewerKind::Team, id: 43 },
            ],
            deployment_branch_policy: None,
            protection_rules: vec![],
            origin: EntryOrigin::BulkLoad,
        }
    }

    #[test]
    fn test_reviewers_split_by_kind_in_order() {
        let env = entry();
        assert_eq!(env.team_reviewers().collect::<Vec<_>>(), vec![42, 43]);
        assert_eq!(env.user_reviewers().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_reviewer_kind_parse() {
        assert_eq!(ReviewerKind::parse("Team"), Some(ReviewerKind::Team));
        assert_eq!(ReviewerKind::parse("User"), Some(ReviewerKind::User));
        assert_eq!(ReviewerKind::parse("Bot"), None);
    }
}
