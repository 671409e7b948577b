//! REST response shapes and their mapping onto cache entries.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::{
    normalize_permission, BranchPolicy, EntryOrigin, EnvironmentEntry, EnvironmentSecretEntry,
    MergeSettings, ProtectionRule, RepositoryEntry, RepositoryRef, Reviewer, ReviewerKind,
    SecretVisibility, SecurityAnalysis, TeamRepositoryEntry, Visibility,
};

#[derive(Debug, Deserialize)]
pub struct OrganizationDto {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct OwnerDto {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryRefDto {
    pub name: String,
    pub owner: OwnerDto,
}

impl From<RepositoryRefDto> for RepositoryRef {
    fn from(dto: RepositoryRefDto) -> Self {
        Self {
            owner: dto.owner.login,
            name: dto.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusDto {
    pub status: String,
}

impl StatusDto {
    fn enabled(status: Option<&Self>) -> bool {
        status.is_some_and(|s| s.status == "enabled")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SecurityAndAnalysisDto {
    pub advanced_security: Option<StatusDto>,
    pub dependabot_security_updates: Option<StatusDto>,
}

/// Repository as returned by `GET /orgs/{org}/repos` and `GET /repos/{owner}/{repo}`.
#[derive(Debug, Deserialize)]
pub struct RepositoryDto {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    pub default_branch: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub has_discussions: bool,
    #[serde(default)]
    pub has_projects: bool,
    #[serde(default)]
    pub has_wiki: bool,
    #[serde(default)]
    pub has_pages: bool,
    #[serde(default)]
    pub allow_forking: bool,
    #[serde(default)]
    pub allow_auto_merge: bool,
    #[serde(default)]
    pub allow_merge_commit: bool,
    #[serde(default)]
    pub allow_rebase_merge: bool,
    #[serde(default)]
    pub allow_squash_merge: bool,
    #[serde(default)]
    pub allow_update_branch: bool,
    #[serde(default)]
    pub delete_branch_on_merge: bool,
    #[serde(default)]
    pub web_commit_signoff_required: bool,
    pub merge_commit_title: Option<String>,
    pub merge_commit_message: Option<String>,
    pub squash_merge_commit_title: Option<String>,
    pub squash_merge_commit_message: Option<String>,
    #[serde(default)]
    pub fork: bool,
    pub parent: Option<RepositoryRefDto>,
    pub template_repository: Option<RepositoryRefDto>,
    pub html_url: Option<String>,
    pub ssh_url: Option<String>,
    pub git_url: Option<String>,
    pub svn_url: Option<String>,
    pub language: Option<String>,
    pub security_and_analysis: Option<SecurityAndAnalysisDto>,
}

impl RepositoryDto {
    pub fn into_entry(self, origin: EntryOrigin) -> RepositoryEntry {
        let visibility = self
            .visibility
            .as_deref()
            .and_then(Visibility::parse)
            .unwrap_or(if self.private {
                Visibility::Private
            } else {
                Visibility::Public
            });
        let security = self.security_and_analysis.unwrap_or_default();

        RepositoryEntry {
            name: self.name,
            description: self.description.unwrap_or_default(),
            visibility,
            is_archived: self.archived,
            is_private: self.private,
            is_template: self.is_template,
            topics: self.topics,
            default_branch: self.default_branch.unwrap_or_default(),
            homepage_url: self.homepage.unwrap_or_default(),
            has_issues: self.has_issues,
            has_discussions: self.has_discussions,
            has_projects: self.has_projects,
            has_wiki: self.has_wiki,
            has_pages: self.has_pages,
            allow_forking: self.allow_forking,
            merge: MergeSettings {
                allow_auto_merge: self.allow_auto_merge,
                allow_merge_commit: self.allow_merge_commit,
                allow_rebase_merge: self.allow_rebase_merge,
                allow_squash_merge: self.allow_squash_merge,
                allow_update_branch: self.allow_update_branch,
                delete_branch_on_merge: self.delete_branch_on_merge,
                web_commit_signoff_required: self.web_commit_signoff_required,
                merge_commit_title: self.merge_commit_title.unwrap_or_default(),
                merge_commit_message: self.merge_commit_message.unwrap_or_default(),
                squash_merge_commit_title: self.squash_merge_commit_title.unwrap_or_default(),
                squash_merge_commit_message: self.squash_merge_commit_message.unwrap_or_default(),
            },
            fork: self.fork,
            parent: self.parent.map(Into::into),
            template: self.template_repository.map(Into::into),
            html_url: self.html_url.unwrap_or_default(),
            ssh_url: self.ssh_url.unwrap_or_default(),
            git_url: self.git_url.unwrap_or_default(),
            svn_url: self.svn_url.unwrap_or_default(),
            primary_language: self.language.unwrap_or_default(),
            security_analysis: SecurityAnalysis {
                advanced_security: StatusDto::enabled(security.advanced_security.as_ref()),
                vulnerability_alerts: StatusDto::enabled(
                    security.dependabot_security_updates.as_ref(),
                ),
            },
            origin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewerIdDto {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewerDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub reviewer: Option<ReviewerIdDto>,
}

#[derive(Debug, Deserialize)]
pub struct ProtectionRuleDto {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub wait_timer: i64,
    #[serde(default)]
    pub prevent_self_review: bool,
    #[serde(default)]
    pub reviewers: Vec<ReviewerDto>,
}

impl ProtectionRuleDto {
    fn reviewers(&self) -> impl Iterator<Item = Reviewer> + '_ {
        self.reviewers.iter().filter_map(|r| {
            Some(Reviewer {
                kind: ReviewerKind::parse(&r.kind)?,
                id: r.reviewer.as_ref()?.id,
            })
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BranchPolicyDto {
    #[serde(default)]
    pub protected_branches: bool,
    #[serde(default)]
    pub custom_branch_policies: bool,
}

#[derive(Debug, Deserialize)]
pub struct EnvironmentListDto {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub environments: Vec<EnvironmentDto>,
}

#[derive(Debug, Deserialize)]
pub struct EnvironmentDto {
    pub name: String,
    #[serde(default = "default_can_admins_bypass")]
    pub can_admins_bypass: bool,
    #[serde(default)]
    pub protection_rules: Vec<ProtectionRuleDto>,
    pub deployment_branch_policy: Option<BranchPolicyDto>,
}

const fn default_can_admins_bypass() -> bool {
    true
}

impl EnvironmentDto {
    /// Map onto an entry. Point-query entries keep reviewers and the branch
    /// policy but default the wait timer and self-review flag and carry no
    /// protection rules.
    pub fn into_entry(self, origin: EntryOrigin) -> EnvironmentEntry {
        let reviewers = self
            .protection_rules
            .iter()
            .filter(|rule| rule.rule_type == "required_reviewers")
            .flat_map(ProtectionRuleDto::reviewers)
            .collect();
        let deployment_branch_policy = self.deployment_branch_policy.map(|p| BranchPolicy {
            protected_branches: p.protected_branches,
            custom_branch_policies: p.custom_branch_policies,
        });

        let (wait_timer, prevent_self_review, protection_rules) = match origin {
            EntryOrigin::PointQuery => (0, false, Vec::new()),
            EntryOrigin::BulkLoad => {
                let wait_timer = self
                    .protection_rules
                    .iter()
                    .find(|rule| rule.rule_type == "wait_timer")
                    .map_or(0, |rule| rule.wait_timer);
                let prevent_self_review = self
                    .protection_rules
                    .iter()
                    .any(|rule| rule.rule_type == "required_reviewers" && rule.prevent_self_review);
                let rules = self
                    .protection_rules
                    .iter()
                    .map(|rule| ProtectionRule {
                        rule_type: rule.rule_type.clone(),
                        wait_timer: rule.wait_timer,
                        prevent_self_review: rule.prevent_self_review,
                        reviewers: rule.reviewers().collect(),
                    })
                    .collect();
                (wait_timer, prevent_self_review, rules)
            }
        };

        EnvironmentEntry {
            name: self.name,
            can_admins_bypass: self.can_admins_bypass,
            wait_timer,
            prevent_self_review,
            reviewers,
            deployment_branch_policy,
            protection_rules,
            origin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SecretListDto {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub secrets: Vec<SecretDto>,
}

#[derive(Debug, Deserialize)]
pub struct SecretDto {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SecretDto {
    /// Environment secrets are always private to their environment.
    pub fn into_entry(self, origin: EntryOrigin) -> EnvironmentSecretEntry {
        EnvironmentSecretEntry {
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            visibility: SecretVisibility::Private,
            selected_teams: Vec::new(),
            selected_repositories: Vec::new(),
            origin,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionsDto {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

impl PermissionsDto {
    fn highest(&self) -> &'static str {
        if self.admin {
            "admin"
        } else if self.maintain {
            "maintain"
        } else if self.push {
            "push"
        } else if self.triage {
            "triage"
        } else {
            "pull"
        }
    }
}

/// Repository as seen through a team's grant.
#[derive(Debug, Deserialize)]
pub struct TeamRepositoryDto {
    pub name: String,
    pub role_name: Option<String>,
    pub permissions: Option<PermissionsDto>,
}

impl TeamRepositoryDto {
    pub fn into_entry(self, origin: EntryOrigin) -> TeamRepositoryEntry {
        let permission = match self.role_name.as_deref() {
            Some(role) if !role.is_empty() => normalize_permission(role),
            _ => self
                .permissions
                .unwrap_or_default()
                .highest()
                .to_string(),
        };
        TeamRepositoryEntry {
            repository: self.name,
            permission,
            origin,
        }
    }
}
