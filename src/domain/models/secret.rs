use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::origin::EntryOrigin;

/// Who may read a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretVisibility {
    #[default]
    Private,
    Selected,
    Organization,
}

impl SecretVisibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Self::Private),
            "selected" => Some(Self::Selected),
            "all" | "organization" => Some(Self::Organization),
            _ => None,
        }
    }
}

/// Metadata of one environment secret. The secret value is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSecretEntry {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub visibility: SecretVisibility,
    pub selected_teams: Vec<String>,
    pub selected_repositories: Vec<String>,
    pub origin: EntryOrigin,
}
