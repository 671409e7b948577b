use serde::{Deserialize, Serialize};

use super::origin::EntryOrigin;

/// A team's access to one repository. Keyed by `repository` within a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRepositoryEntry {
    pub repository: String,
    /// Normalized permission (`pull`, `triage`, `push`, `maintain`, `admin` or a custom role).
    pub permission: String,
    pub origin: EntryOrigin,
}

/// Map a GitHub role name onto the permission vocabulary used by team bindings.
///
/// GitHub reports `read`/`write` as role names where the binding API expects
/// `pull`/`push`; every other role passes through unchanged.
pub fn normalize_permission(role_name: &str) -> String {
    match role_name {
        "read" => "pull".to_string(),
        "write" => "push".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_permission() {
        assert_eq!(normalize_permission("read"), "pull");
        assert_eq!(normalize_permission("write"), "push");
        assert_eq!(normalize_permission("maintain"), "maintain");
        assert_eq!(normalize_permission("admin"), "admin");
        assert_eq!(normalize_permission("security-manager"), "security-manager");
    }
}
