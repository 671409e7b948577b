use anyhow::{Context, Result};

use crate::cli::output::{detail_table, print_gone, print_json};
use crate::services::{OrganizationCache, Resolution};

/// Handle team-repo command
pub async fn execute(
    cache: &OrganizationCache,
    team_id: i64,
    repository: &str,
    json: bool,
) -> Result<()> {
    let resolution = cache
        .resolve_team_repository(team_id, repository)
        .await
        .with_context(|| format!("Failed to read access of team {team_id} to {repository}"))?;

    let binding = match resolution {
        Resolution::Found(binding) => binding,
        Resolution::Gone(reason) => {
            return print_gone(&format!("team {team_id} access to {repository}"), reason, json)
        }
    };

    if json {
        return print_json(&*binding);
    }

    println!(
        "{}",
        detail_table(&[
            ("Team", team_id.to_string()),
            ("Repository", binding.repository.clone()),
            ("Permission", binding.permission.clone()),
            ("Source", format!("{:?}", binding.origin)),
        ])
    );
    Ok(())
}
