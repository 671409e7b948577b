use anyhow::{Context, Result};

use crate::cli::output::{detail_table, joined, print_gone, print_json, yes_no};
use crate::domain::models::EnvironmentEntry;
use crate::services::{OrganizationCache, Resolution};

/// Handle env command
///
/// Checks the parent repository first, the way a read handler does.
pub async fn execute(
    cache: &OrganizationCache,
    repository: &str,
    environment: &str,
    json: bool,
) -> Result<()> {
    let resolution = cache
        .resolve_environment(repository, environment)
        .await
        .with_context(|| format!("Failed to read environment {repository}/{environment}"))?;

    let env = match resolution {
        Resolution::Found(env) => env,
        Resolution::Gone(reason) => {
            return print_gone(&format!("environment {repository}/{environment}"), reason, json)
        }
    };

    if json {
        return print_json(&*env);
    }

    println!("{}", detail_table(&rows(&env)));
    Ok(())
}

fn rows(env: &EnvironmentEntry) -> Vec<(&'static str, String)> {
    let branch_policy = match env.deployment_branch_policy {
        None => "any branch".to_string(),
        Some(policy) if policy.protected_branches => "protected branches".to_string(),
        Some(policy) if policy.custom_branch_policies => "custom policies".to_string(),
        Some(_) => "restricted".to_string(),
    };
    vec![
        ("Name", env.name.clone()),
        ("Wait timer", format!("{} min", env.wait_timer)),
        ("Prevent self review", yes_no(env.prevent_self_review)),
        ("Admins can bypass", yes_no(env.can_admins_bypass)),
        ("Team reviewers", joined(env.team_reviewers())),
        ("User reviewers", joined(env.user_reviewers())),
        ("Branch policy", branch_policy),
        ("Source", format!("{:?}", env.origin)),
    ]
}
