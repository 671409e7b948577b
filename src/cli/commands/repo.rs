use anyhow::{Context, Result};

use crate::cli::output::{detail_table, joined, or_dash, print_json, yes_no};
use crate::domain::models::RepositoryEntry;
use crate::services::OrganizationCache;

/// Handle repo command
pub async fn execute(cache: &OrganizationCache, name: &str, json: bool) -> Result<()> {
    let repo = cache
        .repository(name)
        .await
        .with_context(|| format!("Failed to read repository {}/{name}", cache.owner()))?;

    if json {
        return print_json(&*repo);
    }

    println!("{}", detail_table(&rows(&repo)));
    Ok(())
}

fn rows(repo: &RepositoryEntry) -> Vec<(&'static str, String)> {
    vec![
        ("Name", repo.name.clone()),
        ("Description", or_dash(&repo.description)),
        ("Visibility", repo.visibility.to_string()),
        ("Archived", yes_no(repo.is_archived)),
        ("Template", yes_no(repo.is_template)),
        ("Default branch", or_dash(&repo.default_branch)),
        ("Topics", joined(&repo.topics)),
        ("Language", or_dash(&repo.primary_language)),
        (
            "Fork of",
            repo.parent.as_ref().map_or_else(|| "-".to_string(), ToString::to_string),
        ),
        (
            "Created from",
            repo.template.as_ref().map_or_else(|| "-".to_string(), ToString::to_string),
        ),
        ("Squash merge", yes_no(repo.merge.allow_squash_merge)),
        ("Delete branch on merge", yes_no(repo.merge.delete_branch_on_merge)),
        ("Advanced security", yes_no(repo.security_analysis.advanced_security)),
        ("Vulnerability alerts", yes_no(repo.vulnerability_alerts())),
        ("URL", or_dash(&repo.html_url)),
        ("Source", format!("{:?}", repo.origin)),
    ]
}
