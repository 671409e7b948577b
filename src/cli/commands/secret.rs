use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::cli::output::{detail_table, print_json};
use crate::services::OrganizationCache;

/// Handle secret command
pub async fn execute(
    cache: &OrganizationCache,
    repository: &str,
    environment: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let secret = cache
        .environment_secret(repository, environment, name)
        .await
        .with_context(|| {
            format!("Failed to read secret {name} of environment {repository}/{environment}")
        })?;

    if json {
        return print_json(&*secret);
    }

    let timestamp = |at: Option<DateTime<Utc>>| {
        at.map_or_else(
            || "-".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    };
    println!(
        "{}",
        detail_table(&[
            ("Name", secret.name.clone()),
            ("Created at", timestamp(secret.created_at)),
            ("Updated at", timestamp(secret.updated_at)),
            ("Visibility", format!("{:?}", secret.visibility).to_lowercase()),
            ("Source", format!("{:?}", secret.origin)),
        ])
    );
    Ok(())
}
