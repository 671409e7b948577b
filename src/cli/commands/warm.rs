use anyhow::{Context, Result};
use comfy_table::Cell;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{list_table, print_json};
use crate::services::{CacheStats, OrganizationCache};

/// Handle warm command
pub async fn execute(cache: &OrganizationCache, cancel: &CancellationToken, json: bool) -> Result<()> {
    cache
        .repositories()
        .bulk_load_with_cancel(cache.org_scope(), cancel)
        .await
        .with_context(|| format!("Failed to load repositories of {}", cache.owner()))?;

    let loaded = cache.repositories().len(cache.org_scope()).await;
    let stats = cache.stats();

    if json {
        return print_json(&json!({
            "owner": cache.owner(),
            "repositories": loaded,
            "stats": stats,
        }));
    }

    println!("Cached {loaded} repositories of {}", cache.owner());
    let mut table = list_table(&[
        "cache", "loads", "pages", "records", "hits", "fallbacks", "not found", "evictions",
    ]);
    for (name, s) in [
        ("repositories", stats.repositories),
        ("environments", stats.environments),
        ("environment secrets", stats.environment_secrets),
        ("team repositories", stats.team_repositories),
    ] {
        table.add_row(stats_row(name, &s));
    }
    println!("{table}");
    Ok(())
}

fn stats_row(name: &str, stats: &CacheStats) -> Vec<Cell> {
    let mut row = vec![Cell::new(name)];
    row.extend(
        [
            stats.bulk_loads,
            stats.pages,
            stats.records,
            stats.hits,
            stats.fallback_fetches,
            stats.not_found,
            stats.evictions,
        ]
        .into_iter()
        .map(Cell::new),
    );
    row
}
