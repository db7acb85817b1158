use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedguard::config::Config;
use feedguard::migrate::{
    add_feeds_to_collection, FeedSource, KeywordCategorizer, MigrationEngine, MigrationReason,
};
use feedguard::sanitize::{sanitize_title, sanitize_url};
use feedguard::store::{Database, DatabaseError};

/// Get the config directory path (~/.config/feedguard/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedguard"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedguard",
    about = "Feed collection migration and sanitization for a personal news aggregator"
)]
struct Args {
    /// Print migration status and exit (the feed collection is never modified)
    #[arg(long)]
    status: bool,

    /// Reset the feed collection to the curated defaults
    #[arg(long)]
    reset_feeds: bool,

    /// Import a JSON array of feeds, sanitized and merged into the collection
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Add a single feed URL to the collection
    #[arg(long, value_name = "URL")]
    add: Option<String>,

    /// State database path (overrides config file)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,
}

/// Every ingested feed crosses the sanitizer before it touches the stored
/// collection. Feeds whose URL is rejected are dropped entirely.
fn sanitize_incoming(feeds: Vec<FeedSource>) -> Vec<FeedSource> {
    feeds
        .into_iter()
        .filter_map(|mut feed| {
            let url = sanitize_url(&feed.url);
            if url.is_empty() {
                tracing::warn!("dropping imported feed with rejected URL");
                return None;
            }
            feed.url = url;
            feed.title = feed
                .title
                .as_deref()
                .map(sanitize_title)
                .filter(|t| !t.is_empty());
            feed.category = feed
                .category
                .as_deref()
                .map(sanitize_title)
                .filter(|c| !c.is_empty());
            Some(feed)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The directory holds the user's feed list; keep it user-only on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to set config directory permissions to 0700"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))?;

    let db_path = args
        .db
        .or_else(|| config.database_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config_dir.join("state.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of feedguard appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open state database: {}", e)),
    };

    let engine = MigrationEngine::new(db.clone(), KeywordCategorizer);

    if args.status {
        let status = engine.status().await?;
        println!(
            "Stored version: {}",
            status.stored_version.as_deref().unwrap_or("(unversioned)")
        );
        println!("Current version: {}", status.current_version);
        println!(
            "Needs migration: {}",
            if status.needs_migration { "yes" } else { "no" }
        );
        return Ok(());
    }

    if args.reset_feeds {
        let feeds = engine.reset_to_defaults().await?;
        println!("Reset feed collection to {} curated defaults.", feeds.len());
        return Ok(());
    }

    let result = engine.bootstrap(config.seed_defaults).await?;
    match result.reason {
        MigrationReason::DefaultsSeeded => {
            println!(
                "First run: stored {} curated default feeds.",
                result.feeds.len()
            );
        }
        reason if result.migrated => println!("Migrated feed collection: {reason}"),
        reason => println!("{reason}"),
    }
    let current = result.feeds;

    let mut incoming: Vec<FeedSource> = Vec::new();
    if let Some(path) = &args.import {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import file: {}", path.display()))?;
        let feeds: Vec<FeedSource> =
            serde_json::from_str(&content).context("Import file is not a JSON array of feeds")?;
        incoming.extend(feeds);
    }
    if let Some(url) = &args.add {
        incoming.push(FeedSource::new(url));
    }

    if !incoming.is_empty() {
        let before = incoming.len();
        let sanitized = sanitize_incoming(incoming);
        if sanitized.len() < before {
            eprintln!(
                "Warning: {} feed(s) rejected by URL sanitization",
                before - sanitized.len()
            );
        }
        let merged = add_feeds_to_collection(current, sanitized);
        engine.store_feeds(&merged).await?;
        println!("Feed collection now has {} feeds.", merged.len());
    }

    Ok(())
}
