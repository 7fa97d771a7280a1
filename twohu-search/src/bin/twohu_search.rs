//! Command-line front end for the twohu catalogue search.
//!
//! Usage:
//!     twohu-search --db catalogue.sqlite seed authors.json
//!     twohu-search --db catalogue.sqlite videos "【东方MMD】灵梦的日常" --limit 20
//!     twohu-search --db catalogue.sqlite authors "Gensokyo"
//!     twohu-search patterns "東方2hu"
//!
//! Results are printed as JSON. Log verbosity follows RUST_LOG.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twohu_search::models::{AuthorProfile, NewAuthor, NewVideo};
use twohu_search::{SearchConfig, SearchService, SearchServiceApi};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the catalogue SQLite database
    #[arg(short, long, default_value = "twohu.sqlite")]
    db: PathBuf,

    /// JSON search configuration (defaults apply when absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search videos by title
    Videos {
        query: String,
        /// Maximum results (invalid values fall back to the default)
        #[arg(short, long)]
        limit: Option<String>,
    },
    /// Search authors by platform name
    Authors {
        query: String,
        #[arg(short, long)]
        limit: Option<String>,
    },
    /// Show the effective query and retrieval patterns without searching
    Patterns { query: String },
    /// Load authors and their videos from a JSON file
    Seed { file: PathBuf },
}

/// One author in a seed file, with the videos they made.
#[derive(Debug, Deserialize)]
struct SeedAuthor {
    #[serde(flatten)]
    profile: AuthorProfile,
    #[serde(default)]
    videos: Vec<NewVideo>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twohu_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearchConfig::default(),
    };

    let service = SearchService::open(&args.db, config)
        .with_context(|| format!("Failed to open catalogue at {}", args.db.display()))?;

    match args.command {
        Command::Videos { query, limit } => {
            let results = service.search_videos(query, limit).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Authors { query, limit } => {
            let results = service.search_authors(query, limit).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Patterns { query } => {
            let prepared = service.prepare(&query);
            let patterns: Vec<&str> = prepared.patterns.iter().map(|p| p.fragment()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "query": prepared.original,
                    "effective": prepared.effective,
                    "usedCore": prepared.used_core(),
                    "patterns": patterns,
                }))?
            );
        }
        Command::Seed { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let authors: Vec<SeedAuthor> =
                serde_json::from_str(&content).context("Failed to parse seed file")?;

            let db = service.database();
            let mut videos = 0usize;
            for seed in &authors {
                let author_id = db.insert_author(&NewAuthor { profile: seed.profile.clone() })?;
                for video in &seed.videos {
                    db.insert_video(author_id, video)?;
                    videos += 1;
                }
            }
            tracing::info!(authors = authors.len(), videos, "seeded catalogue");
        }
    }

    Ok(())
}
