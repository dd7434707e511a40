//! team-normalizer
//!
//! Resolves team names from the command line against the live ESPN roster
//! (or a local roster file when ROSTER_FILE is set).
//!
//! ```text
//! team-normalizer UConn "Kentuky" "Michigan State University"
//! team-normalizer --threshold 80 "Dook"
//! team-normalizer --strict --threshold 90 --json "St. John's"
//! team-normalizer --list
//! ```
//!
//! Results go to stdout, logs to stderr and LOG_DIR. Exit code is 1 if any
//! name fails to resolve under --strict, or on invalid input / roster failure.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, info_span};

use ncaa_team_normalizer::config::roster_file_from_env;
use ncaa_team_normalizer::logging;
use ncaa_team_normalizer::{
    AliasTable, EspnRosterProvider, FileRosterProvider, MatchResult, NoMatchPolicy,
    ResolveOptions, RosterCache, RosterCacheConfig, RosterProvider, TeamNormalizer,
};

#[derive(Parser)]
#[command(name = "team-normalizer")]
#[command(version)]
#[command(about = "Resolve NCAA basketball team names to canonical roster entries")]
#[command(long_about = None)]
struct Cli {
    /// Team names to resolve
    #[arg(required_unless_present = "list")]
    names: Vec<String>,

    /// Fail (exit 1) when a name matches nothing
    #[arg(long)]
    strict: bool,

    /// Minimum fuzzy score, 0-100 (default: TEAM_FUZZY_THRESHOLD or 85)
    #[arg(long, short)]
    threshold: Option<f64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Print the full roster instead of resolving names
    #[arg(long, conflicts_with = "names")]
    list: bool,
}

#[derive(Serialize)]
struct Resolution<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn build_provider() -> Result<Arc<dyn RosterProvider>> {
    match roster_file_from_env() {
        Some(path) => {
            info!("Using roster file {}", path.display());
            Ok(Arc::new(FileRosterProvider::new(path)))
        }
        None => {
            let espn = EspnRosterProvider::from_env()?;
            info!("Using ESPN roster at {}", espn.url());
            Ok(Arc::new(espn))
        }
    }
}

fn print_text(input: &str, outcome: &ncaa_team_normalizer::Result<Option<MatchResult>>) {
    match outcome {
        Ok(Some(m)) => println!(
            "{} -> {} [id={}{}] ({}, {:.1})",
            input,
            m.canonical_name,
            m.entity_id,
            if m.abbreviation.is_empty() {
                String::new()
            } else {
                format!(", {}", m.abbreviation)
            },
            m.match_method,
            m.confidence
        ),
        Ok(None) => println!("{} -> (no match)", input),
        Err(e) => println!("{} -> error: {}", input, e),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let (_log_guard, log_config) = logging::init_logging();

    let root_span = info_span!(
        "team_normalizer",
        run_id = %log_config.run_id,
        version = env!("CARGO_PKG_VERSION"),
    );
    let _enter = root_span.enter();

    let mut options = ResolveOptions::from_env();
    if let Some(threshold) = cli.threshold {
        options.fuzzy_threshold = threshold;
    }
    if cli.strict {
        options.on_no_match = NoMatchPolicy::Fail;
    }

    let provider = build_provider()?;
    let cache = Arc::new(RosterCache::new(provider, RosterCacheConfig::from_env()));
    let matcher = TeamNormalizer::new(cache)
        .with_aliases(Arc::new(AliasTable::from_env()))
        .with_options(options);

    if cli.list {
        return match matcher.list_all_entities().await {
            Ok(entities) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&entities)?);
                } else {
                    for e in &entities {
                        println!("{}\t{}\t{}", e.entity_id, e.abbreviation, e.canonical_name);
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!("Failed to list roster: {}", e);
                eprintln!("error: {}", e);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let mut failed = false;
    let mut resolutions = Vec::with_capacity(cli.names.len());

    for name in &cli.names {
        let outcome = matcher.resolve(name).await;
        if let Err(e) = &outcome {
            failed = true;
            error!("Failed to resolve '{}': {}", name, e);
        }

        if cli.json {
            let (result, error) = match outcome {
                Ok(result) => (result, None),
                Err(e) => (None, Some(e.to_string())),
            };
            resolutions.push(Resolution {
                input: name,
                result,
                error,
            });
        } else {
            print_text(name, &outcome);
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolutions)?);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
