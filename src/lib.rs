//! recipe-deck: registry and download orchestration for news recipe
//! conversion jobs.
//!
//! The library reconciles recipe definitions on disk against a persisted
//! registry, drives single and bulk conversion runs through an external
//! converter process, keeps a cron schedule in sync, and merges
//! externally-sourced recipe collections into the canonical location.

pub mod config;
pub mod convert;
pub mod fetch;
pub mod import;
pub mod orchestrate;
pub mod scan;
pub mod schedule;
pub mod settings;
pub mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use orchestrate::Orchestrator;
use settings::Settings;

#[derive(Parser)]
#[clap(
    name = "recipe-deck",
    version,
    about = "Manage news recipes and orchestrate conversion runs"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile recipe files on disk against the stored registry
    Scan,
    /// Convert a single recipe by name
    Run { name: String },
    /// Convert every enabled recipe, reporting per-recipe outcomes
    RunAll,
    /// Flip a recipe's enabled flag
    Toggle { name: String },
    /// Persist a new cron schedule and push it to the scheduler
    Schedule { hour: String, minute: String },
    /// Merge recipe files from a local directory into the canonical location
    Import { path: PathBuf },
    /// Fetch a git repository and merge the recipe files it contains
    ImportRepo { url: String },
}

/// CLI entrypoint, extracted from `main` so integration tests can drive it.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    let engine = Orchestrator::new(&settings);

    // Every invocation is a process start: ensure the config document exists
    // and reconcile the registry with the files on disk before dispatching,
    // so a fresh deployment sees its recipes without a manual scan.
    let config = engine.scan().await?;
    config.trace_loaded();

    match cli.command {
        Commands::Scan => {
            println!("{}", serde_json::to_string_pretty(&config.recipes)?);
        }
        Commands::Run { name } => {
            engine.convert_recipe(&name).await?;
            println!("Converted {name}");
        }
        Commands::RunAll => {
            let results = engine.run_all().await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            if results.values().any(|outcome| !outcome.success) {
                anyhow::bail!("one or more conversions failed");
            }
        }
        Commands::Toggle { name } => {
            let enabled = engine.toggle(&name).await?;
            println!("{name} enabled: {enabled}");
        }
        Commands::Schedule { hour, minute } => {
            engine.set_schedule(&hour, &minute).await?;
            println!("Schedule set to {minute} {hour} * * *");
        }
        Commands::Import { path } => {
            let report = engine.import_from(&path).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::ImportRepo { url } => {
            let report = engine.import_from_repo(&url).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
