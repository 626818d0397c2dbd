//! repartition: command-line front end of the proceeds distribution engine.
//!
//! Computes distributions against the rule set stored in the local
//! database, records them in the distribution history and administers the
//! rules.

mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::commands::compute::ComputeArgs;
use crate::commands::history::HistoryArgs;
use crate::commands::rules::RulesCommands;
use crate::commands::Context;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "repartition")]
#[command(about = "Compute and audit the distribution of recovered case proceeds")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the distribution of a case
    Compute(ComputeArgs),
    /// Show or change the distribution rules
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// List recorded distributions
    History(HistoryArgs),
}

fn init_logging(verbose: bool, level: &str) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { level };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("repartition={level}").parse()?),
        )
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.logging.log_level)?;

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    let db_path = config.db_path();
    let conn = repartition_db::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    info!("Using database {:?}", db_path);

    let ctx = Context { conn, config };

    match cli.command {
        Commands::Compute(args) => commands::compute::run(&ctx, args),
        Commands::Rules { command } => commands::rules::run(&ctx, command),
        Commands::History(args) => commands::history::run(&ctx, args),
    }
}
