//! Lattice - correction detection for coding-assistant sessions
//!
//! Entry point for the `lattice` binary. The session hooks call
//! `lattice detect` at the end of a session; `lattice init` provisions the
//! knowledge store.

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::detect::DetectArgs;
use lattice_core::LatticeConfig;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lattice")]
#[command(about = "Detect user corrections in coding-assistant sessions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "LATTICE_CONFIG")]
    config: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect corrections in recent observations
    Detect {
        /// Only analyze observations at or after this instant (ISO 8601)
        #[arg(long)]
        since: Option<String>,

        /// Session identifier, echoed in the report
        #[arg(long)]
        session: Option<String>,

        /// Detect without writing corrections or instincts
        #[arg(long)]
        dry_run: bool,

        /// Include per-correction results
        #[arg(short, long)]
        verbose: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Log corrections but do not create instincts
        #[arg(long)]
        no_instincts: bool,
    },

    /// Create the knowledge store and patterns table if missing
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::new(format!(
        "lattice={level},lattice_core={level}",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries the report
        .init();

    debug!("Lattice v{} starting...", env!("CARGO_PKG_VERSION"));

    // detect reports a bad config instead of failing; init refuses to run
    let config = LatticeConfig::load(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to load config".to_string(),
        }
    });

    match cli.command {
        Commands::Detect {
            since,
            session,
            dry_run,
            verbose,
            json,
            no_instincts,
        } => cli::detect::handle(
            config,
            DetectArgs {
                since,
                session,
                dry_run,
                verbose,
                json,
                no_instincts,
            },
        ),
        Commands::Init => cli::init::handle(&config?),
    }
}
