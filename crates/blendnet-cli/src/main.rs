//! BlendNet operator CLI.
//!
//! This binary provides commands for inspecting providers, checking
//! dependencies, and publishing deployments to a provider bucket.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use blendnet_cli::commands;

/// BlendNet - Distributed Rendering Control
#[derive(Parser)]
#[command(name = "blendnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered providers with documentation and readiness
    Providers {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Check system dependencies and configuration
    Doctor,

    /// Publish the deployment payload and manager config to a bucket
    Deploy {
        /// Bucket receiving the payload
        #[arg(short, long)]
        bucket: String,

        /// Path to the manager config JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Install root to package (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Target provider (default: auto-selected from the environment)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Show active provider information and session resource naming
    Info {
        /// Session identifier used for resource naming
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Target provider (default: auto-selected from the environment)
        #[arg(short, long)]
        provider: Option<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Providers { json } => commands::providers::run(json),
        Commands::Doctor => commands::doctor::run(),
        Commands::Deploy {
            bucket,
            config,
            root,
            provider,
        } => commands::deploy::run(&bucket, &config, root.as_deref(), provider.as_deref()),
        Commands::Info {
            session,
            provider,
            json,
        } => commands::info::run(&session, provider.as_deref(), json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
