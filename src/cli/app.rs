//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;
use wiverify::output::OutputMode;

/// wiverify - Verify an Azure Workload Identity setup
#[derive(Parser, Debug)]
#[command(
    name = "wiverify",
    version,
    about = "Verify an Azure Workload Identity setup against live state",
    long_about = "Re-query the AKS cluster, Key Vault, managed identity, federated credential\n\
                  and Kubernetes objects, and compare them to the expected wiring.\n\n\
                  Every rule is reported in one pass. Exit code 0 means every gating\n\
                  rule passed, 1 means at least one did not, 2 means the run could not start."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./wiverify.toml, then ~/.config/wiverify/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the checklist (default when no command is given)
    Verify {
        /// Only run rules matching this glob (dependencies are included)
        #[arg(long, value_name = "GLOB")]
        only: Vec<String>,
    },

    /// List the rules without querying anything
    Rules {
        /// Only list rules matching this glob (dependencies are included)
        #[arg(long, value_name = "GLOB")]
        only: Vec<String>,
    },

    /// Write a sample wiverify.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show version
    Version,
}

/// Run the CLI, returning the process exit code
pub fn run() -> anyhow::Result<u8> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config = cli.config.as_deref();

    match cli.command {
        None => commands::verify(config, &[], output_mode),
        Some(Command::Verify { only }) => commands::verify(config, &only, output_mode),
        Some(Command::Rules { only }) => commands::rules(config, &only, output_mode),
        Some(Command::Init { force }) => commands::init(force, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION")
                    })
                );
            } else {
                println!("wiverify v{}", env!("CARGO_PKG_VERSION"));
            }
            Ok(0)
        },
    }
}
