//! statewright - compile and drive textual state machine definitions
//!
//! Provides definition checking, scripted runs, and an interactive REPL.

mod commands;
mod config;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statewright")]
#[command(about = "Compile and drive textual state machine definitions")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "STATEWRIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Hook name to bind to a logging hook (repeatable)
    #[arg(long = "hook", global = true)]
    hooks: Vec<String>,

    /// Bind every hook name referenced by the definition
    #[arg(long, global = true)]
    auto_bind: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a definition and render its states
    Check {
        /// Definition text (or @file to read from file)
        definition: String,

        /// Print the machine description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a machine and apply a sequence of conditions
    Run {
        /// Definition text (or @file to read from file)
        definition: String,

        /// Conditions to apply, in order (state names with --force)
        steps: Vec<String>,

        /// Treat steps as state names and force each transition
        #[arg(short, long)]
        force: bool,
    },

    /// Start an interactive REPL on a machine
    Repl {
        /// Definition text (or @file to read from file)
        definition: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.auto_bind {
        config.hooks.auto_bind = true;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Repl { definition } => {
            let definition = commands::load_definition(&definition)?;
            let names = commands::hook_names(&definition, &config.hooks, &cli.hooks)?;
            let machine = commands::build_machine(&definition, &names).map_err(|e| {
                eprintln!("{}: {}", "Invalid definition".red(), e);
                e
            })?;
            repl::run(machine, &config.repl)?;
        }
        cmd => match commands::execute(cmd, &config.hooks, &cli.hooks) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
