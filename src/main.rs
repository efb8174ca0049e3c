//! Agave CLI - run the per-turn pass and inspect its stored state.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Agave - a once-per-turn cactus scoring engine
#[derive(Parser, Debug)]
#[command(name = "agave")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one host pass over a game directory
    Host {
        /// Game directory
        dir: PathBuf,

        /// Write the referee and score summary files
        #[arg(short, long)]
        integrate: bool,

        /// Suppress the result summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the stored add-on state
    DumpState {
        /// Game directory
        dir: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Print the effective configuration
    DumpConfig {
        /// Game directory
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let result = match args.command {
        Commands::Host {
            dir,
            integrate,
            quiet,
        } => cli::host::execute(&dir, integrate, quiet),
        Commands::DumpState { dir, format } => cli::dump::state(&dir, format),
        Commands::DumpConfig { dir } => cli::dump::config(&dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
