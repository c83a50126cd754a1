//! Armada CLI - Command-line interface for compiling and driving scenarios.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Armada - a declarative scenario rule engine
#[derive(Parser, Debug)]
#[command(name = "armada")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile scenario packages and report every failure
    Validate {
        /// Scenario package directories (1 or more)
        #[arg(required = true, num_args = 1..)]
        packages: Vec<std::path::PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Compile one package and print the scenario it describes
    Inspect {
        /// Scenario package directory
        #[arg(required = true)]
        package: std::path::PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Compile a package and drive it with a script of triggers
    Simulate {
        /// Scenario package directory
        #[arg(required = true)]
        package: std::path::PathBuf,

        /// Script file: a JSON array of trigger entries
        #[arg(required = true)]
        script: std::path::PathBuf,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Action budget per trigger (default: 1000)
        #[arg(short, long, default_value = "1000")]
        budget: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress step-by-step output
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Validate {
            packages,
            format,
            progress,
        } => cli::validate::execute(packages, format, progress),

        Commands::Inspect { package, format } => cli::inspect::execute(&package, format),

        Commands::Simulate {
            package,
            script,
            seed,
            budget,
            format,
            quiet,
        } => cli::simulate::execute(&package, &script, seed, budget, format, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
