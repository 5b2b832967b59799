//! GoDam command-line entry point.

use clap::{Parser, Subcommand};
use godam_logging::{init_logging, LogConfig};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "godam",
    version,
    about = "Validate stock uploads against a live PostgreSQL table and upsert the valid rows"
)]
struct Cli {
    /// Debug-level console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an upload and ingest the accepted rows
    Validate(cli::validate::ValidateArgs),

    /// Show the introspected schema of a table
    Schema(cli::schema::SchemaArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Validate(args) => args.json,
        Commands::Schema(args) => args.json,
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Validate(args) => cli::validate::run(args),
        Commands::Schema(args) => cli::schema::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let _log_guard = match init_logging(LogConfig {
        app_name: "godam",
        verbose: cli.verbose,
        json_mode,
        file_logging: true,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
