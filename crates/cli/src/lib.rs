pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "medicord",
    about = "Medicord operator CLI",
    long_about = "Operate the Medicord catalog: migrations, seed data, config inspection, readiness checks, and offline interaction and substitute lookups.",
    after_help = "Examples:\n  medicord doctor --json\n  medicord seed\n  medicord check seed-ecosprin-75 seed-warf-5\n  medicord substitutes seed-dolo-650"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the reference medicine catalog (idempotent) and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, schema and catalog contents")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Check a set of catalog medicines for interactions and shared ingredients")]
    Check {
        #[arg(required = true, value_name = "MEDICINE_ID")]
        medicine_ids: Vec<String>,
    },
    #[command(about = "Rank substitutes for one catalog medicine")]
    Substitutes {
        #[arg(value_name = "MEDICINE_ID")]
        medicine_id: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Check { medicine_ids } => commands::check::run(&medicine_ids),
        Command::Substitutes { medicine_id } => commands::substitutes::run(&medicine_id),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
