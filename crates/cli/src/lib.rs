pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cotiza_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Cotiza budget builder CLI",
    long_about = "Inspect configuration, preview expiration dates, explore the product catalog, \
                  and run budget scenarios against fixture data.",
    after_help = "Examples:\n  cotiza config\n  cotiza expiration --from 2024-01-01\n  \
                  cotiza catalog --resistance 200\n  cotiza build --scenario scenario.json --submit"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Compute the default valid-until date for a budget opened on a given day")]
    Expiration {
        #[arg(long, help = "Opening date (YYYY-MM-DD); defaults to today")]
        from: Option<NaiveDate>,
        #[arg(long, help = "Lead time in business days; defaults to budget.lead_business_days")]
        days: Option<u32>,
    },
    #[command(about = "List concrete categories and the products each resistance resolves to")]
    Catalog {
        #[arg(long, help = "Path to a JSON fixture dataset")]
        fixture: Option<PathBuf>,
        #[arg(long = "resistance", help = "Resistance to resolve; repeatable")]
        resistances: Vec<String>,
    },
    #[command(
        about = "Apply a JSON scenario to a builder session and report lines, validation and totals"
    )]
    Build {
        #[arg(long, help = "Path to the JSON scenario file")]
        scenario: PathBuf,
        #[arg(long, help = "Path to a JSON fixture dataset")]
        fixture: Option<PathBuf>,
        #[arg(long, help = "Submit the budget to the in-memory store after building it")]
        submit: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    logging::init(&config.logging);

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Expiration { from, days } => commands::expiration::run(from, days),
        Command::Catalog { fixture, resistances } => commands::catalog::run(fixture, resistances),
        Command::Build { scenario, fixture, submit } => {
            commands::build::run(&scenario, fixture, submit)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
