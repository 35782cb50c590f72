//! `blogicum-admin`: manage the categories and locations the post form
//! offers, against the PostgreSQL database named by `DATABASE_URL`.
//!
//! ```text
//! blogicum-admin category add --title Travel --slug travel
//! blogicum-admin category hide travel
//! blogicum-admin location add "Lisbon"
//! blogicum-admin location list
//! ```

mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use blogicum_infra::database::{PostgresCategoryRepository, PostgresLocationRepository};
use blogicum_infra::{DatabaseConfig, DatabaseConnections};

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "blogicum-admin", version, about = "Manage Blogicum categories and locations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(mut config) = DatabaseConfig::from_env() else {
        eprintln!("error: DATABASE_URL is not set");
        return ExitCode::FAILURE;
    };
    config.max_connections = 1;
    config.min_connections = 1;

    let connections = match DatabaseConnections::init(&config).await {
        Ok(connections) => connections,
        Err(e) => {
            eprintln!("error: cannot connect to {}: {e}", config.redacted_url());
            return ExitCode::FAILURE;
        }
    };

    let categories = PostgresCategoryRepository::new(connections.main.clone());
    let locations = PostgresLocationRepository::new(connections.main);

    let mut out = std::io::stdout().lock();
    match commands::run(cli.command, &categories, &locations, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
