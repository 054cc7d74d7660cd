//! # Gading Command Line
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Load configuration (defaults → gading.toml → environment)
//! 3. Initialize tracing (stderr)
//! 4. Connect to PostgreSQL (optionally run migrations)
//! 5. Run the command, print JSON on stdout
//!
//! ## Exit Codes
//! - `0` success
//! - `2` caller error (bad arguments, validation, not found, state conflict,
//!   insufficient stock)
//! - `1` anything else

mod commands;
mod config;
mod error;

use std::process::ExitCode;

use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::{parse_args, Command, USAGE};
use config::AppConfig;
use error::CliResult;
use gading_db::Database;

#[tokio::main]
async fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    match run(&argv).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.exit_code() == 1 {
                error!(error = %err, "Command failed");
            }
            let body = json!({ "error": err.body() });
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string()));
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(argv: &[String]) -> CliResult<()> {
    let cli = parse_args(argv)?;

    if cli.command == Command::Help {
        eprintln!("{USAGE}");
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    let mut db_config = config.db_config()?;
    // `migrate` applies explicitly and reports the result
    if cli.command == Command::Migrate {
        db_config.run_migrations = false;
    }

    let db = Database::new(db_config).await?;
    let result = commands::run(&db, cli.command).await;
    db.close().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
