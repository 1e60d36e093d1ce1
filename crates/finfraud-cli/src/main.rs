//! FinFraud CLI - a command-line client for the FinFraud fraud detection
//! service.
//!
//! Each invocation is one "page load": a stored credential is revalidated
//! before the command runs, and protected commands only run for a signed-in
//! user.

mod commands;
mod interactive;
mod output;

use std::io;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use finfraud_core::models::KNOWN_LOCATIONS;
use finfraud_core::Config;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside the configured log directory
const LOG_FILE_NAME: &str = "finfraud.log";

#[derive(Parser, Debug)]
#[command(name = "finfraud", version, about = "FinFraud fraud detection client")]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the credential
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "FINFRAUD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINFRAUD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored credential
    Logout,
    /// Show who is signed in
    Whoami,
    /// Check that the backend is reachable
    Health,
    /// Score a transaction
    Predict(PredictArgs),
    /// Score a randomized sample transaction
    Check,
    /// Show recommendations for a transaction
    Recommendations { transaction_id: i64 },
    /// Show a transaction with its fraud result
    Transaction { transaction_id: i64 },
    /// Show the latest audit ledger block
    Chain,
    /// Show the accumulated risk score of a user
    Risk { external_id: String },
    /// Interactive dashboard
    Dashboard,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long)]
    pub amount: f64,
    /// Sender (user external id)
    #[arg(long)]
    pub sender: Option<String>,
    /// Receiver (merchant id)
    #[arg(long)]
    pub receiver: Option<String>,
    #[arg(long, default_value = "Pune", value_parser = clap::builder::PossibleValuesParser::new(KNOWN_LOCATIONS))]
    pub location: String,
    #[arg(long, default_value = "INR")]
    pub currency: String,
    #[arg(long)]
    pub device_risk_score: Option<f64>,
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (default `warn`). When the config names a
/// log directory, events are also written to a daily rolling file there; the
/// returned guard must be held until exit so buffered lines are flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(base) = cli.api_base {
        config = config.with_api_base(base);
    }

    let _log_guard = init_tracing(&config);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(api_base = %config.api_base(), "FinFraud CLI starting");

    commands::run(cli.command, config).await
}
