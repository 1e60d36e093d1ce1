//! Interactive dashboard.
//!
//! Each prompt is a render pass: the route gate is consulted before it is
//! drawn, so signing out (or a refresh that invalidates the session) returns
//! to the public entry on the very next pass.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use finfraud_core::auth::{guard, GateDecision};
use finfraud_core::models::TransactionInput;
use finfraud_core::{Dashboard, SessionStore};
use tracing::debug;

use crate::output;

const HELP: &str = "\
Commands:
  check      run a fraud check on a sample transaction
  txn        show the last transaction
  recs       show recommendations for the last transaction
  overview   show the last transaction with its recommendations
  chain      show the latest audit ledger block
  refresh    revalidate the session
  logout     sign out
  help       show this help
  quit       leave the dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
enum DashboardCommand {
    Check,
    Transaction,
    Recommendations,
    Overview,
    Chain,
    Refresh,
    Logout,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl DashboardCommand {
    fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "" => DashboardCommand::Empty,
            "check" | "c" => DashboardCommand::Check,
            "txn" | "transaction" | "t" => DashboardCommand::Transaction,
            "recs" | "recommendations" | "r" => DashboardCommand::Recommendations,
            "overview" | "o" => DashboardCommand::Overview,
            "chain" => DashboardCommand::Chain,
            "refresh" => DashboardCommand::Refresh,
            "logout" => DashboardCommand::Logout,
            "help" | "?" | "h" => DashboardCommand::Help,
            "quit" | "exit" | "q" => DashboardCommand::Quit,
            _ => DashboardCommand::Unknown(input.trim().to_string()),
        }
    }
}

pub async fn run(session: &mut SessionStore) -> Result<()> {
    let mut dashboard = Dashboard::new(session.api().clone());
    let stdin = io::stdin();
    let mut greeted = false;

    loop {
        let user = match guard(&*session) {
            GateDecision::Render(user) => user.clone(),
            GateDecision::Redirect(route) => {
                println!("Signed out. Returning to {}.", route.path());
                return Ok(());
            }
        };

        if !greeted {
            println!("{}", output::welcome(&user));
            println!("Type `help` for commands.");
            greeted = true;
        }

        print!("{}> ", user.display_name());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            println!();
            return Ok(());
        }

        let command = DashboardCommand::parse(&line);
        debug!(?command, "Dashboard command");

        match command {
            DashboardCommand::Check => {
                match dashboard.run_fraud_check(&TransactionInput::sample()).await {
                    Ok(result) => println!("{}", output::prediction(&result)),
                    Err(e) => println!("Fraud check failed: {}", e),
                }
            }
            DashboardCommand::Transaction => match dashboard.transaction().await {
                Ok(txn) => println!("{}", output::pretty_json(&txn)?),
                Err(e) => println!("Failed to fetch transaction: {}", e),
            },
            DashboardCommand::Recommendations => match dashboard.recommendations().await {
                Ok(recs) => println!("{}", output::recommendations(&recs)),
                Err(e) => println!("Failed to fetch recommendations: {}", e),
            },
            DashboardCommand::Overview => match dashboard.overview().await {
                Ok(overview) => {
                    println!("{}", output::pretty_json(&overview.transaction)?);
                    println!("{}", output::recommendations(&overview.recommendations));
                }
                Err(e) => println!("Failed to fetch overview: {}", e),
            },
            DashboardCommand::Chain => match dashboard.latest_block().await {
                Ok(block) => println!("{}", output::ledger_block(&block)),
                Err(e) => println!("Failed to fetch chain: {}", e),
            },
            DashboardCommand::Refresh => session.refresh_user().await,
            DashboardCommand::Logout => session.logout(),
            DashboardCommand::Help => println!("{}", HELP),
            DashboardCommand::Quit => return Ok(()),
            DashboardCommand::Empty => {}
            DashboardCommand::Unknown(input) => {
                println!("Unknown command '{}'. Type `help` for commands.", input)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(DashboardCommand::parse("check"), DashboardCommand::Check);
        assert_eq!(DashboardCommand::parse("  RECS \n"), DashboardCommand::Recommendations);
        assert_eq!(DashboardCommand::parse("txn"), DashboardCommand::Transaction);
        assert_eq!(DashboardCommand::parse("o"), DashboardCommand::Overview);
        assert_eq!(DashboardCommand::parse("logout"), DashboardCommand::Logout);
        assert_eq!(DashboardCommand::parse("exit"), DashboardCommand::Quit);
        assert_eq!(DashboardCommand::parse("\n"), DashboardCommand::Empty);
    }

    #[test]
    fn test_parse_unknown_keeps_input() {
        assert_eq!(
            DashboardCommand::parse(" launch rockets "),
            DashboardCommand::Unknown("launch rockets".to_string())
        );
    }
}
