//! One-shot command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Result};
use finfraud_core::auth::{guard, GateDecision};
use finfraud_core::models::{TransactionInput, User};
use finfraud_core::{Config, Dashboard, SessionStore};
use tracing::{debug, warn};

use crate::{interactive, output, Command, PredictArgs};

pub async fn run(command: Command, mut config: Config) -> Result<()> {
    let api = config.build_api_client()?;
    debug!(api_base = api.base_url(), "API client ready");

    // Like a page load: any stored credential is revalidated before the command runs
    let mut session = SessionStore::restore(api.clone()).await;

    match command {
        Command::Login { email, password } => {
            login(&mut session, &mut config, email, password).await
        }
        Command::Signup {
            name,
            email,
            password,
        } => signup(&mut session, &name, &email, password).await,
        Command::Logout => {
            session.logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match session.user() {
                Some(user) => println!("{} (id {})", user.display_name(), user.id),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Command::Health => {
            let health = api.health().await?;
            println!("Backend {}: {}", api.base_url(), health.status);
            if let Some(ref db) = health.db {
                println!("Database: {}", db);
            }
            if !health.is_ok() {
                return Err(anyhow!("Backend is degraded"));
            }
            Ok(())
        }
        Command::Predict(args) => {
            require_user(&session)?;
            let txn = transaction_from_args(args);
            let result = Dashboard::new(api)
                .run_fraud_check(&txn)
                .await
                .map_err(|e| anyhow!("Fraud check failed: {}", e))?;
            println!("{}", output::prediction(&result));
            Ok(())
        }
        Command::Check => {
            require_user(&session)?;
            let result = Dashboard::new(api)
                .run_fraud_check(&TransactionInput::sample())
                .await
                .map_err(|e| anyhow!("Fraud check failed: {}", e))?;
            println!("{}", output::prediction(&result));
            Ok(())
        }
        Command::Recommendations { transaction_id } => {
            require_user(&session)?;
            let recs = api
                .fetch_recommendations(transaction_id)
                .await
                .map_err(|e| anyhow!("Failed to fetch recommendations: {}", e))?;
            println!("{}", output::recommendations(&recs));
            Ok(())
        }
        Command::Transaction { transaction_id } => {
            require_user(&session)?;
            let txn = api
                .fetch_transaction(transaction_id)
                .await
                .map_err(|e| anyhow!("Failed to fetch transaction: {}", e))?;
            println!("{}", output::pretty_json(&txn)?);
            Ok(())
        }
        Command::Chain => {
            require_user(&session)?;
            let block = api
                .fetch_latest_block()
                .await
                .map_err(|e| anyhow!("Failed to fetch chain: {}", e))?;
            println!("{}", output::ledger_block(&block));
            Ok(())
        }
        Command::Risk { external_id } => {
            require_user(&session)?;
            let risk = api.fetch_user_risk(&external_id).await?;
            println!("{}", output::user_risk(&risk));
            Ok(())
        }
        Command::Dashboard => {
            require_user(&session)?;
            interactive::run(&mut session).await
        }
    }
}

/// Pass the route gate or explain how to get through it
pub fn require_user(session: &SessionStore) -> Result<&User> {
    match guard(session) {
        GateDecision::Render(user) => Ok(user),
        GateDecision::Redirect(route) => Err(anyhow!(
            "Not signed in (redirected to {}). Run `finfraud login` first.",
            route.path()
        )),
    }
}

fn transaction_from_args(args: PredictArgs) -> TransactionInput {
    let base = TransactionInput::new(args.amount);
    TransactionInput {
        user_external_id: args.sender,
        merchant_id: args.receiver,
        location: Some(args.location),
        currency: Some(args.currency),
        device_risk_score: args.device_risk_score.or(base.device_risk_score),
        ..base
    }
}

async fn login(
    session: &mut SessionStore,
    config: &mut Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = resolve_password(password)?;

    let established = session
        .login(&email, &password)
        .await
        .map_err(|e| anyhow!("Login failed: {}", output::auth_error_message(&e)))?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if let Some(ref user) = established.user {
        println!("{}", output::welcome(user));
    }
    Ok(())
}

async fn signup(
    session: &mut SessionStore,
    name: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;

    let outcome = session
        .signup(name, email, password.as_str())
        .await
        .map_err(|e| anyhow!("Signup failed: {}", output::auth_error_message(&e)))?;

    match outcome.session.user {
        Some(ref user) if outcome.authenticated() => println!("{}", output::welcome(user)),
        _ => {
            println!("Account created. Sign in with `finfraud login --email {}`.", email);
            println!("{}", output::pretty_json(&outcome.response)?);
        }
    }
    Ok(())
}

fn resolve_password(password: Option<String>) -> Result<String> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Ok(rpassword::prompt_password("Password: ")?),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let input = input.trim().to_string();
    if input.is_empty() {
        return Err(anyhow!("{} is required", label.trim_end_matches([':', ' '])));
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_from_args() {
        let args = PredictArgs {
            amount: 2500.0,
            sender: Some("AMZ".to_string()),
            receiver: Some("Shop".to_string()),
            location: "Delhi".to_string(),
            currency: "INR".to_string(),
            device_risk_score: None,
        };
        let txn = transaction_from_args(args);
        assert_eq!(txn.amount, 2500.0);
        assert_eq!(txn.user_external_id.as_deref(), Some("AMZ"));
        assert_eq!(txn.merchant_id.as_deref(), Some("Shop"));
        assert_eq!(txn.location.as_deref(), Some("Delhi"));
        assert_eq!(txn.device_risk_score, Some(0.1));
        assert!(txn.external_txn_id.is_some());
    }

    #[test]
    fn test_transaction_from_args_risk_override() {
        let args = PredictArgs {
            amount: 1.0,
            sender: None,
            receiver: None,
            location: "EU".to_string(),
            currency: "EUR".to_string(),
            device_risk_score: Some(0.95),
        };
        let txn = transaction_from_args(args);
        assert_eq!(txn.device_risk_score, Some(0.95));
        assert_eq!(txn.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_require_user_redirects_anonymous() {
        let store = std::sync::Arc::new(finfraud_core::auth::MemoryTokenStore::new());
        let api = finfraud_core::ApiClient::new("http://127.0.0.1:1", store).unwrap();
        let session = SessionStore::new(api);

        let err = require_user(&session).unwrap_err();
        assert!(err.to_string().contains("finfraud login"));
    }
}
