//! Handler for `attempts list`.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::AttemptsListArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::Attempt;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct AttemptRow {
    #[tabled(rename = "Participant")]
    participant: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

impl From<&Attempt> for AttemptRow {
    fn from(attempt: &Attempt) -> Self {
        let endpoint = if attempt.is_bound() {
            format!("{}:{}", attempt.ip_address, attempt.port)
        } else {
            "-".to_string()
        };
        Self {
            participant: attempt.participant.clone(),
            token: attempt.token.to_string(),
            endpoint,
        }
    }
}

/// List a challenge's attempts. Private keys are never printed.
pub async fn list(args: &AttemptsListArgs) -> Result<()> {
    let config = Config::load(&args.config.config)?;
    let store = bootstrap::build_store(&config.store)?;
    let attempts = store.list_attempts(&args.creator, &args.challenge).await?;

    if output::is_json() {
        let rows: Vec<_> = attempts
            .iter()
            .map(|a| {
                json!({
                    "participant": a.participant,
                    "token": a.token,
                    "ipaddress": a.ip_address,
                    "port": a.port,
                    "started": a.is_bound(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "attempts.list",
            "creator": args.creator,
            "challenge": args.challenge,
            "attempts": rows,
        }));
        return Ok(());
    }

    output::section(&format!("{}/{}", args.creator, args.challenge));
    if attempts.is_empty() {
        output::warning("No attempts recorded");
        return Ok(());
    }
    let rows: Vec<AttemptRow> = attempts.iter().map(AttemptRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
