//! Interactive driver for the intake engine.
//!
//! Runs the full conversation graph against a deterministic rule-based
//! classifier instead of a live LLM, so flows can be exercised offline:
//!
//! ```text
//! cargo run -p greenroom-cli
//! ```
//!
//! Commands: `/summary` prints the progress summary, `/state` dumps the
//! blob, `/quit` exits.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::info;

use greenroom_core::EngineConfig;
use greenroom_sessions::{ConversationService, ProcessRequest};

mod rules;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greenroom=warn".into()),
        )
        .init();

    let config = EngineConfig::load(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        EngineConfig::default()
    });

    let service = ConversationService::new(Arc::new(rules::RuleProvider), None, config);
    let session_id = "local";

    println!("greenroom intake (offline rule-based classifier)");
    println!("{}", service.initial_greeting());

    let stdin = std::io::stdin();
    let mut last_blob: Option<String> = None;

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" => break,
            "/summary" => {
                if let Some(blob) = &last_blob {
                    let summary = service.summary(blob)?;
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!("No conversation yet.");
                }
                continue;
            }
            "/state" => {
                println!("{}", last_blob.as_deref().unwrap_or("{}"));
                continue;
            }
            _ => {}
        }

        let outcome = service
            .process_message(ProcessRequest {
                session_id: session_id.to_string(),
                person_id: 1.into(),
                campaign_id: "local-demo".into(),
                message: line.to_string(),
                prior_state: last_blob.clone(),
            })
            .await;

        println!("{}", outcome.reply);
        info!(
            completion = outcome.summary.completion_percentage,
            filled = outcome.summary.filled_count,
            "turn"
        );
        last_blob = Some(outcome.state_blob);
    }

    Ok(())
}
