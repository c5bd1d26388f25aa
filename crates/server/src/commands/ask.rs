//! Ask command handler.
//!
//! Runs the answering pipeline once and prints the answer to stdout.

use crate::http::contract::AssistResponse;
use anyhow::Context;
use assist_core::config::AppConfig;
use assist_knowledge::{AnswerResult, Assistant};
use clap::Args;

/// Answer a single query and exit
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Print the answer as JSON (same shape as the HTTP response)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        let assistant = Assistant::from_config(config)
            .await
            .context("failed to initialize the answering pipeline")?;

        let result = assistant.answer(&self.query).await;

        if let Err(e) = assistant.shutdown().await {
            tracing::warn!("Failed to release chat model: {}", e);
        }

        let answer = result.context("failed to answer the query")?;
        println!("{}", self.render(answer)?);
        Ok(())
    }

    fn render(&self, answer: AnswerResult) -> anyhow::Result<String> {
        if self.json {
            return serde_json::to_string_pretty(&AssistResponse::from(answer))
                .context("failed to serialize the answer");
        }

        let mut output = answer.text;
        if !answer.links.is_empty() {
            output.push_str("\n\nLinks:");
            for link in &answer.links {
                output.push_str("\n- ");
                output.push_str(link);
            }
        }
        Ok(output)
    }
}
