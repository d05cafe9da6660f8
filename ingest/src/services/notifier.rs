// datadag/ingest/src/services/notifier.rs

use crate::errors::Result as AppResult;
use async_trait::async_trait;
use datadag::{FailureContext, FailureNotifier};
use serde_json::json;
use std::time::Duration;
use tracing::{event, Level};

/// Posts failed runs to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackNotifier {
  client: reqwest::Client,
  webhook_url: String,
}

impl SlackNotifier {
  pub fn new(webhook_url: impl Into<String>) -> AppResult<Self> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self {
      client,
      webhook_url: webhook_url.into(),
    })
  }
}

pub fn failure_message(context: &FailureContext) -> String {
  format!(
    ":red_circle: Task Failed.\n*Pipeline*: {}\n*Task*: {}\n*Logical Date*: {}\n*Attempts*: {}\n*Owner*: {}\n*Error*: {}",
    context.pipeline_id,
    context.task_id,
    context.logical_date.format("%Y-%m-%dT%H:%M:%SZ"),
    context.attempts,
    context.owner,
    context.error
  )
}

#[async_trait]
impl FailureNotifier for SlackNotifier {
  async fn notify(&self, pipeline_id: &str, context: &FailureContext) -> anyhow::Result<()> {
    self
      .client
      .post(&self.webhook_url)
      .json(&json!({ "text": failure_message(context) }))
      .send()
      .await?
      .error_for_status()?;
    event!(Level::DEBUG, pipeline_id, "Slack alert posted.");
    Ok(())
  }
}

// The webhook URL is a secret.
impl std::fmt::Debug for SlackNotifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SlackNotifier").finish_non_exhaustive()
  }
}

/// Used when no webhook is configured: the failure only goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl FailureNotifier for LogNotifier {
  async fn notify(&self, pipeline_id: &str, context: &FailureContext) -> anyhow::Result<()> {
    event!(
      Level::ERROR,
      pipeline_id,
      task_id = %context.task_id,
      logical_date = %context.logical_date,
      attempts = context.attempts,
      owner = %context.owner,
      contacts = ?context.contact_emails,
      error = %context.error,
      "Pipeline run failed."
    );
    Ok(())
  }
}
