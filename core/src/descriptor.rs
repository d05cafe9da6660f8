// datadag/src/descriptor.rs

//! Static declaration of one dataset.

use crate::error::{DagError, DagResult};
use crate::policy::PolicyOverrides;
use serde::Deserialize;
use std::time::Duration;

/// Identity, source, schedule and policy overrides for one dataset.
///
/// Deserializes from the descriptor wire format:
///
/// ```json
/// { "id": "orange_book", "schedule": "15 0 24 1 *",
///   "sourceUrl": "https://www.fda.gov/media/76860/download",
///   "retries": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatasetDescriptor {
  pub id: String,
  pub schedule: String,
  pub source_url: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub owner: Option<String>,
  #[serde(default)]
  pub contact_emails: Option<Vec<String>>,
  #[serde(default)]
  pub retries: Option<u32>,
  #[serde(default)]
  pub retry_delay_seconds: Option<u64>,
  /// Metadata only, kept on the pipeline for operators to read.
  #[serde(default)]
  pub email_on_failure: Option<bool>,
  /// Metadata only.
  #[serde(default)]
  pub email_on_retry: Option<bool>,
  /// Metadata only. Runs never wait on or inspect earlier runs.
  #[serde(default)]
  pub depends_on_past: Option<bool>,
  #[serde(default)]
  pub notify_on_failure: Option<bool>,
}

impl DatasetDescriptor {
  pub fn new(id: impl Into<String>, schedule: impl Into<String>, source_url: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      schedule: schedule.into(),
      source_url: source_url.into(),
      description: None,
      owner: None,
      contact_emails: None,
      retries: None,
      retry_delay_seconds: None,
      email_on_failure: None,
      email_on_retry: None,
      depends_on_past: None,
      notify_on_failure: None,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
    self.owner = Some(owner.into());
    self
  }

  pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
    self.retries = Some(retries);
    self.retry_delay_seconds = Some(delay.as_secs());
    self
  }

  pub fn without_failure_notification(mut self) -> Self {
    self.notify_on_failure = Some(false);
    self
  }

  /// Human readable description, `"Processes <id> source"` unless set.
  pub fn description(&self) -> String {
    self
      .description
      .clone()
      .unwrap_or_else(|| format!("Processes {} source", self.id))
  }

  pub fn overrides(&self) -> PolicyOverrides {
    PolicyOverrides {
      owner: self.owner.clone(),
      contact_emails: self.contact_emails.clone(),
      max_retries: self.retries,
      retry_delay: self.retry_delay_seconds.map(Duration::from_secs),
      email_on_failure: self.email_on_failure,
      email_on_retry: self.email_on_retry,
      depends_on_past: self.depends_on_past,
      notify_on_failure: self.notify_on_failure,
    }
  }

  /// The id names directories on disk: non-empty, ASCII alphanumerics, `_` and `-` only.
  pub fn validate_id(&self) -> DagResult<()> {
    if self.id.is_empty() {
      return Err(DagError::config("", "dataset id must not be empty"));
    }
    if let Some(bad) = self
      .id
      .chars()
      .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
      return Err(DagError::config(
        self.id.clone(),
        format!("dataset id contains invalid character {:?}", bad),
      ));
    }
    Ok(())
  }
}
