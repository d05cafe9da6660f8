// datadag/src/policy.rs

//! Scheduling and failure policy attached to every pipeline.
//!
//! A process-wide [`PipelineDefaults`] is merged with each dataset's
//! [`PolicyOverrides`]; any field the dataset sets wins over the default.

use crate::core::collaborators::FailureNotifier;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Per-step retry behaviour. A failing step runs at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub retry_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: DEFAULT_MAX_RETRIES,
      retry_delay: DEFAULT_RETRY_DELAY,
    }
  }
}

/// Dataset-specific policy fields; `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
  pub owner: Option<String>,
  pub contact_emails: Option<Vec<String>>,
  pub max_retries: Option<u32>,
  pub retry_delay: Option<Duration>,
  /// Metadata only, as are the two flags below. See [`PipelinePolicy`].
  pub email_on_failure: Option<bool>,
  pub email_on_retry: Option<bool>,
  pub depends_on_past: Option<bool>,
  /// `Some(false)` detaches the default failure notifier from this dataset.
  pub notify_on_failure: Option<bool>,
}

/// Process-wide defaults applied to every dataset.
#[derive(Clone)]
pub struct PipelineDefaults {
  pub owner: String,
  pub contact_emails: Vec<String>,
  pub retry: RetryPolicy,
  pub email_on_failure: bool,
  pub email_on_retry: bool,
  pub depends_on_past: bool,
  /// Called once per failed run; never retried.
  pub on_failure: Option<Arc<dyn FailureNotifier>>,
}

impl PipelineDefaults {
  pub fn new(owner: impl Into<String>) -> Self {
    Self {
      owner: owner.into(),
      contact_emails: Vec::new(),
      retry: RetryPolicy::default(),
      email_on_failure: false,
      email_on_retry: false,
      depends_on_past: false,
      on_failure: None,
    }
  }

  pub fn with_contact_emails<I, S>(mut self, emails: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.contact_emails = emails.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_failure_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
    self.on_failure = Some(notifier);
    self
  }

  /// Overlays `overrides` on these defaults.
  pub fn merge(&self, overrides: &PolicyOverrides) -> PipelinePolicy {
    let notify = overrides.notify_on_failure.unwrap_or(true);
    PipelinePolicy {
      owner: overrides.owner.clone().unwrap_or_else(|| self.owner.clone()),
      contact_emails: overrides
        .contact_emails
        .clone()
        .unwrap_or_else(|| self.contact_emails.clone()),
      retry: RetryPolicy {
        max_retries: overrides.max_retries.unwrap_or(self.retry.max_retries),
        retry_delay: overrides.retry_delay.unwrap_or(self.retry.retry_delay),
      },
      email_on_failure: overrides.email_on_failure.unwrap_or(self.email_on_failure),
      email_on_retry: overrides.email_on_retry.unwrap_or(self.email_on_retry),
      depends_on_past: overrides.depends_on_past.unwrap_or(self.depends_on_past),
      on_failure: if notify { self.on_failure.clone() } else { None },
    }
  }
}

impl Default for PipelineDefaults {
  fn default() -> Self {
    Self::new("datadag")
  }
}

/// The effective policy of one pipeline.
#[derive(Clone)]
pub struct PipelinePolicy {
  pub owner: String,
  pub contact_emails: Vec<String>,
  pub retry: RetryPolicy,
  /// Metadata only. Failure delivery goes through `on_failure` alone.
  pub email_on_failure: bool,
  /// Metadata only. Retries never notify.
  pub email_on_retry: bool,
  /// Metadata only. Every run starts fresh whatever the previous run did.
  pub depends_on_past: bool,
  pub on_failure: Option<Arc<dyn FailureNotifier>>,
}

// FailureNotifier is a trait object without Debug.
impl std::fmt::Debug for PipelinePolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PipelinePolicy")
      .field("owner", &self.owner)
      .field("contact_emails", &self.contact_emails)
      .field("retry", &self.retry)
      .field("email_on_failure", &self.email_on_failure)
      .field("email_on_retry", &self.email_on_retry)
      .field("depends_on_past", &self.depends_on_past)
      .field("on_failure_present", &self.on_failure.is_some())
      .finish()
  }
}

impl std::fmt::Debug for PipelineDefaults {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PipelineDefaults")
      .field("owner", &self.owner)
      .field("contact_emails", &self.contact_emails)
      .field("retry", &self.retry)
      .field("on_failure_present", &self.on_failure.is_some())
      .finish()
  }
}
