// datadag/src/pipeline/hooks.rs

//! Failure notification for a pipeline run.
//!
//! The hook fires once per failed run, after retries are exhausted, never
//! once per attempt. It is never retried and its own failure is swallowed so
//! the step error stays the reported cause.

use crate::core::collaborators::FailureContext;
use crate::core::context_data::RunContext;
use crate::error::DagError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, Level};

impl Pipeline {
  pub(crate) fn failure_context(&self, ctx: &RunContext, task_id: &str, attempts: u32, error: &str) -> FailureContext {
    FailureContext {
      pipeline_id: self.id.clone(),
      task_id: task_id.to_string(),
      logical_date: ctx.logical_date(),
      attempts,
      error: error.to_string(),
      owner: self.policy.owner.clone(),
      contact_emails: self.policy.contact_emails.clone(),
    }
  }

  /// Calls the failure hook, if any. Returns whether a notification was delivered.
  pub(crate) async fn notify_failure(&self, ctx: &RunContext, task_id: &str, attempts: u32, error: &str) -> bool {
    let Some(notifier) = self.policy.on_failure.clone() else {
      event!(Level::DEBUG, "No failure hook configured.");
      return false;
    };

    let context = self.failure_context(ctx, task_id, attempts, error);
    match notifier.notify(&self.id, &context).await {
      Ok(()) => {
        event!(Level::INFO, task_id, "Failure notification sent.");
        true
      }
      Err(source) => {
        let err = DagError::NotificationError {
          pipeline_id: self.id.clone(),
          source,
        };
        event!(Level::WARN, error = %err, "Failure notification could not be delivered.");
        false
      }
    }
  }
}
