// datadag/src/pipeline/execution.rs

//! Contains the `Pipeline::run()` method, which executes the chain for one
//! logical date with per-step retries.

use crate::core::collaborators::Collaborators;
use crate::core::context_data::RunContext;
use crate::core::control::RunSummary;
use crate::core::step::{StepDef, StepKind};
use crate::error::{DagError, DagResult};
use crate::pipeline::definition::Pipeline;
use std::path::Path;
use tracing::{event, instrument, span, Instrument, Level};

/// What one attempt of a step does, resolved before the first attempt.
enum Action<'a> {
  Download { url: String, destination: &'a Path },
  Sql { sql_text: &'a str },
}

/// A step that exhausted its attempts.
struct StepFailure {
  attempts: u32,
  error: DagError,
}

impl Pipeline {
  /// Executes every step in chain order against `collaborators`.
  ///
  /// Progress is recorded in `ctx`, which the caller keeps a clone of. When a
  /// step fails after its retries, the remaining steps are marked
  /// upstream-failed, the failure hook is called once, and the step's error
  /// is returned. Steps that already succeeded stay recorded as succeeded.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_id = %self.id,
      logical_date = %ctx.logical_date(),
      num_steps = self.graph.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: RunContext, collaborators: &Collaborators) -> DagResult<RunSummary> {
    event!(Level::DEBUG, "Pipeline run starting.");
    ctx.init_steps(self.graph.steps().iter().map(|s| s.task_id.as_str()));

    let mut total_attempts = 0;
    for (step_idx, step) in self.graph.steps().iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step_execution",
        task_id = %step.task_id,
        step_index = step_idx
      );

      match self.run_step(step, &ctx, collaborators).instrument(step_span).await {
        Ok(attempts) => total_attempts += attempts,
        Err(StepFailure { attempts, error }) => {
          let message = error.to_string();
          event!(Level::ERROR, task_id = %step.task_id, attempts, error = %message, "Step failed; halting run.");
          ctx.mark_failed(&step.task_id, &message);
          self.notify_failure(&ctx, &step.task_id, attempts, &message).await;
          return Err(error);
        }
      }
    }

    ctx.mark_run_success();
    event!(Level::INFO, total_attempts, "Pipeline run completed.");
    Ok(RunSummary {
      pipeline_id: self.id.clone(),
      logical_date: ctx.logical_date(),
      steps_completed: self.graph.len(),
      total_attempts,
    })
  }

  async fn run_step(
    &self,
    step: &StepDef,
    ctx: &RunContext,
    collaborators: &Collaborators,
  ) -> Result<u32, StepFailure> {
    let action = match &step.kind {
      StepKind::Download(task) => {
        // Rendering is deterministic for a given date, so a failure here is not retried.
        let url = task
          .url
          .render(ctx.logical_date())
          .map_err(|error| StepFailure { attempts: 0, error })?;
        ctx.set_resolved_url(&url);
        Action::Download {
          url,
          destination: &task.data_folder,
        }
      }
      StepKind::Sql(script) => Action::Sql {
        sql_text: script.sql_text.as_ref(),
      },
    };

    let retry = self.policy.retry;
    loop {
      let attempt = ctx.begin_attempt(&step.task_id);
      event!(Level::DEBUG, attempt, "Attempt starting.");

      let result = match &action {
        Action::Download { url, destination } => collaborators
          .downloader
          .retrieve(url, destination)
          .await
          .map_err(|source| DagError::DownloadError {
            url: url.clone(),
            source,
          }),
        Action::Sql { sql_text } => collaborators
          .sql
          .execute(&self.conn_id, sql_text)
          .await
          .map_err(|source| DagError::ExecutionError {
            task_id: step.task_id.clone(),
            source,
          }),
      };

      match result {
        Ok(()) => {
          ctx.mark_success(&step.task_id);
          event!(Level::DEBUG, attempt, "Step succeeded.");
          return Ok(attempt);
        }
        Err(error) if attempt <= retry.max_retries => {
          let message = error.to_string();
          event!(
            Level::WARN,
            attempt,
            max_retries = retry.max_retries,
            delay_secs = retry.retry_delay.as_secs(),
            error = %message,
            "Attempt failed; retrying after delay."
          );
          ctx.record_attempt_error(&step.task_id, &message);
          tokio::time::sleep(retry.retry_delay).await;
        }
        Err(error) => return Err(StepFailure { attempts: attempt, error }),
      }
    }
  }
}
