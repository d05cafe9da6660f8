// datadag/ingest/src/scheduler.rs

//! Cron-driven triggering. Each pipeline gets one task that sleeps until the
//! next tick and runs the pipeline for it; runs of one pipeline never overlap.

use chrono::{DateTime, Utc};
use datadag::{Collaborators, CronSchedule, Pipeline, RunContext};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{event, Instrument, Level};

/// Spawns the trigger loop for `pipeline`. The loop exits when `shutdown`
/// flips to `true`; a run in flight is finished first.
pub fn spawn(pipeline: Arc<Pipeline>, collaborators: Collaborators, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
  let span = tracing::info_span!("scheduler", pipeline_id = %pipeline.id());
  tokio::spawn(trigger_loop(pipeline, collaborators, shutdown).instrument(span))
}

async fn trigger_loop(pipeline: Arc<Pipeline>, collaborators: Collaborators, mut shutdown: watch::Receiver<bool>) {
  loop {
    let now = Utc::now();
    let Some(tick) = pipeline.schedule().next_after(&now) else {
      event!(Level::WARN, schedule = %pipeline.schedule(), "Schedule has no future trigger; stopping.");
      return;
    };
    let wait = (tick - now).to_std().unwrap_or_default();
    event!(Level::INFO, next_run = %tick, wait_secs = wait.as_secs(), "Waiting for next trigger.");

    tokio::select! {
      _ = tokio::time::sleep(wait) => {}
      _ = shutdown.changed() => {
        event!(Level::INFO, "Scheduler stopping.");
        return;
      }
    }
    if *shutdown.borrow() {
      return;
    }

    let logical_date = logical_date_for(pipeline.schedule(), tick);
    let ctx = RunContext::new(pipeline.id(), logical_date);
    match pipeline.run(ctx.clone(), &collaborators).await {
      Ok(summary) => event!(
        Level::INFO,
        logical_date = %summary.logical_date,
        steps = summary.steps_completed,
        attempts = summary.total_attempts,
        "Scheduled run succeeded."
      ),
      Err(error) => event!(
        Level::ERROR,
        pipeline_id = %ctx.pipeline_id(),
        logical_date = %ctx.logical_date(),
        fired_at = %tick,
        failed_task = ?ctx.read().failed_task,
        %error,
        "Scheduled run failed."
      ),
    }
  }
}

/// A run fired at `tick` covers the interval that started at the previous
/// tick, and that start is its logical date. The first tick of a schedule
/// with no earlier trigger stands for itself.
fn logical_date_for(schedule: &CronSchedule, tick: DateTime<Utc>) -> DateTime<Utc> {
  schedule.previous_before(&tick).unwrap_or(tick)
}
