// datadag/ingest/src/main.rs

mod config;
mod datasets;
mod errors;
mod pipelines;
mod scheduler;
mod services;
mod state;

use crate::config::{AppConfig, LogFormat};
use crate::errors::Result as AppResult;
use crate::services::{HttpDownloader, LogNotifier, PgSqlExecutor, SlackNotifier};
use crate::state::AppState;

use datadag::{Collaborators, FailureNotifier, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::builder()
    .with_default_directive(Level::INFO.into())
    .from_env_lossy();
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[tokio::main]
async fn main() -> AppResult<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      // No subscriber yet; the format is part of the configuration.
      eprintln!("Failed to load application configuration: {}", e);
      return Err(e);
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(config = ?app_config, "Starting datadag ingest service...");

  let sql = PgSqlExecutor::new().with_connection(app_config.db_conn_id.clone(), &app_config.database_url)?;
  let downloader = HttpDownloader::new(DOWNLOAD_TIMEOUT)?;
  let notifier: Arc<dyn FailureNotifier> = match &app_config.slack_webhook_url {
    Some(url) => Arc::new(SlackNotifier::new(url.clone())?),
    None => {
      tracing::info!("SLACK_WEBHOOK_URL not set; failures are only logged.");
      Arc::new(LogNotifier)
    }
  };

  let registry = Arc::new(Registry::new());
  let report = pipelines::register_all_pipelines(&registry, &app_config, notifier).await?;
  tracing::info!(
    registered = report.registered.len(),
    skipped = report.failures.len(),
    "Pipelines registered."
  );

  let app_state = AppState {
    registry: registry.clone(),
    collaborators: Collaborators::new(Arc::new(downloader), Arc::new(sql.clone())),
    config: app_config.clone(),
  };

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let handles: Vec<_> = app_state
    .registry
    .pipelines()
    .into_iter()
    .map(|pipeline| scheduler::spawn(pipeline, app_state.collaborators.clone(), shutdown_rx.clone()))
    .collect();

  if handles.is_empty() {
    tracing::warn!(scripts_root = %app_state.config.scripts_root.display(), "No pipelines registered; nothing to schedule.");
  }

  tokio::signal::ctrl_c().await?;
  tracing::info!("Shutdown requested; waiting for in-flight runs.");
  let _ = shutdown_tx.send(true);
  for handle in handles {
    if let Err(e) = handle.await {
      tracing::error!(error = %e, "Scheduler task ended abnormally.");
    }
  }
  sql.close().await;
  tracing::info!("Stopped.");
  Ok(())
}
