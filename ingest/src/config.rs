// datadag/ingest/src/config.rs

use crate::errors::{AppError, Result};
use datadag::DEFAULT_CONN_ID;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub database_url: String,
  /// Parent of the per-dataset script directories.
  pub scripts_root: PathBuf,
  /// Parent of the per-dataset download folders.
  pub data_root: PathBuf,
  pub db_conn_id: String,
  /// JSON list of dataset descriptors; the built-in list is used when unset.
  pub datasets_file: Option<PathBuf>,
  pub slack_webhook_url: Option<String>,
  pub default_owner: String,
  pub default_email: String,
  pub abort_on_build_failure: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let optional = |var_name: &str| get_env(var_name).ok().filter(|v| !v.trim().is_empty());

    let database_url = get_env("DATABASE_URL")?;
    let scripts_root = PathBuf::from(get_env("SCRIPTS_ROOT").unwrap_or_else(|_| "dags".to_string()));
    let data_root = PathBuf::from(get_env("DATA_ROOT").unwrap_or_else(|_| "data".to_string()));
    let db_conn_id = get_env("DB_CONN_ID").unwrap_or_else(|_| DEFAULT_CONN_ID.to_string());
    let datasets_file = optional("DATASETS_FILE").map(PathBuf::from);
    let slack_webhook_url = optional("SLACK_WEBHOOK_URL");
    let default_owner = get_env("DEFAULT_OWNER").unwrap_or_else(|_| "datadag".to_string());
    let default_email = get_env("DEFAULT_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string());

    let abort_on_build_failure = get_env("ABORT_ON_BUILD_FAILURE")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid ABORT_ON_BUILD_FAILURE value: {}", e)))?;

    let log_format = match get_env("LOG_FORMAT").unwrap_or_default().to_ascii_lowercase().as_str() {
      "" | "text" | "pretty" => LogFormat::Text,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}', expected 'text' or 'json'", other))),
    };

    Ok(Self {
      database_url,
      scripts_root,
      data_root,
      db_conn_id,
      datasets_file,
      slack_webhook_url,
      default_owner,
      default_email,
      abort_on_build_failure,
      log_format,
    })
  }
}

// DATABASE_URL and the webhook carry credentials.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("database_url", &"[REDACTED]")
      .field("scripts_root", &self.scripts_root)
      .field("data_root", &self.data_root)
      .field("db_conn_id", &self.db_conn_id)
      .field("datasets_file", &self.datasets_file)
      .field("slack_webhook_configured", &self.slack_webhook_url.is_some())
      .field("default_owner", &self.default_owner)
      .field("default_email", &self.default_email)
      .field("abort_on_build_failure", &self.abort_on_build_failure)
      .field("log_format", &self.log_format)
      .finish()
  }
}
