// datadag/ingest/src/errors.rs

use datadag::DagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Invalid dataset list '{path}': {message}")]
  Datasets { path: String, message: String },

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("HTTP Error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Pipeline Error: {source}")]
  Pipeline {
    #[from]
    source: DagError,
  },
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
