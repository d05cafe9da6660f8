// datadag/ingest/src/state.rs
use crate::config::AppConfig;
use datadag::{Collaborators, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub registry: Arc<Registry>,
  pub collaborators: Collaborators,
  pub config: Arc<AppConfig>,
}
