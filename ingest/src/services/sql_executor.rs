// datadag/ingest/src/services/sql_executor.rs

use crate::errors::Result as AppResult;
use anyhow::anyhow;
use async_trait::async_trait;
use datadag::SqlExecutor;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{event, Level};

/// Runs SQL scripts on Postgres, one pool per connection id.
///
/// Scripts are sent as-is with the simple query protocol so a file may hold
/// several statements.
#[derive(Debug, Clone, Default)]
pub struct PgSqlExecutor {
  pools: HashMap<String, PgPool>,
}

impl PgSqlExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `conn_id`. The pool connects on first use, so an unreachable
  /// database fails the SQL step rather than startup.
  pub fn with_connection(mut self, conn_id: impl Into<String>, database_url: &str) -> AppResult<Self> {
    let pool = PgPoolOptions::new().max_connections(5).connect_lazy(database_url)?;
    self.pools.insert(conn_id.into(), pool);
    Ok(self)
  }

  pub fn pool(&self, conn_id: &str) -> Option<&PgPool> {
    self.pools.get(conn_id)
  }

  pub async fn close(&self) {
    for pool in self.pools.values() {
      pool.close().await;
    }
  }
}

#[async_trait]
impl SqlExecutor for PgSqlExecutor {
  async fn execute(&self, conn_id: &str, sql_text: &str) -> anyhow::Result<()> {
    let pool = self
      .pool(conn_id)
      .ok_or_else(|| anyhow!("no database connection configured for '{}'", conn_id))?;
    let result = sqlx::raw_sql(sql_text).execute(pool).await?;
    event!(Level::DEBUG, conn_id, rows_affected = result.rows_affected(), "SQL script executed.");
    Ok(())
  }
}
