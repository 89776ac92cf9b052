use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;

use crate::errors::StoreError;

pub type DbPool = SqlitePool;

/// Initialize the plan store connection pool and run migrations.
/// Parent directories of `db_path` are created when missing.
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, StoreError> {
  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
  tracing::info!(path = %db_path.display(), "Initializing plan store");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Plan store ready");

  Ok(pool)
}
