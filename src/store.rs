//! Derived plan history
//!
//! Plans are stored as JSON snapshots keyed by athlete, newest last. The
//! derivation itself never touches the store; callers persist the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::errors::StoreError;
use crate::models::DerivedPlan;

/// Athlete key used when a profile carries no id
pub const ANONYMOUS_ATHLETE: &str = "anonymous";

/// A plan as loaded back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
  pub id: i64,
  pub athlete_id: String,
  pub config_version: String,
  pub created_at: DateTime<Utc>,
  pub plan: DerivedPlan,
}

fn athlete_key(plan: &DerivedPlan) -> &str {
  plan.athlete_id.as_deref().unwrap_or(ANONYMOUS_ATHLETE)
}

/// Persist a derived plan. Returns the new row id.
pub async fn save_plan(pool: &SqlitePool, plan: &DerivedPlan) -> Result<i64, StoreError> {
  let plan_json = serde_json::to_string(plan)?;
  let created_at = Utc::now().to_rfc3339();

  let result = sqlx::query(
    r#"
    INSERT INTO derived_plans (athlete_id, config_version, tier, total_weeks, plan_json, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
    "#,
  )
  .bind(athlete_key(plan))
  .bind(&plan.config_version)
  .bind(plan.tier.as_str())
  .bind(plan.total_weeks as i64)
  .bind(&plan_json)
  .bind(&created_at)
  .execute(pool)
  .await?;

  let id = result.last_insert_rowid();
  tracing::debug!(id, athlete = athlete_key(plan), "Saved derived plan");

  Ok(id)
}

fn row_to_stored(row: &sqlx::sqlite::SqliteRow) -> Result<StoredPlan, StoreError> {
  let plan_json: String = row.try_get("plan_json")?;
  let created_at: String = row.try_get("created_at")?;

  Ok(StoredPlan {
    id: row.try_get("id")?,
    athlete_id: row.try_get("athlete_id")?,
    config_version: row.try_get("config_version")?,
    created_at: DateTime::parse_from_rfc3339(&created_at)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
    plan: serde_json::from_str(&plan_json)?,
  })
}

/// Most recent plan for an athlete, if any
pub async fn load_latest_plan(
  pool: &SqlitePool,
  athlete_id: &str,
) -> Result<Option<StoredPlan>, StoreError> {
  let row = sqlx::query(
    r#"
    SELECT id, athlete_id, config_version, plan_json, created_at
    FROM derived_plans
    WHERE athlete_id = ?
    ORDER BY id DESC
    LIMIT 1
    "#,
  )
  .bind(athlete_id)
  .fetch_optional(pool)
  .await?;

  row.as_ref().map(row_to_stored).transpose()
}

/// All plans for an athlete, oldest first
pub async fn load_plan_history(
  pool: &SqlitePool,
  athlete_id: &str,
) -> Result<Vec<StoredPlan>, StoreError> {
  let rows = sqlx::query(
    r#"
    SELECT id, athlete_id, config_version, plan_json, created_at
    FROM derived_plans
    WHERE athlete_id = ?
    ORDER BY id ASC
    "#,
  )
  .bind(athlete_id)
  .fetch_all(pool)
  .await?;

  rows.iter().map(row_to_stored).collect()
}
