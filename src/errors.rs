//! Error types for plan derivation
//!
//! Every failure is a returned value. The engine is used for batch runs where
//! some profiles fail individually, so nothing in here is meant to abort.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ---------------------------------------------------------------------------
/// Schedule Infeasibility
/// ---------------------------------------------------------------------------

/// A plan cannot be built for this profile. Each variant names the failing
/// constraint and carries the numeric shortfall.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ScheduleInfeasible {
  #[error("event date in the past: {event_date} is before {today}")]
  EventInPast {
    event_date: NaiveDate,
    today: NaiveDate,
  },

  #[error("event too near: {weeks_until_event} weeks until event, need at least {min_weeks} (short by {shortfall})")]
  EventTooSoon {
    weeks_until_event: u32,
    min_weeks: u32,
    shortfall: u32,
  },

  #[error("plan too short: {total_weeks} weeks cannot hold {required_weeks} minimum phase weeks (short by {shortfall})")]
  PlanTooShort {
    total_weeks: u32,
    required_weeks: u32,
    shortfall: u32,
  },

  #[error("insufficient availability: {required} key sessions required but only {available} usable days (short by {shortfall})")]
  InsufficientAvailability {
    required: u32,
    available: u32,
    shortfall: u32,
  },
}

impl ScheduleInfeasible {
  /// Numeric gap between what the constraint needs and what the profile offers.
  /// For a past event this is the number of days since the event.
  pub fn shortfall(&self) -> u32 {
    match self {
      Self::EventInPast { event_date, today } => {
        (*today - *event_date).num_days().max(0) as u32
      }
      Self::EventTooSoon { shortfall, .. }
      | Self::PlanTooShort { shortfall, .. }
      | Self::InsufficientAvailability { shortfall, .. } => *shortfall,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Configuration Errors
/// ---------------------------------------------------------------------------

/// Malformed derivation config. Fatal at startup, never raised per profile.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ConfigError {
  #[error("Failed to read config: {0}")]
  Io(String),

  #[error("Failed to parse config: {0}")]
  Parse(String),

  #[error("Invalid config: {0}")]
  Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
  fn from(e: serde_json::Error) -> Self {
    ConfigError::Parse(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Plan Errors
/// ---------------------------------------------------------------------------

/// Top-level failure of `derive_plan`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Infeasible(#[from] ScheduleInfeasible),
}

/// ---------------------------------------------------------------------------
/// Intake Errors
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum IntakeError {
  #[error("Missing required field: {0}")]
  MissingField(String),

  #[error("Invalid value for {field}: {value}")]
  InvalidValue { field: String, value: String },
}

impl IntakeError {
  pub(crate) fn invalid(field: &str, value: impl Into<String>) -> Self {
    IntakeError::InvalidValue {
      field: field.to_string(),
      value: value.into(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Store Errors
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_event_in_past_message_and_shortfall() {
    let err = ScheduleInfeasible::EventInPast {
      event_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
      today: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    };
    assert!(err.to_string().starts_with("event date in the past"));
    assert_eq!(err.shortfall(), 1);
  }

  #[test]
  fn test_infeasible_serializes_with_reason_tag() {
    let err = ScheduleInfeasible::InsufficientAvailability {
      required: 3,
      available: 1,
      shortfall: 2,
    };
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["reason"], "insufficient_availability");
    assert_eq!(json["shortfall"], 2);
  }

  #[test]
  fn test_plan_error_wraps_config_error() {
    let err: PlanError = ConfigError::Invalid("phase split sums to 90".into()).into();
    assert_eq!(err.to_string(), "Invalid config: phase split sums to 90");
  }
}
