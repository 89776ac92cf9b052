//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Profile factories
//! - Date helpers

use crate::models::{
  AthleteProfile, Day, DayAvailability, EquipmentTier, ExperienceLevel, GoalType,
  StrengthInterest, TimeSlot, WeeklyHoursRange,
};
use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Fixed "today" used by derivation tests
pub const TODAY: (i32, u32, u32) = (2026, 10, 16);

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Profile Factories
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Build an availability map from (day, slot, minutes) triples.
/// Days not listed are left out and read as unavailable.
pub fn availability(days: &[(Day, TimeSlot, u32)]) -> BTreeMap<Day, DayAvailability> {
  days
    .iter()
    .map(|(day, slot, minutes)| (*day, DayAvailability::available(*slot, *minutes)))
    .collect()
}

/// Profile with every day available, no event and no injuries
pub fn make_profile(
  experience_level: ExperienceLevel,
  hours: (f64, f64),
  goal_type: GoalType,
) -> AthleteProfile {
  AthleteProfile {
    athlete_id: Some("test-athlete".to_string()),
    experience_level,
    weekly_hours_range: WeeklyHoursRange::new(hours.0, hours.1),
    goal_type,
    target_event_date: None,
    availability: availability(&[
      (Day::Monday, TimeSlot::Am, 60),
      (Day::Tuesday, TimeSlot::Pm, 90),
      (Day::Wednesday, TimeSlot::Am, 60),
      (Day::Thursday, TimeSlot::Pm, 90),
      (Day::Friday, TimeSlot::Pm, 60),
      (Day::Saturday, TimeSlot::Am, 180),
      (Day::Sunday, TimeSlot::Am, 120),
    ]),
    equipment_tier: EquipmentTier::FullGym,
    injury_exclusions_input: Vec::new(),
    has_current_injury: false,
    strength_interest: StrengthInterest::Eager,
    preferred_long_day: None,
  }
}

/// Advanced racer, 9-12 hours, event 24 weeks out, six training days
pub fn scenario_profile(today: NaiveDate) -> AthleteProfile {
  let mut profile = make_profile(ExperienceLevel::Advanced, (9.0, 12.0), GoalType::SpecificRace);
  profile.target_event_date = Some(today + Duration::weeks(24));
  profile.availability = availability(&[
    (Day::Tuesday, TimeSlot::Pm, 90),
    (Day::Wednesday, TimeSlot::Am, 60),
    (Day::Thursday, TimeSlot::Pm, 90),
    (Day::Friday, TimeSlot::Pm, 45),
    (Day::Saturday, TimeSlot::Am, 240),
    (Day::Sunday, TimeSlot::Both, 120),
  ]);
  profile
}
