//! Plan derivation entry point
//!
//! Classifier -> phase planner -> weekly structure builder, run once per
//! immutable profile snapshot. No I/O and no shared mutable state, so any
//! number of derivations can run concurrently against one `PlanEngine`.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::classifier::{
  classify_tier, plan_length, screen_injuries, session_requirements, starting_phase,
};
use crate::config::DerivationConfig;
use crate::errors::{ConfigError, PlanError, ScheduleInfeasible};
use crate::models::{AthleteProfile, DerivedPlan};
use crate::phases::{build_timeline, strength_blocks};
use crate::weekly::build_weekly_structure;

/// Derive a plan as of today's UTC date. Validates the config first.
pub fn derive_plan(
  profile: &AthleteProfile,
  config: &DerivationConfig,
) -> Result<DerivedPlan, PlanError> {
  config.validate()?;
  Ok(derive_plan_as_of(profile, config, Utc::now().date_naive())?)
}

/// Deterministic core: same profile, config and date always give the same plan.
/// Assumes `config` has passed validation.
pub fn derive_plan_as_of(
  profile: &AthleteProfile,
  config: &DerivationConfig,
  today: NaiveDate,
) -> Result<DerivedPlan, ScheduleInfeasible> {
  let tier = classify_tier(
    profile.experience_level,
    &profile.weekly_hours_range,
    profile.goal_type,
    &config.tier_bands,
  );
  let starting_phase = starting_phase(profile);
  let total_weeks = plan_length(profile.target_event_date, today, &config.plan_length)?;

  tracing::debug!(
    athlete = profile.athlete_id.as_deref().unwrap_or("-"),
    %tier,
    %starting_phase,
    total_weeks,
    "Profile classified"
  );

  let tier_requirements = config.tier(tier);
  let requirements = session_requirements(tier, profile.strength_interest, config);

  let timeline = build_timeline(
    total_weeks,
    starting_phase,
    &config.phase_split,
    tier_requirements.min_phase_weeks,
  )?;
  let weekly_structure = build_weekly_structure(profile, &requirements, &config.sessions)?;
  let exclusions = screen_injuries(&profile.injury_exclusions_input);

  let strength_blocks = if requirements.strength_sessions > 0 {
    strength_blocks(total_weeks)
  } else {
    Vec::new()
  };

  let plan = DerivedPlan {
    config_version: config.version.clone(),
    athlete_id: profile.athlete_id.clone(),
    tier,
    starting_phase,
    total_weeks,
    event_date: profile.target_event_date,
    timeline,
    requirements,
    weekly_structure,
    exclusions,
    equipment_tier: profile.equipment_tier,
    weekly_hours_target: tier_requirements.weekly_hours,
    strength_blocks,
  };

  tracing::info!(
    athlete = profile.athlete_id.as_deref().unwrap_or("-"),
    %tier,
    total_weeks,
    degraded = plan.is_degraded(),
    "Plan derived"
  );

  Ok(plan)
}

/// ---------------------------------------------------------------------------
/// Plan Engine
/// ---------------------------------------------------------------------------

/// Holds a validated config, shared read-only across derivations
#[derive(Debug, Clone)]
pub struct PlanEngine {
  config: Arc<DerivationConfig>,
}

impl PlanEngine {
  pub fn new(config: DerivationConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self {
      config: Arc::new(config),
    })
  }

  pub fn from_env() -> Result<Self, ConfigError> {
    Self::new(DerivationConfig::from_env()?)
  }

  pub fn config(&self) -> &DerivationConfig {
    &self.config
  }

  pub fn derive(&self, profile: &AthleteProfile) -> Result<DerivedPlan, ScheduleInfeasible> {
    self.derive_as_of(profile, Utc::now().date_naive())
  }

  pub fn derive_as_of(
    &self,
    profile: &AthleteProfile,
    today: NaiveDate,
  ) -> Result<DerivedPlan, ScheduleInfeasible> {
    derive_plan_as_of(profile, &self.config, today)
  }

  /// Derive every profile independently. One infeasible profile never stops the batch.
  pub fn derive_batch(
    &self,
    profiles: &[AthleteProfile],
    today: NaiveDate,
  ) -> Vec<Result<DerivedPlan, ScheduleInfeasible>> {
    let results: Vec<_> = profiles
      .iter()
      .map(|profile| self.derive_as_of(profile, today))
      .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::info!(total = results.len(), failed, "Batch derivation finished");

    results
  }
}
