//! Derivation configuration
//!
//! Every tunable threshold the engine uses lives here: tier hour bands,
//! plan-length bounds, phase-split weights, per-tier session requirements and
//! session durations. The config is versioned so a plan records which tables
//! produced it. Load and validate once at startup, then share it read-only.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;
use crate::models::{HoursBand, Phase, Tier};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

/// Environment variable naming a JSON config file
pub const CONFIG_PATH_VAR: &str = "PLAN_CONFIG_PATH";

const DEFAULT_CONFIG_VERSION: &str = "2026.1";

/// ---------------------------------------------------------------------------
/// Configuration Sections
/// ---------------------------------------------------------------------------

/// Weekly-hours midpoint thresholds for the base tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHourBands {
  /// Below this is ayahuasca
  pub finisher_min_hours: f64,
  /// At or above this is compete
  pub compete_min_hours: f64,
  /// Strictly above this is podium
  pub podium_above_hours: f64,
}

impl Default for TierHourBands {
  fn default() -> Self {
    Self {
      finisher_min_hours: 4.0,
      compete_min_hours: 8.0,
      podium_above_hours: 14.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLengthBounds {
  pub min_weeks: u32,
  pub max_weeks: u32,
  /// Used when the profile has no event date
  pub default_weeks: u32,
}

impl Default for PlanLengthBounds {
  fn default() -> Self {
    Self {
      min_weeks: 4,
      max_weeks: 32,
      default_weeks: 12,
    }
  }
}

/// Proportional phase weights in percent, must sum to 100
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSplit {
  pub base: u32,
  pub build: u32,
  pub peak: u32,
  pub taper: u32,
}

impl PhaseSplit {
  pub fn weight(&self, phase: Phase) -> u32 {
    match phase {
      Phase::Base => self.base,
      Phase::Build => self.build,
      Phase::Peak => self.peak,
      Phase::Taper => self.taper,
    }
  }

  pub fn total(&self) -> u32 {
    self.base + self.build + self.peak + self.taper
  }
}

impl Default for PhaseSplit {
  fn default() -> Self {
    Self {
      base: 35,
      build: 35,
      peak: 20,
      taper: 10,
    }
  }
}

/// What a tier asks of a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRequirements {
  /// Key cycling sessions per week, long ride included
  pub key_sessions: u32,
  pub needs_long_ride: bool,
  /// Default before the athlete's strength interest is applied
  pub strength_sessions: u32,
  /// Floor on every phase's length
  pub min_phase_weeks: u32,
  pub weekly_hours: HoursBand,
}

impl TierRequirements {
  fn new(key_sessions: u32, strength_sessions: u32, hours: (f64, f64)) -> Self {
    Self {
      key_sessions,
      needs_long_ride: true,
      strength_sessions,
      min_phase_weeks: 1,
      weekly_hours: HoursBand {
        min: hours.0,
        max: hours.1,
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
  pub ayahuasca: TierRequirements,
  pub finisher: TierRequirements,
  pub compete: TierRequirements,
  pub podium: TierRequirements,
}

impl TierTable {
  pub fn get(&self, tier: Tier) -> &TierRequirements {
    match tier {
      Tier::Ayahuasca => &self.ayahuasca,
      Tier::Finisher => &self.finisher,
      Tier::Compete => &self.compete,
      Tier::Podium => &self.podium,
    }
  }
}

impl Default for TierTable {
  fn default() -> Self {
    Self {
      ayahuasca: TierRequirements::new(2, 2, (4.0, 8.0)),
      finisher: TierRequirements::new(2, 2, (8.0, 12.0)),
      compete: TierRequirements::new(3, 2, (12.0, 18.0)),
      podium: TierRequirements::new(4, 2, (18.0, 25.0)),
    }
  }
}

/// Target session lengths in minutes, each capped by the day's maximum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDurations {
  pub key_intervals_minutes: u32,
  pub easy_ride_minutes: u32,
  pub strength_minutes: u32,
  /// Available days shorter than this cannot host a session
  pub min_session_minutes: u32,
}

impl Default for SessionDurations {
  fn default() -> Self {
    Self {
      key_intervals_minutes: 75,
      easy_ride_minutes: 60,
      strength_minutes: 45,
      min_session_minutes: 20,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Derivation Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
  pub version: String,
  pub tier_bands: TierHourBands,
  pub plan_length: PlanLengthBounds,
  pub phase_split: PhaseSplit,
  pub tiers: TierTable,
  pub sessions: SessionDurations,
}

impl Default for DerivationConfig {
  fn default() -> Self {
    Self {
      version: DEFAULT_CONFIG_VERSION.to_string(),
      tier_bands: TierHourBands::default(),
      plan_length: PlanLengthBounds::default(),
      phase_split: PhaseSplit::default(),
      tiers: TierTable::default(),
      sessions: SessionDurations::default(),
    }
  }
}

impl DerivationConfig {
  /// Parse and validate a JSON document. Missing sections take defaults.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Loading derivation config");
    let contents = fs::read_to_string(path)
      .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    Self::from_json(&contents)
  }

  /// Load from the file named by `PLAN_CONFIG_PATH` (a `.env` file is honoured),
  /// falling back to the built-in defaults when it is unset.
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();

    match env::var(CONFIG_PATH_VAR) {
      Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
      _ => {
        tracing::debug!("{} not set, using default derivation config", CONFIG_PATH_VAR);
        let config = Self::default();
        config.validate()?;
        Ok(config)
      }
    }
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }

  pub fn tier(&self, tier: Tier) -> &TierRequirements {
    self.tiers.get(tier)
  }

  /// Reject malformed tables. Reports the first failing rule.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::Invalid(msg));

    if self.version.trim().is_empty() {
      return invalid("version must not be empty".into());
    }

    let bands = &self.tier_bands;
    let ascending = bands.finisher_min_hours >= 0.0
      && bands.finisher_min_hours < bands.compete_min_hours
      && bands.compete_min_hours < bands.podium_above_hours;
    if !ascending {
      return invalid(format!(
        "tier hour bands must be ascending and non-negative (got {}, {}, {})",
        bands.finisher_min_hours, bands.compete_min_hours, bands.podium_above_hours
      ));
    }

    let length = &self.plan_length;
    if length.min_weeks == 0 {
      return invalid("plan_length.min_weeks must be at least 1".into());
    }
    if length.min_weeks > length.max_weeks {
      return invalid(format!(
        "plan_length.min_weeks ({}) exceeds max_weeks ({})",
        length.min_weeks, length.max_weeks
      ));
    }
    if length.default_weeks < length.min_weeks || length.default_weeks > length.max_weeks {
      return invalid(format!(
        "plan_length.default_weeks ({}) outside [{}, {}]",
        length.default_weeks, length.min_weeks, length.max_weeks
      ));
    }

    let split = &self.phase_split;
    if split.total() != 100 {
      return invalid(format!("phase split sums to {}, expected 100", split.total()));
    }
    if let Some(phase) = Phase::ALL.iter().find(|p| split.weight(**p) == 0) {
      return invalid(format!("phase split weight for {} must be positive", phase));
    }

    for tier in Tier::ALL {
      let req = self.tier(tier);
      if req.key_sessions > 7 {
        return invalid(format!("{}: key_sessions {} exceeds 7", tier, req.key_sessions));
      }
      if req.strength_sessions > 7 {
        return invalid(format!(
          "{}: strength_sessions {} exceeds 7",
          tier, req.strength_sessions
        ));
      }
      if req.needs_long_ride && req.key_sessions == 0 {
        return invalid(format!("{}: long ride required but key_sessions is 0", tier));
      }
      if req.min_phase_weeks == 0 {
        return invalid(format!("{}: min_phase_weeks must be at least 1", tier));
      }
      if req.weekly_hours.min > req.weekly_hours.max {
        return invalid(format!("{}: weekly_hours min exceeds max", tier));
      }
    }

    let sessions = &self.sessions;
    if sessions.key_intervals_minutes == 0
      || sessions.easy_ride_minutes == 0
      || sessions.strength_minutes == 0
    {
      return invalid("session durations must be positive".into());
    }

    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_default_config_is_valid() {
    let config = DerivationConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.phase_split.total(), 100);
    assert_eq!(config.tier(Tier::Compete).key_sessions, 3);
  }

  #[test]
  fn test_phase_split_must_sum_to_100() {
    let mut config = DerivationConfig::default();
    config.phase_split.taper = 5;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("sums to 95"));
  }

  #[test]
  fn test_zero_phase_weight_rejected() {
    let mut config = DerivationConfig::default();
    config.phase_split = PhaseSplit {
      base: 50,
      build: 30,
      peak: 20,
      taper: 0,
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
  }

  #[test]
  fn test_bands_must_ascend() {
    let mut config = DerivationConfig::default();
    config.tier_bands.compete_min_hours = 15.0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_default_weeks_within_bounds() {
    let mut config = DerivationConfig::default();
    config.plan_length.default_weeks = 40;
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_long_ride_needs_a_key_session() {
    let mut config = DerivationConfig::default();
    config.tiers.finisher.key_sessions = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("finisher"));
  }

  #[test]
  fn test_partial_json_takes_defaults() {
    let config = DerivationConfig::from_json(
      r#"{"version": "test-1", "plan_length": {"min_weeks": 6, "max_weeks": 24, "default_weeks": 10}}"#,
    )
    .unwrap();
    assert_eq!(config.version, "test-1");
    assert_eq!(config.plan_length.min_weeks, 6);
    assert_eq!(config.phase_split, PhaseSplit::default());
  }

  #[test]
  fn test_malformed_json_is_parse_error() {
    let result = DerivationConfig::from_json("{not json");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }

  #[test]
  #[serial]
  fn test_from_env_defaults_when_unset() {
    temp_env::with_var_unset(CONFIG_PATH_VAR, || {
      let config = DerivationConfig::from_env().expect("defaults should load");
      assert_eq!(config, DerivationConfig::default());
    });
  }

  #[test]
  #[serial]
  fn test_from_env_reads_file() {
    let path = env::temp_dir().join("plan_derive_config_test.json");
    fs::write(&path, r#"{"version": "from-file"}"#).unwrap();

    temp_env::with_var(CONFIG_PATH_VAR, Some(path.to_str().unwrap()), || {
      let config = DerivationConfig::from_env().expect("config file should load");
      assert_eq!(config.version, "from-file");
    });

    fs::remove_file(&path).ok();
  }

  #[test]
  fn test_missing_file_error_names_path() {
    let err = DerivationConfig::from_file("/nonexistent/plan-derive.json").unwrap_err();
    assert!(matches!(&err, ConfigError::Io(msg) if msg.starts_with("/nonexistent/plan-derive.json: ")));
  }

  #[test]
  #[serial]
  fn test_from_env_missing_file_is_io_error() {
    temp_env::with_var(CONFIG_PATH_VAR, Some("/nonexistent/plan.json"), || {
      let result = DerivationConfig::from_env();
      assert!(matches!(result, Err(ConfigError::Io(_))));
    });
  }
}
