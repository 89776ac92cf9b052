use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::profile::{Day, EquipmentTier, TimeSlot};

// ---------------------------------------------------------------------------
/// Tier: competitive demand, totally ordered
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  Ayahuasca,
  Finisher,
  Compete,
  Podium,
}

impl Tier {
  pub const ALL: [Tier; 4] = [Tier::Ayahuasca, Tier::Finisher, Tier::Compete, Tier::Podium];

  /// One tier less demanding, clamped at ayahuasca
  pub fn step_down(self) -> Self {
    match self {
      Tier::Ayahuasca | Tier::Finisher => Tier::Ayahuasca,
      Tier::Compete => Tier::Finisher,
      Tier::Podium => Tier::Compete,
    }
  }

  /// One tier more demanding, clamped at podium
  pub fn step_up(self) -> Self {
    match self {
      Tier::Ayahuasca => Tier::Finisher,
      Tier::Finisher => Tier::Compete,
      Tier::Compete | Tier::Podium => Tier::Podium,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Tier::Ayahuasca => "ayahuasca",
      Tier::Finisher => "finisher",
      Tier::Compete => "compete",
      Tier::Podium => "podium",
    }
  }
}

impl std::fmt::Display for Tier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// ---------------------------------------------------------------------------
/// Phase Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Base,
  Build,
  Peak,
  Taper,
}

impl Phase {
  pub const ALL: [Phase; 4] = [Phase::Base, Phase::Build, Phase::Peak, Phase::Taper];

  pub fn as_str(&self) -> &'static str {
    match self {
      Phase::Base => "base",
      Phase::Build => "build",
      Phase::Peak => "peak",
      Phase::Taper => "taper",
    }
  }
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A contiguous block of weeks. `start_week` is a zero-based week index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBlock {
  pub phase: Phase,
  pub start_week: u32,
  pub weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimeline {
  pub total_weeks: u32,
  pub phases: Vec<PhaseBlock>,
}

impl PhaseTimeline {
  /// Phase covering a zero-based week index
  pub fn phase_for_week(&self, week: u32) -> Option<Phase> {
    self
      .phases
      .iter()
      .find(|b| week >= b.start_week && week < b.start_week + b.weeks)
      .map(|b| b.phase)
  }

  pub fn weeks_in(&self, phase: Phase) -> u32 {
    self
      .phases
      .iter()
      .filter(|b| b.phase == phase)
      .map(|b| b.weeks)
      .sum()
  }
}

// ---------------------------------------------------------------------------
/// Strength Blocks: gym progression laid over the cycling phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthBlock {
  /// Movement quality, light loads
  LearnToLift,
  /// Maximum strength, heavy loads
  LiftHeavy,
  /// Power conversion, submaximal loads moved fast
  LiftFast,
  /// Hold adaptations with minimal fatigue
  Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthBlockSpan {
  pub block: StrengthBlock,
  pub start_week: u32,
  pub weeks: u32,
}

// ---------------------------------------------------------------------------
/// Weekly Structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
  KeyIntervals,
  LongRide,
  EasyRide,
  Strength,
  Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_type: SessionType,
  pub time_slot: TimeSlot,
  pub duration_minutes: u32,
  pub is_key: bool,
}

impl Session {
  pub fn rest() -> Self {
    Self {
      session_type: SessionType::Rest,
      time_slot: TimeSlot::None,
      duration_minutes: 0,
      is_key: false,
    }
  }

  /// Key interval work or the long ride
  pub fn is_key_cycling(&self) -> bool {
    self.is_key || self.session_type == SessionType::LongRide
  }
}

/// An ideal placement rule the builder could not satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Degradation {
  /// Key sessions on consecutive days. The week wraps Sunday to Monday, so
  /// four or more key sessions always include at least one pair; only the
  /// fewest pairs any placement allows are ever recorded.
  AdjacentKeySessions { pairs: Vec<(Day, Day)> },
  /// Long ride could not go on the longest available day without breaking spacing
  LongRideDisplaced { placed_on: Day, longest_day: Day },
  /// Not enough non-key days for every requested strength session
  StrengthReduced { requested: u32, placed: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStructure {
  pub days: BTreeMap<Day, Session>,
  #[serde(default)]
  pub degradations: Vec<Degradation>,
}

impl WeeklyStructure {
  pub fn session(&self, day: Day) -> Option<&Session> {
    self.days.get(&day)
  }

  /// Count of key interval and long ride sessions
  pub fn key_session_count(&self) -> usize {
    self.days.values().filter(|s| s.is_key_cycling()).count()
  }

  pub fn days_of(&self, session_type: SessionType) -> Vec<Day> {
    self
      .days
      .iter()
      .filter(|(_, s)| s.session_type == session_type)
      .map(|(d, _)| *d)
      .collect()
  }

  /// Every non-rest session
  pub fn active_session_count(&self) -> usize {
    self
      .days
      .values()
      .filter(|s| s.session_type != SessionType::Rest)
      .count()
  }

  pub fn is_degraded(&self) -> bool {
    !self.degradations.is_empty()
  }
}

// ---------------------------------------------------------------------------
/// Exercise Exclusions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
  Squat,
  Hinge,
  OverheadPress,
  SingleLeg,
  Plyometric,
}

impl MovementPattern {
  pub fn as_str(&self) -> &'static str {
    match self {
      MovementPattern::Squat => "squat",
      MovementPattern::Hinge => "hinge",
      MovementPattern::OverheadPress => "overhead_press",
      MovementPattern::SingleLeg => "single_leg",
      MovementPattern::Plyometric => "plyometric",
    }
  }
}

/// Result of screening injury text against the movement vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InjuryScreen {
  pub exclusions: BTreeSet<MovementPattern>,
  /// Vocabulary phrases that produced an exclusion
  pub matched_terms: BTreeSet<String>,
  /// Entries with no vocabulary match, kept verbatim for human review
  pub unmatched_notes: Vec<String>,
}

impl InjuryScreen {
  pub fn excludes(&self, pattern: MovementPattern) -> bool {
    self.exclusions.contains(&pattern)
  }
}

// ---------------------------------------------------------------------------
/// Derived Plan
// ---------------------------------------------------------------------------

/// Weekly session counts a tier asks for, after the strength interest override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequirements {
  /// Includes the long ride when one is required
  pub key_sessions: u32,
  pub needs_long_ride: bool,
  pub strength_sessions: u32,
}

/// Weekly hour guidance for a tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoursBand {
  pub min: f64,
  pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPlan {
  pub config_version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub athlete_id: Option<String>,
  pub tier: Tier,
  pub starting_phase: Phase,
  pub total_weeks: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub event_date: Option<NaiveDate>,
  pub timeline: PhaseTimeline,
  pub requirements: SessionRequirements,
  pub weekly_structure: WeeklyStructure,
  pub exclusions: InjuryScreen,
  pub equipment_tier: EquipmentTier,
  pub weekly_hours_target: HoursBand,
  #[serde(default)]
  pub strength_blocks: Vec<StrengthBlockSpan>,
}

impl DerivedPlan {
  pub fn phase_for_week(&self, week: u32) -> Option<Phase> {
    self.timeline.phase_for_week(week)
  }

  pub fn is_degraded(&self) -> bool {
    self.weekly_structure.is_degraded()
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tier_steps_clamp() {
    assert_eq!(Tier::Ayahuasca.step_down(), Tier::Ayahuasca);
    assert_eq!(Tier::Podium.step_up(), Tier::Podium);
    assert_eq!(Tier::Finisher.step_up(), Tier::Compete);
    assert!(Tier::Ayahuasca < Tier::Podium);
  }

  #[test]
  fn test_phase_for_week_lookup() {
    let timeline = PhaseTimeline {
      total_weeks: 6,
      phases: vec![
        PhaseBlock { phase: Phase::Build, start_week: 0, weeks: 3 },
        PhaseBlock { phase: Phase::Peak, start_week: 3, weeks: 2 },
        PhaseBlock { phase: Phase::Taper, start_week: 5, weeks: 1 },
      ],
    };
    assert_eq!(timeline.phase_for_week(0), Some(Phase::Build));
    assert_eq!(timeline.phase_for_week(4), Some(Phase::Peak));
    assert_eq!(timeline.phase_for_week(5), Some(Phase::Taper));
    assert_eq!(timeline.phase_for_week(6), None);
    assert_eq!(timeline.weeks_in(Phase::Base), 0);
  }

  #[test]
  fn test_long_ride_counts_as_key_cycling() {
    let long = Session {
      session_type: SessionType::LongRide,
      time_slot: TimeSlot::Am,
      duration_minutes: 240,
      is_key: true,
    };
    assert!(long.is_key_cycling());
    assert!(!Session::rest().is_key_cycling());
  }
}
