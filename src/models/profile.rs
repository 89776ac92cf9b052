use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Weekday
/// ---------------------------------------------------------------------------

/// Day of the training week, ordered Monday first. The weekly structure
/// repeats, so Sunday is adjacent to the following Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Day {
  pub const ALL: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
  ];

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn from_index(index: usize) -> Self {
    Self::ALL[index % 7]
  }

  /// The following day, wrapping Sunday to Monday
  pub fn next(self) -> Self {
    Self::from_index(self.index() + 1)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Day::Monday => "monday",
      Day::Tuesday => "tuesday",
      Day::Wednesday => "wednesday",
      Day::Thursday => "thursday",
      Day::Friday => "friday",
      Day::Saturday => "saturday",
      Day::Sunday => "sunday",
    }
  }
}

impl std::fmt::Display for Day {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Day {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lowered = s.trim().to_lowercase();
    Self::ALL
      .iter()
      .copied()
      .find(|d| d.as_str() == lowered || d.as_str()[..3] == lowered)
      .ok_or_else(|| format!("Unknown day: {}", s))
  }
}

/// ---------------------------------------------------------------------------
/// Profile Enumerations
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  Novice,
  Intermediate,
  Advanced,
  Elite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
  SpecificRace,
  GeneralFitness,
  BaseBuilding,
  OffSeason,
  ReturnFromInjury,
  PerformanceImprovement,
}

/// Permitted time-of-day window for a training day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
  Am,
  Pm,
  Both,
  #[default]
  None,
}

impl TimeSlot {
  /// Morning starts are allowed on this slot
  pub fn allows_morning(&self) -> bool {
    matches!(self, TimeSlot::Am | TimeSlot::Both)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentTier {
  BodyweightOnly,
  Minimal,
  Moderate,
  FullGym,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthInterest {
  NotInterested,
  Willing,
  Eager,
}

/// ---------------------------------------------------------------------------
/// Availability
/// ---------------------------------------------------------------------------

/// Self-reported current weekly volume in hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHoursRange {
  pub min: f64,
  pub max: f64,
}

impl WeeklyHoursRange {
  pub fn new(min: f64, max: f64) -> Self {
    Self { min, max }
  }

  pub fn midpoint(&self) -> f64 {
    (self.min + self.max) / 2.0
  }
}

/// One weekday's training window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayAvailability {
  pub is_available: bool,
  #[serde(default)]
  pub time_slot: TimeSlot,
  #[serde(default)]
  pub max_duration_minutes: u32,
}

impl DayAvailability {
  pub fn available(time_slot: TimeSlot, max_duration_minutes: u32) -> Self {
    Self {
      is_available: true,
      time_slot,
      max_duration_minutes,
    }
  }

  pub fn unavailable() -> Self {
    Self::default()
  }
}

/// ---------------------------------------------------------------------------
/// Athlete Profile
/// ---------------------------------------------------------------------------

/// Immutable intake snapshot the engine derives a plan from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub athlete_id: Option<String>,
  pub experience_level: ExperienceLevel,
  pub weekly_hours_range: WeeklyHoursRange,
  pub goal_type: GoalType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_event_date: Option<NaiveDate>,
  /// Days missing from the map are treated as unavailable
  pub availability: BTreeMap<Day, DayAvailability>,
  pub equipment_tier: EquipmentTier,
  /// Free text or tags describing current/past injuries and limitations
  #[serde(default)]
  pub injury_exclusions_input: Vec<String>,
  #[serde(default)]
  pub has_current_injury: bool,
  pub strength_interest: StrengthInterest,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_long_day: Option<Day>,
}

impl AthleteProfile {
  pub fn day(&self, day: Day) -> DayAvailability {
    self.availability.get(&day).copied().unwrap_or_default()
  }

  /// Currently injured, or explicitly returning from one
  pub fn is_injured(&self) -> bool {
    self.has_current_injury || self.goal_type == GoalType::ReturnFromInjury
  }

  pub fn available_day_count(&self) -> usize {
    Day::ALL.iter().filter(|d| self.day(**d).is_available).count()
  }
}
