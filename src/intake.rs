//! Intake form conversion
//!
//! Turns a raw questionnaire submission into an `AthleteProfile`. Every field
//! goes through an explicit option table; anything outside the table fails
//! with an `IntakeError` naming the field instead of being guessed at.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::IntakeError;
use crate::models::{
  AthleteProfile, Day, DayAvailability, EquipmentTier, ExperienceLevel, GoalType,
  StrengthInterest, TimeSlot, WeeklyHoursRange,
};

/// Upper bound used for open-ended volume answers like "20+"
const OPEN_ENDED_MAX_HOURS: f64 = 40.0;

/// Duration assumed when an available day has no duration answer
const DEFAULT_DAY_MINUTES: u32 = 60;

/// Raw intake submission. Per-day answers arrive as flat
/// `{day}_available`, `{day}_time` and `{day}_duration` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeForm {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub athlete_id: Option<String>,
  #[serde(default)]
  pub weekly_volume: String,
  #[serde(default)]
  pub primary_goal: String,
  #[serde(default)]
  pub race_date: Option<String>,
  /// Free text, one race per line. The first dated line anchors the plan.
  #[serde(default)]
  pub race_list: Option<String>,
  #[serde(default)]
  pub years_cycling: Option<String>,
  #[serde(default)]
  pub years_structured: Option<Value>,
  #[serde(default)]
  pub equipment: Vec<String>,
  #[serde(default)]
  pub limitations: Vec<String>,
  #[serde(default)]
  pub current_injuries: Option<String>,
  #[serde(default)]
  pub past_injuries: Option<String>,
  #[serde(default)]
  pub strength_interest: Option<String>,
  #[serde(default)]
  pub preferred_long_day: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl IntakeForm {
  pub fn from_json(json: &str) -> Result<Self, IntakeError> {
    serde_json::from_str(json).map_err(|e| IntakeError::invalid("form", e.to_string()))
  }

  /// Convert the submission into a derivation-ready profile
  pub fn to_profile(&self) -> Result<AthleteProfile, IntakeError> {
    let availability = Day::ALL
      .iter()
      .map(|day| Ok((*day, day_availability(&self.extra, *day)?)))
      .collect::<Result<BTreeMap<_, _>, IntakeError>>()?;

    let years_structured = match &self.years_structured {
      Some(value) => value_to_u32("years_structured", value)?.unwrap_or(0),
      None => 0,
    };

    let mut injuries: Vec<String> = self
      .limitations
      .iter()
      .map(|code| limitation_entry(code))
      .collect();
    let current = non_empty(self.current_injuries.as_deref());
    if let Some(text) = current {
      injuries.push(text.to_string());
    }
    // Screened for exclusions but not an active injury
    if let Some(text) = non_empty(self.past_injuries.as_deref()) {
      injuries.push(text.to_string());
    }

    let races = parse_race_list(self.race_list.as_deref().unwrap_or_default())?;
    let target_event_date = match races.iter().find_map(|race| race.date) {
      Some(date) => Some(date),
      None => parse_race_date(self.race_date.as_deref())?,
    };

    let athlete_id = non_empty(self.athlete_id.as_deref())
      .map(str::to_string)
      .or_else(|| Some(athlete_slug(&self.name)).filter(|s| !s.is_empty()));

    let profile = AthleteProfile {
      athlete_id,
      experience_level: experience_level(self.years_cycling.as_deref(), years_structured)?,
      weekly_hours_range: parse_weekly_volume(&self.weekly_volume)?,
      goal_type: parse_goal(&self.primary_goal)?,
      target_event_date,
      availability,
      equipment_tier: equipment_tier(&self.equipment),
      injury_exclusions_input: injuries,
      has_current_injury: current.is_some(),
      strength_interest: parse_strength_interest(self.strength_interest.as_deref())?,
      preferred_long_day: non_empty(self.preferred_long_day.as_deref())
        .map(|d| d.parse::<Day>().map_err(|_| IntakeError::invalid("preferred_long_day", d)))
        .transpose()?,
    };

    tracing::debug!(
      athlete = profile.athlete_id.as_deref().unwrap_or("-"),
      available_days = profile.available_day_count(),
      "Intake converted"
    );

    Ok(profile)
  }
}

/// ---------------------------------------------------------------------------
/// Field Conversions
/// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|s| !s.is_empty())
}

/// Lowercase, spaces to hyphens, drop anything outside [a-z0-9-], collapse runs
pub fn athlete_slug(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  for c in name.to_lowercase().chars() {
    let c = if c == ' ' { '-' } else { c };
    if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
      continue;
    }
    if c == '-' && slug.ends_with('-') {
      continue;
    }
    slug.push(c);
  }
  slug.trim_matches('-').to_string()
}

/// "9-12" -> 9..12, "20+" -> 20..40, "5" -> 5..5
pub fn parse_weekly_volume(volume: &str) -> Result<WeeklyHoursRange, IntakeError> {
  const FIELD: &str = "weekly_volume";
  let volume = volume.trim();
  if volume.is_empty() {
    return Err(IntakeError::MissingField(FIELD.to_string()));
  }

  let hours = |s: &str| -> Result<f64, IntakeError> {
    s.trim()
      .parse::<u32>()
      .map(f64::from)
      .map_err(|_| IntakeError::invalid(FIELD, volume))
  };

  let (min, max) = if let Some(open) = volume.strip_suffix('+') {
    (hours(open)?, OPEN_ENDED_MAX_HOURS)
  } else if let Some((low, high)) = volume.split_once('-') {
    (hours(low)?, hours(high)?)
  } else {
    let exact = hours(volume)?;
    (exact, exact)
  };

  if min > max {
    return Err(IntakeError::invalid(FIELD, volume));
  }
  Ok(WeeklyHoursRange::new(min, max))
}

/// Accepts the form's display labels or the snake_case identifiers
pub fn parse_goal(label: &str) -> Result<GoalType, IntakeError> {
  const FIELD: &str = "primary_goal";
  let trimmed = label.trim();
  if trimmed.is_empty() {
    return Err(IntakeError::MissingField(FIELD.to_string()));
  }

  let goal = match trimmed {
    "Specific race(s)" | "specific_race" => GoalType::SpecificRace,
    "General fitness" | "general_fitness" => GoalType::GeneralFitness,
    "Base building" | "base_building" => GoalType::BaseBuilding,
    "Off-season maintenance" | "off_season" => GoalType::OffSeason,
    "Return from injury" | "return_from_injury" => GoalType::ReturnFromInjury,
    "Performance improvement" | "performance_improvement" => GoalType::PerformanceImprovement,
    other => return Err(IntakeError::invalid(FIELD, other)),
  };
  Ok(goal)
}

fn parse_race_date(value: Option<&str>) -> Result<Option<NaiveDate>, IntakeError> {
  non_empty(value)
    .map(|s| {
      NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| IntakeError::invalid("race_date", s))
    })
    .transpose()
}

/// One line of a free-text race list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEntry {
  pub name: String,
  pub date: Option<NaiveDate>,
}

const MONTHS: [&str; 12] = [
  "january", "february", "march", "april", "may", "june", "july", "august", "september",
  "october", "november", "december",
];

/// "June", "jun" or "Sept." to a month number
fn month_number(token: &str) -> Option<u32> {
  let token = token.trim_end_matches('.').to_lowercase();
  if token.len() < 3 {
    return None;
  }
  MONTHS
    .iter()
    .position(|m| *m == token || m.starts_with(token.as_str()))
    .map(|i| i as u32 + 1)
}

fn looks_like_iso_date(token: &str) -> bool {
  let bytes = token.as_bytes();
  bytes.len() == 10
    && bytes[4] == b'-'
    && bytes[7] == b'-'
    && bytes
      .iter()
      .enumerate()
      .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

/// Parse one race per non-blank line. A date is an ISO `2027-05-30` token or
/// `May 30, 2027` / `May 30 2027`; the rest of the line is the race name.
/// Lines without a date are kept undated. A date-shaped token that is not a
/// real calendar date is an error.
pub fn parse_race_list(text: &str) -> Result<Vec<RaceEntry>, IntakeError> {
  const FIELD: &str = "race_list";
  let mut races = Vec::new();

  for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
    let tokens: Vec<&str> = line
      .split_whitespace()
      .map(|t| t.trim_matches(|c: char| matches!(c, '(' | ')' | ',')))
      .collect();

    let mut date = None;
    let mut consumed = 0..0;
    for (i, token) in tokens.iter().enumerate() {
      if looks_like_iso_date(token) {
        let parsed = NaiveDate::parse_from_str(token, "%Y-%m-%d")
          .map_err(|_| IntakeError::invalid(FIELD, line))?;
        date = Some(parsed);
        consumed = i..i + 1;
        break;
      }

      let (Some(month), Some(day), Some(year)) = (
        month_number(token),
        tokens.get(i + 1).and_then(|t| t.parse::<u32>().ok()),
        tokens
          .get(i + 2)
          .filter(|t| t.len() == 4)
          .and_then(|t| t.parse::<i32>().ok()),
      ) else {
        continue;
      };
      let parsed =
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| IntakeError::invalid(FIELD, line))?;
      date = Some(parsed);
      consumed = i..i + 3;
      break;
    }

    let name = tokens
      .iter()
      .enumerate()
      .filter(|(i, t)| !consumed.contains(i) && !t.is_empty() && **t != "-")
      .map(|(_, t)| *t)
      .collect::<Vec<_>>()
      .join(" ");

    races.push(RaceEntry { name, date });
  }

  Ok(races)
}

/// Years-cycling bucket plus years of structured training
pub fn experience_level(
  years_cycling: Option<&str>,
  years_structured: u32,
) -> Result<ExperienceLevel, IntakeError> {
  let bucket = non_empty(years_cycling).unwrap_or("0-2");
  let veteran = match bucket {
    "0-2" | "3-5" => false,
    "6-10" | "10+" => true,
    other => return Err(IntakeError::invalid("years_cycling", other)),
  };

  let level = if bucket == "10+" && years_structured >= 8 {
    ExperienceLevel::Elite
  } else if veteran && years_structured >= 5 {
    ExperienceLevel::Advanced
  } else if years_structured >= 1 {
    ExperienceLevel::Intermediate
  } else {
    ExperienceLevel::Novice
  };
  Ok(level)
}

/// Best strength equipment on the checklist wins
pub fn equipment_tier(equipment: &[String]) -> EquipmentTier {
  let has = |item: &str| equipment.iter().any(|e| e == item);
  if has("gym_membership") {
    EquipmentTier::FullGym
  } else if has("home_gym") {
    EquipmentTier::Moderate
  } else if has("pull_up_bar") || has("resistance_bands") {
    EquipmentTier::Minimal
  } else {
    EquipmentTier::BodyweightOnly
  }
}

/// Limitation checkbox code to free text the injury screen understands
fn limitation_entry(code: &str) -> String {
  match code {
    "deep_squat_painful" => "deep squat".to_string(),
    "single_leg_balance" => "single leg balance".to_string(),
    "pushups_shoulders" => "push ups".to_string(),
    "hip_mobility" => "hip hinge".to_string(),
    "lower_back" => "lower back".to_string(),
    other => other.replace('_', " "),
  }
}

fn parse_strength_interest(value: Option<&str>) -> Result<StrengthInterest, IntakeError> {
  match non_empty(value) {
    None | Some("not_interested") => Ok(StrengthInterest::NotInterested),
    Some("willing") => Ok(StrengthInterest::Willing),
    Some("eager") => Ok(StrengthInterest::Eager),
    Some(other) => Err(IntakeError::invalid("strength_interest", other)),
  }
}

fn time_slot(answer: &str) -> TimeSlot {
  match answer {
    "afternoon" | "evening" => TimeSlot::Pm,
    "flexible" => TimeSlot::Both,
    _ => TimeSlot::Am,
  }
}

fn value_is_truthy(value: &Value) -> bool {
  match value {
    Value::Bool(b) => *b,
    Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "on" | "1"),
    Value::Number(n) => n.as_u64().is_some_and(|n| n > 0),
    _ => false,
  }
}

/// Integer from a JSON number or numeric string; empty string reads as absent
fn value_to_u32(field: &str, value: &Value) -> Result<Option<u32>, IntakeError> {
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => n
      .as_u64()
      .and_then(|n| u32::try_from(n).ok())
      .map(Some)
      .ok_or_else(|| IntakeError::invalid(field, n.to_string())),
    Value::String(s) if s.trim().is_empty() => Ok(None),
    Value::String(s) => s
      .trim()
      .parse::<u32>()
      .map(Some)
      .map_err(|_| IntakeError::invalid(field, s.as_str())),
    other => Err(IntakeError::invalid(field, other.to_string())),
  }
}

fn day_availability(
  fields: &BTreeMap<String, Value>,
  day: Day,
) -> Result<DayAvailability, IntakeError> {
  let available = fields
    .get(&format!("{}_available", day))
    .is_some_and(value_is_truthy);
  if !available {
    return Ok(DayAvailability::unavailable());
  }

  let slot = fields
    .get(&format!("{}_time", day))
    .and_then(Value::as_str)
    .map(|s| time_slot(s.trim()))
    .unwrap_or(TimeSlot::Am);

  let duration_field = format!("{}_duration", day);
  let minutes = match fields.get(&duration_field) {
    Some(value) => value_to_u32(&duration_field, value)?.unwrap_or(DEFAULT_DAY_MINUTES),
    None => DEFAULT_DAY_MINUTES,
  };

  Ok(DayAvailability::available(slot, minutes))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::MovementPattern;
  use serde_json::json;

  fn sample_form() -> IntakeForm {
    serde_json::from_value(json!({
      "name": "Jane  Q. Rider!",
      "weekly_volume": "9-12",
      "primary_goal": "Specific race(s)",
      "race_date": "2027-04-02",
      "years_cycling": "6-10",
      "years_structured": "5",
      "equipment": ["smart_trainer", "home_gym"],
      "limitations": ["pushups_shoulders"],
      "current_injuries": "",
      "strength_interest": "eager",
      "preferred_long_day": "saturday",
      "tuesday_available": true,
      "tuesday_time": "evening",
      "tuesday_duration": "90",
      "thursday_available": "yes",
      "thursday_time": "early_morning",
      "thursday_duration": 75,
      "saturday_available": true,
      "saturday_time": "flexible",
      "saturday_duration": "240",
      "sunday_available": true,
      "monday_available": false,
      "monday_duration": "120"
    }))
    .unwrap()
  }

  #[test]
  fn test_parse_weekly_volume() {
    assert_eq!(parse_weekly_volume("9-12").unwrap(), WeeklyHoursRange::new(9.0, 12.0));
    assert_eq!(parse_weekly_volume("20+").unwrap(), WeeklyHoursRange::new(20.0, 40.0));
    assert_eq!(parse_weekly_volume("5").unwrap(), WeeklyHoursRange::new(5.0, 5.0));
    assert_eq!(
      parse_weekly_volume(""),
      Err(IntakeError::MissingField("weekly_volume".to_string()))
    );
    assert_eq!(
      parse_weekly_volume("lots"),
      Err(IntakeError::invalid("weekly_volume", "lots"))
    );
    assert!(parse_weekly_volume("12-9").is_err());
  }

  #[test]
  fn test_goal_labels() {
    assert_eq!(parse_goal("Off-season maintenance"), Ok(GoalType::OffSeason));
    assert_eq!(parse_goal("return_from_injury"), Ok(GoalType::ReturnFromInjury));
    assert!(matches!(
      parse_goal("Win everything"),
      Err(IntakeError::InvalidValue { field, .. }) if field == "primary_goal"
    ));
  }

  #[test]
  fn test_experience_buckets() {
    assert_eq!(experience_level(Some("10+"), 8), Ok(ExperienceLevel::Elite));
    assert_eq!(experience_level(Some("6-10"), 8), Ok(ExperienceLevel::Advanced));
    assert_eq!(experience_level(Some("10+"), 5), Ok(ExperienceLevel::Advanced));
    assert_eq!(experience_level(Some("3-5"), 6), Ok(ExperienceLevel::Intermediate));
    assert_eq!(experience_level(None, 0), Ok(ExperienceLevel::Novice));
    assert!(experience_level(Some("forever"), 3).is_err());
  }

  #[test]
  fn test_equipment_tier_takes_best_item() {
    let items = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(equipment_tier(&items(&["gym_membership", "home_gym"])), EquipmentTier::FullGym);
    assert_eq!(equipment_tier(&items(&["resistance_bands"])), EquipmentTier::Minimal);
    assert_eq!(equipment_tier(&items(&["smart_trainer"])), EquipmentTier::BodyweightOnly);
  }

  #[test]
  fn test_athlete_slug() {
    assert_eq!(athlete_slug("Jane  Q. Rider!"), "jane-q-rider");
    assert_eq!(athlete_slug("  -Max-  "), "max");
    assert_eq!(athlete_slug("!!!"), "");
  }

  #[test]
  fn test_form_to_profile() {
    let profile = sample_form().to_profile().unwrap();

    assert_eq!(profile.athlete_id.as_deref(), Some("jane-q-rider"));
    assert_eq!(profile.experience_level, ExperienceLevel::Advanced);
    assert_eq!(profile.goal_type, GoalType::SpecificRace);
    assert_eq!(profile.target_event_date, NaiveDate::from_ymd_opt(2027, 4, 2));
    assert_eq!(profile.equipment_tier, EquipmentTier::Moderate);
    assert_eq!(profile.strength_interest, StrengthInterest::Eager);
    assert_eq!(profile.preferred_long_day, Some(Day::Saturday));
    assert!(!profile.has_current_injury);
    assert_eq!(profile.injury_exclusions_input, vec!["push ups".to_string()]);

    assert_eq!(profile.day(Day::Tuesday), DayAvailability::available(TimeSlot::Pm, 90));
    assert_eq!(profile.day(Day::Thursday), DayAvailability::available(TimeSlot::Am, 75));
    assert_eq!(profile.day(Day::Saturday), DayAvailability::available(TimeSlot::Both, 240));
    // No time or duration answers
    assert_eq!(profile.day(Day::Sunday), DayAvailability::available(TimeSlot::Am, 60));
    assert!(!profile.day(Day::Monday).is_available);
    assert_eq!(profile.available_day_count(), 4);
  }

  #[test]
  fn test_injury_text_marks_current_injury() {
    let mut form = sample_form();
    form.current_injuries = Some("Sore left knee after crash".to_string());
    let profile = form.to_profile().unwrap();
    assert!(profile.has_current_injury);
    assert_eq!(profile.injury_exclusions_input.len(), 2);

    let screen = crate::classifier::screen_injuries(&profile.injury_exclusions_input);
    assert!(screen.excludes(MovementPattern::Squat));
    assert!(screen.excludes(MovementPattern::OverheadPress));
  }

  #[test]
  fn test_past_injuries_screened_but_not_current() {
    let mut form = sample_form();
    form.past_injuries = Some("knee surgery 2022, deadlifts hurt lower back".to_string());
    let profile = form.to_profile().unwrap();

    assert!(!profile.has_current_injury);
    assert_eq!(profile.injury_exclusions_input.len(), 2);

    let screen = crate::classifier::screen_injuries(&profile.injury_exclusions_input);
    assert!(screen.excludes(MovementPattern::Squat));
    assert!(screen.excludes(MovementPattern::Hinge));
    assert_eq!(crate::classifier::starting_phase(&profile), crate::models::Phase::Build);
  }

  #[test]
  fn test_parse_race_list_formats() {
    let races = parse_race_list(
      "Unbound Gravel 200 2027-05-30\n\n  Local crit (June 7)\nSBT GRVL - Jun 28, 2027\nMid South March 14 2027",
    )
    .unwrap();

    assert_eq!(
      races,
      vec![
        RaceEntry {
          name: "Unbound Gravel 200".to_string(),
          date: NaiveDate::from_ymd_opt(2027, 5, 30),
        },
        RaceEntry {
          name: "Local crit June 7".to_string(),
          date: None,
        },
        RaceEntry {
          name: "SBT GRVL".to_string(),
          date: NaiveDate::from_ymd_opt(2027, 6, 28),
        },
        RaceEntry {
          name: "Mid South".to_string(),
          date: NaiveDate::from_ymd_opt(2027, 3, 14),
        },
      ]
    );
    assert!(parse_race_list("").unwrap().is_empty());
  }

  #[test]
  fn test_parse_race_list_rejects_impossible_dates() {
    assert!(matches!(
      parse_race_list("Unbound 2027-02-30"),
      Err(IntakeError::InvalidValue { field, .. }) if field == "race_list"
    ));
    assert!(parse_race_list("Unbound Feb 30, 2027").is_err());
  }

  #[test]
  fn test_race_list_anchors_event_date() {
    let mut form = sample_form();
    form.race_date = None;
    form.race_list = Some("Unbound Gravel 200 2027-05-30".to_string());
    let profile = form.to_profile().unwrap();
    assert_eq!(profile.target_event_date, NaiveDate::from_ymd_opt(2027, 5, 30));

    // An undated list falls back to race_date
    let mut form = sample_form();
    form.race_list = Some("Some gravel race".to_string());
    let profile = form.to_profile().unwrap();
    assert_eq!(profile.target_event_date, NaiveDate::from_ymd_opt(2027, 4, 2));
  }

  #[test]
  fn test_bad_duration_names_field() {
    let mut form = sample_form();
    form.extra.insert("saturday_duration".to_string(), json!("all day"));
    assert_eq!(
      form.to_profile().unwrap_err(),
      IntakeError::invalid("saturday_duration", "all day")
    );
  }

  #[test]
  fn test_explicit_athlete_id_wins() {
    let mut form = sample_form();
    form.athlete_id = Some("rider-042".to_string());
    assert_eq!(form.to_profile().unwrap().athlete_id.as_deref(), Some("rider-042"));
  }

  #[test]
  fn test_bad_race_date_and_long_day() {
    let mut form = sample_form();
    form.race_date = Some("April 2".to_string());
    assert!(matches!(
      form.to_profile(),
      Err(IntakeError::InvalidValue { field, .. }) if field == "race_date"
    ));

    let mut form = sample_form();
    form.preferred_long_day = Some("someday".to_string());
    assert!(matches!(
      form.to_profile(),
      Err(IntakeError::InvalidValue { field, .. }) if field == "preferred_long_day"
    ));
  }
}
