//! Profile classification
//!
//! Maps profile attributes to a tier, a starting phase, a plan length and an
//! exercise-exclusion set. Key principles:
//! - Tier depends only on experience, weekly hours and goal
//! - Return-from-injury always lands in the lowest tier
//! - Injury screening excludes a movement only on an explicit keyword match

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::config::{DerivationConfig, PlanLengthBounds, TierHourBands};
use crate::errors::ScheduleInfeasible;
use crate::models::{
  AthleteProfile, ExperienceLevel, GoalType, InjuryScreen, MovementPattern, Phase,
  SessionRequirements, StrengthInterest, Tier, WeeklyHoursRange,
};

// ---------------------------------------------------------------------------
/// Tier Derivation
// ---------------------------------------------------------------------------

/// Base tier from the weekly-hours midpoint
pub fn tier_from_hours(hours: &WeeklyHoursRange, bands: &TierHourBands) -> Tier {
  let midpoint = hours.midpoint();
  if midpoint > bands.podium_above_hours {
    Tier::Podium
  } else if midpoint >= bands.compete_min_hours {
    Tier::Compete
  } else if midpoint >= bands.finisher_min_hours {
    Tier::Finisher
  } else {
    Tier::Ayahuasca
  }
}

/// Tier from (experience, hours, goal). Availability and equipment never enter.
pub fn classify_tier(
  experience: ExperienceLevel,
  hours: &WeeklyHoursRange,
  goal: GoalType,
  bands: &TierHourBands,
) -> Tier {
  if goal == GoalType::ReturnFromInjury {
    return Tier::Ayahuasca;
  }

  let base = tier_from_hours(hours, bands);
  match experience {
    ExperienceLevel::Novice => base.step_down(),
    ExperienceLevel::Elite => base.step_up(),
    ExperienceLevel::Intermediate | ExperienceLevel::Advanced => base,
  }
}

/// Experienced, uninjured athletes skip base and start in build
pub fn starting_phase(profile: &AthleteProfile) -> Phase {
  let experienced = matches!(
    profile.experience_level,
    ExperienceLevel::Advanced | ExperienceLevel::Elite
  );
  if experienced && !profile.is_injured() {
    Phase::Build
  } else {
    Phase::Base
  }
}

// ---------------------------------------------------------------------------
/// Plan Length
// ---------------------------------------------------------------------------

/// Whole weeks from `today` to the event, bounded by config.
/// Events beyond `max_weeks` are clamped; the plan simply starts later.
pub fn plan_length(
  event_date: Option<NaiveDate>,
  today: NaiveDate,
  bounds: &PlanLengthBounds,
) -> Result<u32, ScheduleInfeasible> {
  let Some(event_date) = event_date else {
    return Ok(bounds.default_weeks);
  };

  let days = (event_date - today).num_days();
  if days < 0 {
    return Err(ScheduleInfeasible::EventInPast { event_date, today });
  }

  let weeks = (days / 7) as u32;
  if weeks < bounds.min_weeks {
    return Err(ScheduleInfeasible::EventTooSoon {
      weeks_until_event: weeks,
      min_weeks: bounds.min_weeks,
      shortfall: bounds.min_weeks - weeks,
    });
  }

  if weeks > bounds.max_weeks {
    tracing::warn!(
      weeks_until_event = weeks,
      max_weeks = bounds.max_weeks,
      "Event beyond maximum plan length, clamping"
    );
    return Ok(bounds.max_weeks);
  }

  Ok(weeks)
}

// ---------------------------------------------------------------------------
/// Session Requirements
// ---------------------------------------------------------------------------

/// Tier defaults with the athlete's strength interest applied
pub fn session_requirements(
  tier: Tier,
  interest: StrengthInterest,
  config: &DerivationConfig,
) -> SessionRequirements {
  let req = config.tier(tier);
  let strength_sessions = match interest {
    StrengthInterest::NotInterested => 0,
    StrengthInterest::Willing => req.strength_sessions.min(1),
    StrengthInterest::Eager => req.strength_sessions,
  };

  SessionRequirements {
    key_sessions: req.key_sessions,
    needs_long_ride: req.needs_long_ride,
    strength_sessions,
  }
}

// ---------------------------------------------------------------------------
/// Injury Screening
// ---------------------------------------------------------------------------

/// Movement vocabulary. Phrases are matched as whole-token sequences after
/// lowercasing and splitting on anything that is not a letter or digit.
const MOVEMENT_VOCABULARY: &[(MovementPattern, &[&str])] = &[
  (
    MovementPattern::Squat,
    &["squat", "squats", "squatting", "deep squat", "knee", "knees", "patellar"],
  ),
  (
    MovementPattern::Hinge,
    &[
      "hinge", "hip hinge", "deadlift", "deadlifts", "lower back", "low back",
      "hamstring", "hamstrings", "sciatica", "herniated disc",
    ],
  ),
  (
    MovementPattern::OverheadPress,
    &[
      "overhead", "overhead press", "shoulder", "shoulders", "rotator cuff",
      "push up", "push ups", "pushup", "pushups", "bench press",
    ],
  ),
  (
    MovementPattern::SingleLeg,
    &[
      "single leg", "single leg balance", "lunge", "lunges", "step up",
      "step ups", "ankle", "ankles",
    ],
  ),
  (
    MovementPattern::Plyometric,
    &[
      "plyometric", "plyometrics", "plyo", "jump", "jumps", "jumping",
      "high impact", "achilles", "shin splints", "stress fracture",
    ],
  ),
];

fn tokenize(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(str::to_string)
    .collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
  let needle: Vec<&str> = phrase.split(' ').collect();
  tokens
    .windows(needle.len())
    .any(|window| window.iter().zip(&needle).all(|(t, n)| t == n))
}

/// Screen injury/limitation entries. Never fails; entries with no vocabulary
/// match are preserved verbatim and add no exclusion.
pub fn screen_injuries(entries: &[String]) -> InjuryScreen {
  let mut screen = InjuryScreen::default();

  for entry in entries {
    if entry.trim().is_empty() {
      continue;
    }

    let tokens = tokenize(entry);
    let mut matched = false;
    for (pattern, phrases) in MOVEMENT_VOCABULARY {
      for phrase in phrases.iter().filter(|p| contains_phrase(&tokens, p)) {
        screen.exclusions.insert(*pattern);
        screen.matched_terms.insert((*phrase).to_string());
        matched = true;
      }
    }

    if !matched {
      screen.unmatched_notes.push(entry.clone());
    }
  }

  if !screen.exclusions.is_empty() {
    let tags: BTreeSet<&str> = screen.exclusions.iter().map(|p| p.as_str()).collect();
    tracing::debug!(?tags, "Injury screen produced exclusions");
  }

  screen
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
