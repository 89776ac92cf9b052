//! Weekly structure builder
//!
//! Places key intervals, the long ride, strength and easy rides onto the
//! athlete's seven-day availability. Constraints in priority order; an
//! earlier one is never given up for a later one:
//! 1. Sessions only on usable days, within the day's slot and duration
//! 2. Key sessions spaced with a non-key day between them where possible
//! 3. Long ride on the longest day (ties: am/both slot, preferred day, later weekday)
//! 4. Strength never on a key day
//! 5. Everything else usable gets an easy ride, the rest is rest
//!
//! The search is exhaustive over day subsets (at most 35 for seven days) and
//! every tie is broken by weekday order, so identical input gives identical output.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use crate::config::SessionDurations;
use crate::errors::ScheduleInfeasible;
use crate::models::{
  AthleteProfile, Day, Degradation, Session, SessionRequirements, SessionType, TimeSlot,
  WeeklyStructure,
};

/// ---------------------------------------------------------------------------
/// Usable Days
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct UsableDay {
  day: Day,
  slot: TimeSlot,
  max_minutes: u32,
}

/// Available days with a real slot and room for at least a minimum session
fn usable_days(profile: &AthleteProfile, durations: &SessionDurations) -> Vec<UsableDay> {
  Day::ALL
    .iter()
    .filter_map(|day| {
      let availability = profile.day(*day);
      let usable = availability.is_available
        && availability.time_slot != TimeSlot::None
        && availability.max_duration_minutes >= durations.min_session_minutes.max(1);
      if availability.is_available && !usable {
        tracing::debug!(day = %day, "Available day too constrained to host a session");
      }
      usable.then_some(UsableDay {
        day: *day,
        slot: availability.time_slot,
        max_minutes: availability.max_duration_minutes,
      })
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Subset Search Helpers
/// ---------------------------------------------------------------------------

/// All k-subsets of 0..n in lexicographic order
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
  fn extend(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if current.len() == k {
      out.push(current.clone());
      return;
    }
    for i in start..n {
      if n - i < k - current.len() {
        break;
      }
      current.push(i);
      extend(i + 1, n, k, current, out);
      current.pop();
    }
  }

  let mut out = Vec::new();
  if k <= n {
    extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
  }
  out
}

/// Pairs of selected days that fall on consecutive days, Sunday wrapping to Monday
fn adjacent_pairs(days: &[Day]) -> Vec<(Day, Day)> {
  let mut selected = [false; 7];
  for day in days {
    selected[day.index()] = true;
  }
  if days.len() < 2 {
    return Vec::new();
  }
  Day::ALL
    .iter()
    .filter(|d| selected[d.index()] && selected[d.next().index()])
    .map(|d| (*d, d.next()))
    .collect()
}

/// Smallest cyclic gap in days between selected days (7 for a single day)
fn min_gap(days: &[Day]) -> usize {
  let mut indices: Vec<usize> = days.iter().map(|d| d.index()).collect();
  indices.sort_unstable();
  match indices.as_slice() {
    [] | [_] => 7,
    [first, .., last] => {
      let wrap = 7 - last + first;
      indices
        .windows(2)
        .map(|w| w[1] - w[0])
        .chain(std::iter::once(wrap))
        .min()
        .unwrap_or(7)
    }
  }
}

/// Long ride preference: longer day first, then a morning-capable slot, then
/// the athlete's preferred long day, then the later weekday
fn long_ride_order(a: &UsableDay, b: &UsableDay, preferred: Option<Day>) -> Ordering {
  b.max_minutes
    .cmp(&a.max_minutes)
    .then_with(|| b.slot.allows_morning().cmp(&a.slot.allows_morning()))
    .then_with(|| (preferred == Some(b.day)).cmp(&(preferred == Some(a.day))))
    .then_with(|| b.day.cmp(&a.day))
}

/// Duration and slot only. Days equal here all satisfy the long ride rule;
/// the preference and weekday tie-breaks just pick among them.
fn long_ride_grade(day: &UsableDay) -> (Reverse<u32>, bool) {
  (Reverse(day.max_minutes), !day.slot.allows_morning())
}

/// ---------------------------------------------------------------------------
/// Key Session Placement
/// ---------------------------------------------------------------------------

struct KeyPlacement {
  /// Indices into the usable list
  key_days: Vec<usize>,
  long_ride: Option<usize>,
  adjacent: Vec<(Day, Day)>,
  long_ride_rank: usize,
}

fn place_key_sessions(
  usable: &[UsableDay],
  requirements: &SessionRequirements,
  durations: &SessionDurations,
  preferred_long_day: Option<Day>,
) -> KeyPlacement {
  let k = requirements.key_sessions as usize;

  // Rank of each usable day as a long ride candidate (0 = ideal)
  let mut ranked: Vec<usize> = (0..usable.len()).collect();
  ranked.sort_by(|a, b| long_ride_order(&usable[*a], &usable[*b], preferred_long_day));
  let mut rank = vec![0; usable.len()];
  for (position, idx) in ranked.iter().enumerate() {
    rank[*idx] = position;
  }

  let mut best: Option<(KeyPlacement, (usize, usize, Reverse<usize>, Reverse<usize>))> = None;

  for subset in combinations(usable.len(), k) {
    let days: Vec<Day> = subset.iter().map(|i| usable[*i].day).collect();
    let adjacent = adjacent_pairs(&days);

    let long_ride = if requirements.needs_long_ride {
      subset.iter().copied().min_by_key(|i| rank[*i])
    } else {
      None
    };
    let long_ride_rank = long_ride.map(|i| rank[i]).unwrap_or(0);

    // Interval days that can hold the full target duration
    let full_fit = subset
      .iter()
      .filter(|i| Some(**i) != long_ride)
      .filter(|i| usable[**i].max_minutes >= durations.key_intervals_minutes)
      .count();

    let score = (
      adjacent.len(),
      long_ride_rank,
      Reverse(full_fit),
      Reverse(min_gap(&days)),
    );

    // Strict improvement only, so the lexicographically first subset wins ties
    if best.as_ref().map_or(true, |(_, s)| score < *s) {
      best = Some((
        KeyPlacement {
          key_days: subset,
          long_ride,
          adjacent,
          long_ride_rank,
        },
        score,
      ));
    }
  }

  best.map(|(placement, _)| placement).unwrap_or(KeyPlacement {
    key_days: Vec::new(),
    long_ride: None,
    adjacent: Vec::new(),
    long_ride_rank: 0,
  })
}

/// ---------------------------------------------------------------------------
/// Strength Placement
/// ---------------------------------------------------------------------------

/// Pick strength days from the non-key candidates: avoid back-to-back
/// strength, avoid the day before a key session, prefer days long enough
/// for the full session
fn place_strength(
  usable: &[UsableDay],
  candidates: &[usize],
  key_days: &[Day],
  count: usize,
  durations: &SessionDurations,
) -> Vec<usize> {
  let count = count.min(candidates.len());
  if count == 0 {
    return Vec::new();
  }

  let mut best: Option<(Vec<usize>, (usize, usize, Reverse<usize>))> = None;

  for subset in combinations(candidates.len(), count) {
    let chosen: Vec<usize> = subset.iter().map(|i| candidates[*i]).collect();
    let days: Vec<Day> = chosen.iter().map(|i| usable[*i].day).collect();

    let back_to_back = adjacent_pairs(&days).len();
    let before_key = days.iter().filter(|d| key_days.contains(&d.next())).count();
    let full_fit = chosen
      .iter()
      .filter(|i| usable[**i].max_minutes >= durations.strength_minutes)
      .count();

    let score = (back_to_back, before_key, Reverse(full_fit));
    if best.as_ref().map_or(true, |(_, s)| score < *s) {
      best = Some((chosen, score));
    }
  }

  best.map(|(chosen, _)| chosen).unwrap_or_default()
}

/// ---------------------------------------------------------------------------
/// Session Construction
/// ---------------------------------------------------------------------------

fn key_interval_session(day: &UsableDay, durations: &SessionDurations) -> Session {
  Session {
    session_type: SessionType::KeyIntervals,
    time_slot: morning_first(day.slot),
    duration_minutes: day.max_minutes.min(durations.key_intervals_minutes),
    is_key: true,
  }
}

fn long_ride_session(day: &UsableDay) -> Session {
  Session {
    session_type: SessionType::LongRide,
    time_slot: morning_first(day.slot),
    duration_minutes: day.max_minutes,
    is_key: true,
  }
}

fn strength_session(day: &UsableDay, durations: &SessionDurations) -> Session {
  let time_slot = match day.slot {
    TimeSlot::Both => TimeSlot::Pm,
    slot => slot,
  };
  Session {
    session_type: SessionType::Strength,
    time_slot,
    duration_minutes: day.max_minutes.min(durations.strength_minutes),
    is_key: false,
  }
}

fn easy_ride_session(day: &UsableDay, durations: &SessionDurations) -> Session {
  Session {
    session_type: SessionType::EasyRide,
    time_slot: day.slot,
    duration_minutes: day.max_minutes.min(durations.easy_ride_minutes),
    is_key: false,
  }
}

/// Key work starts in the morning when the day allows it
fn morning_first(slot: TimeSlot) -> TimeSlot {
  match slot {
    TimeSlot::Both => TimeSlot::Am,
    slot => slot,
  }
}

/// ---------------------------------------------------------------------------
/// Builder
/// ---------------------------------------------------------------------------

/// Assign one session to every weekday.
///
/// Fails when there are fewer usable days than required key sessions.
/// Spacing, long ride displacement and dropped strength sessions are
/// recorded as degradations on the result.
pub fn build_weekly_structure(
  profile: &AthleteProfile,
  requirements: &SessionRequirements,
  durations: &SessionDurations,
) -> Result<WeeklyStructure, ScheduleInfeasible> {
  let usable = usable_days(profile, durations);
  let required = requirements.key_sessions;
  let available = usable.len() as u32;

  if available < required {
    return Err(ScheduleInfeasible::InsufficientAvailability {
      required,
      available,
      shortfall: required - available,
    });
  }

  let placement = place_key_sessions(&usable, requirements, durations, profile.preferred_long_day);
  let key_days: Vec<Day> = placement.key_days.iter().map(|i| usable[*i].day).collect();

  let candidates: Vec<usize> = (0..usable.len())
    .filter(|i| !placement.key_days.contains(i))
    .collect();
  let requested_strength = requirements.strength_sessions as usize;
  let strength = place_strength(&usable, &candidates, &key_days, requested_strength, durations);

  let mut days: BTreeMap<Day, Session> = Day::ALL.iter().map(|d| (*d, Session::rest())).collect();
  for (idx, day) in usable.iter().enumerate() {
    let session = if placement.long_ride == Some(idx) {
      long_ride_session(day)
    } else if placement.key_days.contains(&idx) {
      key_interval_session(day, durations)
    } else if strength.contains(&idx) {
      strength_session(day, durations)
    } else {
      easy_ride_session(day, durations)
    };
    days.insert(day.day, session);
  }

  let mut degradations = Vec::new();

  if !placement.adjacent.is_empty() {
    tracing::warn!(
      pairs = ?placement.adjacent,
      usable_days = available,
      "Key sessions placed on consecutive days"
    );
    degradations.push(Degradation::AdjacentKeySessions {
      pairs: placement.adjacent.clone(),
    });
  }

  if let Some(long_idx) = placement.long_ride.filter(|_| placement.long_ride_rank > 0) {
    let placed = &usable[long_idx];
    let best = usable
      .iter()
      .min_by(|a, b| long_ride_order(a, b, profile.preferred_long_day))
      .unwrap_or(placed);
    if long_ride_grade(placed) > long_ride_grade(best) {
      tracing::warn!(
        placed_on = %placed.day,
        longest_day = %best.day,
        "Long ride moved off the longest day to keep key sessions spaced"
      );
      degradations.push(Degradation::LongRideDisplaced {
        placed_on: placed.day,
        longest_day: best.day,
      });
    }
  }

  if strength.len() < requested_strength {
    tracing::warn!(
      requested = requested_strength,
      placed = strength.len(),
      "Not enough non-key days for strength"
    );
    degradations.push(Degradation::StrengthReduced {
      requested: requested_strength as u32,
      placed: strength.len() as u32,
    });
  }

  tracing::debug!(
    key_days = ?key_days,
    degraded = !degradations.is_empty(),
    "Weekly structure built"
  );

  Ok(WeeklyStructure { days, degradations })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
