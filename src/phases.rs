//! Phase planning
//!
//! Partitions the plan length into base/build/peak/taper using the configured
//! proportional weights. The last phase absorbs rounding so the week counts
//! always sum to the plan length, and no phase drops below the tier floor.

use crate::config::PhaseSplit;
use crate::errors::ScheduleInfeasible;
use crate::models::{Phase, PhaseBlock, PhaseTimeline, StrengthBlock, StrengthBlockSpan};

/// Integer division rounding half up
fn round_div(numerator: u32, denominator: u32) -> u32 {
  (2 * numerator + denominator) / (2 * denominator)
}

/// Build the phase timeline. Phases before `starting_phase` are dropped and
/// their share is spread over the remaining phases in proportion to weight.
pub fn build_timeline(
  total_weeks: u32,
  starting_phase: Phase,
  split: &PhaseSplit,
  min_phase_weeks: u32,
) -> Result<PhaseTimeline, ScheduleInfeasible> {
  let phases: Vec<Phase> = Phase::ALL
    .iter()
    .copied()
    .filter(|p| *p >= starting_phase)
    .collect();

  let floor = min_phase_weeks.max(1);
  let required_weeks = floor * phases.len() as u32;
  if total_weeks < required_weeks {
    return Err(ScheduleInfeasible::PlanTooShort {
      total_weeks,
      required_weeks,
      shortfall: required_weeks - total_weeks,
    });
  }

  let weight_sum: u32 = phases.iter().map(|p| split.weight(*p)).sum::<u32>().max(1);
  let last = phases.len() - 1;

  let mut weeks: Vec<u32> = phases[..last]
    .iter()
    .map(|p| round_div(total_weeks * split.weight(*p), weight_sum).max(floor))
    .collect();

  // Leave at least the floor for the last phase, trimming the longest
  // earlier phase first (latest wins ties)
  let mut assigned: u32 = weeks.iter().sum();
  while assigned + floor > total_weeks {
    let Some(idx) = (0..weeks.len())
      .filter(|i| weeks[*i] > floor)
      .max_by_key(|i| (weeks[*i], *i))
    else {
      break;
    };
    weeks[idx] -= 1;
    assigned -= 1;
  }
  weeks.push(total_weeks - assigned);

  let mut start_week = 0;
  let blocks = phases
    .iter()
    .zip(weeks)
    .map(|(phase, weeks)| {
      let block = PhaseBlock {
        phase: *phase,
        start_week,
        weeks,
      };
      start_week += weeks;
      block
    })
    .collect();

  Ok(PhaseTimeline {
    total_weeks,
    phases: blocks,
  })
}

/// Strength block for a one-based week of the plan
pub fn strength_block_for_week(week: u32, plan_weeks: u32) -> StrengthBlock {
  if plan_weeks >= 20 {
    match week {
      0..=6 => StrengthBlock::LearnToLift,
      7..=12 => StrengthBlock::LiftHeavy,
      13..=18 => StrengthBlock::LiftFast,
      _ => StrengthBlock::Maintain,
    }
  } else if plan_weeks >= 12 {
    match week {
      0..=4 => StrengthBlock::LearnToLift,
      5..=8 => StrengthBlock::LiftHeavy,
      9..=10 => StrengthBlock::LiftFast,
      _ => StrengthBlock::Maintain,
    }
  } else {
    match week {
      0..=2 => StrengthBlock::LearnToLift,
      3..=4 => StrengthBlock::LiftHeavy,
      w if w < plan_weeks => StrengthBlock::LiftFast,
      _ => StrengthBlock::Maintain,
    }
  }
}

/// Strength blocks as contiguous spans with zero-based start weeks
pub fn strength_blocks(plan_weeks: u32) -> Vec<StrengthBlockSpan> {
  let mut spans: Vec<StrengthBlockSpan> = Vec::new();

  for week in 0..plan_weeks {
    let block = strength_block_for_week(week + 1, plan_weeks);
    match spans.last_mut() {
      Some(span) if span.block == block => span.weeks += 1,
      _ => spans.push(StrengthBlockSpan {
        block,
        start_week: week,
        weeks: 1,
      }),
    }
  }

  spans
}
