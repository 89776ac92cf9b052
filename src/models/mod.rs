pub mod plan;
pub mod profile;

pub use plan::{
  Degradation, DerivedPlan, HoursBand, InjuryScreen, MovementPattern, Phase, PhaseBlock,
  PhaseTimeline, Session, SessionRequirements, SessionType, StrengthBlock, StrengthBlockSpan,
  Tier, WeeklyStructure,
};
pub use profile::{
  AthleteProfile, Day, DayAvailability, EquipmentTier, ExperienceLevel, GoalType,
  StrengthInterest, TimeSlot, WeeklyHoursRange,
};
