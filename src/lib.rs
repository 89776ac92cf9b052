//! Training plan derivation
//!
//! Athlete intake profile in, tier classification plus phase timeline plus
//! weekly session structure out. Derivation is pure; persistence of the
//! result lives in `store` and is optional.

pub mod classifier;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod intake;
pub mod models;
pub mod phases;
pub mod store;
pub mod weekly;

#[cfg(test)]
mod test_utils;

pub use config::DerivationConfig;
pub use engine::{derive_plan, derive_plan_as_of, PlanEngine};
pub use errors::{ConfigError, IntakeError, PlanError, ScheduleInfeasible, StoreError};
pub use intake::IntakeForm;
pub use models::{AthleteProfile, DerivedPlan};
