//! Takeoff, landing and free-flight performance runs built on the
//! event-driven integrator.

pub mod balanced_field;
pub mod config;
pub mod convergence;
pub mod free_flight;
pub mod intersection;
pub mod landing;
pub mod takeoff;

pub use crate::error::Branch;
pub use balanced_field::{compute_balanced_field_length, BalancedField, FailureSpeedSweepPoint};
pub use config::{
    ApproachSettings, BalancedFieldSettings, ConvergenceSettings, FlareConvergenceSettings, LandingSettings,
    TakeoffSettings,
};
pub use convergence::{ConvergenceOutcome, ConvergenceReport, FlareReport};
pub use free_flight::{run_free_trajectory, FreeFlightCase};
pub use landing::{
    run_landing, run_landing_ground_roll, ApproachSummary, LandingCase, LandingResult, LandingSummary,
};
pub use takeoff::{
    run_aborted_takeoff, run_continued_takeoff, EventTimes, ReferenceSpeeds, TakeoffCase, TakeoffResult,
    TakeoffSummary,
};
