pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod performance;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use error::{Branch, PerformanceError, Result};
pub use performance::{
    compute_balanced_field_length, run_aborted_takeoff, run_continued_takeoff, run_free_trajectory,
    run_landing, run_landing_ground_roll,
};
pub use sim::TrajectoryRecord;
