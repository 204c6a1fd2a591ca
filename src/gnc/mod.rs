pub mod controller;
pub mod pitch;

pub use controller::{AttitudeCommand, AttitudeController, ConstantAttitude, FlightPathHold, ScheduledAttitude};
pub use pitch::{lift_off_attitude, PitchMode, PitchSchedule};
