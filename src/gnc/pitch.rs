use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Pitch-rate schedule for the takeoff attitude channel
// ---------------------------------------------------------------------------

/// Active law of the commanded angle-of-attack rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchMode {
    /// Attitude fixed by the runway (before rotation, braking roll)
    Fixed,
    /// Pitching up after rotation speed
    Rising,
    /// Attitude frozen once the lift coefficient threshold is reached
    Holding,
    /// Attitude changed at the reduction rate after the hold
    Reducing,
    /// Lift trimmed to the flight-path load; attitude follows the trim
    Trimmed,
}

impl fmt::Display for PitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PitchMode::Fixed => "fixed",
            PitchMode::Rising => "rising",
            PitchMode::Holding => "holding",
            PitchMode::Reducing => "reducing",
            PitchMode::Trimmed => "trimmed",
        };
        f.write_str(name)
    }
}

/// Commanded angle-of-attack rate as a function of mode and attitude.
///
/// - Rising: `alpha_dot_initial * (1 - k_alpha * alpha)`
/// - Reducing: `reduction_rate` (signed, negative lowers the nose)
/// - every other mode: zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSchedule {
    pub alpha_dot_initial: f64, // rad/s
    pub k_alpha: f64,           // 1/rad
    pub reduction_rate: f64,    // rad/s
}

impl PitchSchedule {
    pub fn new(alpha_dot_initial: f64, k_alpha: f64, reduction_rate: f64) -> Self {
        Self { alpha_dot_initial, k_alpha, reduction_rate }
    }

    /// Schedule that reaches the lift-off attitude from `alpha_ground` in
    /// `dt_rotation` seconds at the initial rate.
    pub fn rotating_to(
        alpha_ground: f64,
        alpha_lift_off: f64,
        dt_rotation: f64,
        k_alpha: f64,
        reduction_rate: f64,
    ) -> Self {
        Self::new((alpha_lift_off - alpha_ground) / dt_rotation, k_alpha, reduction_rate)
    }

    pub fn alpha_dot(&self, mode: PitchMode, alpha: f64) -> f64 {
        match mode {
            PitchMode::Rising => self.alpha_dot_initial * (1.0 - self.k_alpha * alpha),
            PitchMode::Reducing => self.reduction_rate,
            PitchMode::Fixed | PitchMode::Holding | PitchMode::Trimmed => 0.0,
        }
    }
}

/// Angle of attack at which `CL = CLmax / k_lift_off^2`, i.e. the attitude
/// that lifts the aircraft off at `k_lift_off` times the stall speed.
pub fn lift_off_attitude(aircraft: &Aircraft, k_lift_off: f64) -> f64 {
    aircraft.alpha_for_lift_coefficient(aircraft.cl_max / (k_lift_off * k_lift_off))
}
