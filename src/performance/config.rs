use serde::{Deserialize, Serialize};

use crate::error::{PerformanceError, Result};

// ---------------------------------------------------------------------------
// Takeoff
// ---------------------------------------------------------------------------

/// Takeoff procedure and pilot model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffSettings {
    /// Rotation speed over stall speed
    pub k_rotation: f64,
    /// Lift-off speed over stall speed; sets the target rotation attitude
    pub k_lift_off: f64,
    /// Fraction of CL max at which the attitude is held
    pub k_cl_max: f64,
    pub dt_rotation: f64,  // s
    pub dt_hold: f64,      // s
    pub k_alpha_dot: f64,  // 1/rad, pitch-rate decay with attitude
    pub alpha_ground: f64, // rad
    pub obstacle_height: f64, // m
    /// Drag multiplier once an engine has failed
    pub failure_drag_factor: f64,
    /// Failure-to-brakes delay of an aborted takeoff, s
    pub reaction_delay: f64,
    /// Signed attitude rate after the hold, rad/s
    pub alpha_reduction_rate: f64,
    pub throttle: f64,
    /// Runway pressure altitude, m
    pub altitude: f64,
}

impl Default for TakeoffSettings {
    fn default() -> Self {
        Self {
            k_rotation: 1.05,
            k_lift_off: 1.1,
            k_cl_max: 0.8,
            dt_rotation: 3.0,
            dt_hold: 0.5,
            k_alpha_dot: 0.06_f64.to_degrees(),
            alpha_ground: 0.0,
            obstacle_height: 10.7,
            failure_drag_factor: 1.1,
            reaction_delay: 3.0,
            alpha_reduction_rate: 0.0,
            throttle: 1.0,
            altitude: 0.0,
        }
    }
}

impl TakeoffSettings {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("k_rotation", self.k_rotation),
            ("k_lift_off", self.k_lift_off),
            ("k_cl_max", self.k_cl_max),
            ("dt_rotation", self.dt_rotation),
            ("obstacle_height", self.obstacle_height),
            ("throttle", self.throttle),
        ];
        for (what, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PerformanceError::config(format!("{} must be positive, got {}", what, value)));
            }
        }
        let non_negative = [
            ("dt_hold", self.dt_hold),
            ("k_alpha_dot", self.k_alpha_dot),
            ("reaction_delay", self.reaction_delay),
            ("failure_drag_factor", self.failure_drag_factor),
        ];
        for (what, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PerformanceError::config(format!("{} must be non-negative, got {}", what, value)));
            }
        }
        if self.k_cl_max >= 1.0 {
            return Err(PerformanceError::config(format!(
                "k_cl_max {} would hold the attitude beyond CL max",
                self.k_cl_max
            )));
        }
        if !self.alpha_ground.is_finite() || !self.alpha_reduction_rate.is_finite() || !self.altitude.is_finite() {
            return Err(PerformanceError::config("attitude, reduction rate and altitude must be finite"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outer loops
// ---------------------------------------------------------------------------

/// Search for the post-hold attitude rate that exits the climb at the target
/// speed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceSettings {
    /// Obstacle speed over stall speed
    pub target_ratio: f64,
    pub tolerance: f64,
    /// Rate increment per iteration, rad/s
    pub step: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceSettings {
    fn default() -> Self {
        Self {
            target_ratio: 1.2,
            tolerance: 0.005,
            step: 0.1_f64.to_radians(),
            max_iterations: 200,
        }
    }
}

impl ConvergenceSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.target_ratio > 1.0 && self.tolerance > 0.0 && self.step > 0.0 && self.max_iterations > 0) {
            return Err(PerformanceError::config(format!(
                "convergence needs target ratio > 1 and positive tolerance, step and iteration bound ({:?})",
                self
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancedFieldSettings {
    /// Failure speeds swept between the lower bound and rotation speed
    pub sweep_points: usize,
    /// Fine grid on which both distance curves are compared
    pub resample_points: usize,
    /// Lowest failure speed over stall speed
    pub lower_speed_factor: f64,
    /// Tune the attitude rate of every continued run
    pub pitch_convergence: bool,
}

impl Default for BalancedFieldSettings {
    fn default() -> Self {
        Self {
            sweep_points: 4,
            resample_points: 1000,
            lower_speed_factor: 0.5,
            pitch_convergence: true,
        }
    }
}

impl BalancedFieldSettings {
    pub fn validate(&self) -> Result<()> {
        if self.sweep_points < 2 || self.resample_points < 2 {
            return Err(PerformanceError::config("sweep and resample grids need at least two points"));
        }
        if !(self.lower_speed_factor > 0.0) {
            return Err(PerformanceError::config("lower_speed_factor must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Landing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingSettings {
    /// Free roll between touchdown and brake application, s
    pub dt_free_roll: f64,
    /// Negative for reverse thrust
    pub throttle: f64,
    /// Runway pressure altitude, m
    pub altitude: f64,
    /// Ground attitude, rad
    pub alpha_ground: f64,
}

impl Default for LandingSettings {
    fn default() -> Self {
        Self { dt_free_roll: 2.0, throttle: 0.0, altitude: 0.0, alpha_ground: 0.0 }
    }
}

impl LandingSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt_free_roll.is_finite() && self.dt_free_roll >= 0.0) {
            return Err(PerformanceError::config("dt_free_roll must be non-negative"));
        }
        if !(self.throttle.is_finite() && self.throttle.abs() <= 1.0) {
            return Err(PerformanceError::config(format!(
                "landing throttle must lie in [-1, 1], got {}",
                self.throttle
            )));
        }
        Ok(())
    }
}

/// Glide and flare from the landing screen height down to touchdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproachSettings {
    /// Approach speed over the stall speed
    pub k_approach: f64,
    /// Glide path angle, rad (negative)
    pub approach_angle: f64,
    /// Screen height the run starts from, m
    pub obstacle_height: f64,
    /// Height at which the flare starts, m
    pub flare_height: f64,
    /// Time for the thrust to reach idle once the flare starts, s
    pub dt_flare: f64,
    /// Attitude rate during the flare, rad/s
    pub flare_rate: f64,
    /// Flare lift coefficient cap as a fraction of CLmax
    pub k_cl_max: f64,
}

impl Default for ApproachSettings {
    fn default() -> Self {
        Self {
            k_approach: 1.23,
            approach_angle: (-3.0_f64).to_radians(),
            obstacle_height: 15.24, // 50 ft
            flare_height: 6.096,    // 20 ft
            dt_flare: 4.0,
            flare_rate: 1.0_f64.to_radians(),
            k_cl_max: 0.9,
        }
    }
}

impl ApproachSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.k_approach.is_finite() && self.k_approach > 1.0) {
            return Err(PerformanceError::config(format!(
                "approach speed factor must exceed 1, got {}",
                self.k_approach
            )));
        }
        if !(self.approach_angle < 0.0 && self.approach_angle > -std::f64::consts::FRAC_PI_4) {
            return Err(PerformanceError::config(format!(
                "approach angle {} rad is not a descent",
                self.approach_angle
            )));
        }
        if !(self.flare_height > 0.0 && self.obstacle_height > self.flare_height) {
            return Err(PerformanceError::config(format!(
                "flare height {} m must lie between the runway and the screen height {} m",
                self.flare_height, self.obstacle_height
            )));
        }
        if !(self.dt_flare.is_finite() && self.dt_flare > 0.0 && self.flare_rate.is_finite()) {
            return Err(PerformanceError::config("flare needs a positive duration and a finite rate"));
        }
        if !(self.k_cl_max > 0.0 && self.k_cl_max <= 1.0) {
            return Err(PerformanceError::config(format!("flare k_cl_max {} outside (0, 1]", self.k_cl_max)));
        }
        Ok(())
    }
}

/// Search for the flare attitude rate that touches down below a sink rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlareConvergenceSettings {
    /// Largest accepted sink rate at touchdown, m/s
    pub target_sink_rate: f64,
    /// Rate increment far from the target, rad/s
    pub coarse_step: f64,
    /// Rate increment within `fine_band` of the target, rad/s
    pub fine_step: f64,
    /// m/s
    pub fine_band: f64,
    pub max_iterations: usize,
}

impl Default for FlareConvergenceSettings {
    fn default() -> Self {
        Self {
            target_sink_rate: 0.508, // 100 ft/min
            coarse_step: 0.1_f64.to_radians(),
            fine_step: 0.02_f64.to_radians(),
            fine_band: 0.254, // 50 ft/min
            max_iterations: 200,
        }
    }
}

impl FlareConvergenceSettings {
    pub fn validate(&self) -> Result<()> {
        let positive = [self.target_sink_rate, self.coarse_step, self.fine_step, self.fine_band];
        if !(positive.iter().all(|v| v.is_finite() && *v > 0.0) && self.max_iterations > 0) {
            return Err(PerformanceError::config(format!(
                "flare search needs positive target, steps, band and iteration bound ({:?})",
                self
            )));
        }
        Ok(())
    }
}
