use crate::dynamics::state::{point_mass, PointMassState};

/// Attitude and throttle for the free point-mass equations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeCommand {
    pub alpha: f64,    // rad
    pub bank: f64,     // rad
    pub throttle: f64, // fraction of static thrust per engine
}

/// Trait for attitude controllers of a free trajectory.
///
/// Controllers are pure functions of time and state: the integrator may call
/// them several times per step and on rejected trial steps.
pub trait AttitudeController: Send + Sync {
    fn command(&self, t: f64, state: &PointMassState) -> AttitudeCommand;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Holds one command for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantAttitude(pub AttitudeCommand);

impl AttitudeController for ConstantAttitude {
    fn command(&self, _t: f64, _state: &PointMassState) -> AttitudeCommand {
        self.0
    }

    fn name(&self) -> &str {
        "constant"
    }
}

// ---------------------------------------------------------------------------
// Time schedule
// ---------------------------------------------------------------------------

/// Command linearly interpolated between time breakpoints, held constant
/// outside them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAttitude {
    points: Vec<(f64, AttitudeCommand)>,
}

impl ScheduledAttitude {
    /// Breakpoints are sorted by time; an empty schedule commands zero.
    pub fn new(mut points: Vec<(f64, AttitudeCommand)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }
}

impl AttitudeController for ScheduledAttitude {
    fn command(&self, t: f64, _state: &PointMassState) -> AttitudeCommand {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return AttitudeCommand::default();
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        let i = self.points.partition_point(|p| p.0 <= t);
        let (t0, a) = self.points[i - 1];
        let (t1, b) = self.points[i];
        let w = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
        AttitudeCommand {
            alpha: a.alpha + (b.alpha - a.alpha) * w,
            bank: a.bank + (b.bank - a.bank) * w,
            throttle: a.throttle + (b.throttle - a.throttle) * w,
        }
    }

    fn name(&self) -> &str {
        "scheduled"
    }
}

/// Levels the wings and holds the flight-path angle near a target by
/// adjusting angle of attack proportionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightPathHold {
    pub trim_alpha: f64,   // rad
    pub target_gamma: f64, // rad
    pub gain: f64,         // rad of alpha per rad of gamma error
    pub alpha_limit: f64,  // rad
    pub throttle: f64,
}

impl AttitudeController for FlightPathHold {
    fn command(&self, _t: f64, state: &PointMassState) -> AttitudeCommand {
        let error = self.target_gamma - state[point_mass::GAMMA];
        let alpha = (self.trim_alpha + self.gain * error).clamp(-self.alpha_limit, self.alpha_limit);
        AttitudeCommand { alpha, bank: 0.0, throttle: self.throttle }
    }

    fn name(&self) -> &str {
        "flight-path hold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cmd(alpha: f64, bank: f64, throttle: f64) -> AttitudeCommand {
        AttitudeCommand { alpha, bank, throttle }
    }

    #[test]
    fn schedule_interpolates_and_holds_ends() {
        let sched = ScheduledAttitude::new(vec![(10.0, cmd(0.2, 0.0, 0.5)), (0.0, cmd(0.0, 0.4, 1.0))]);
        let y = PointMassState::zeros();
        assert_eq!(sched.command(-1.0, &y), cmd(0.0, 0.4, 1.0));
        assert_eq!(sched.command(20.0, &y), cmd(0.2, 0.0, 0.5));
        let mid = sched.command(5.0, &y);
        assert_relative_eq!(mid.alpha, 0.1);
        assert_relative_eq!(mid.bank, 0.2);
        assert_relative_eq!(mid.throttle, 0.75);
    }

    #[test]
    fn empty_schedule_is_neutral() {
        let sched = ScheduledAttitude::new(Vec::new());
        assert_eq!(sched.command(1.0, &PointMassState::zeros()), AttitudeCommand::default());
    }

    #[test]
    fn path_hold_pitches_up_below_target() {
        let hold = FlightPathHold { trim_alpha: 0.05, target_gamma: 0.1, gain: 2.0, alpha_limit: 0.25, throttle: 1.0 };
        let mut y = PointMassState::zeros();
        assert_relative_eq!(hold.command(0.0, &y).alpha, 0.25);
        y[point_mass::GAMMA] = 0.1;
        assert_relative_eq!(hold.command(0.0, &y).alpha, 0.05);
        assert_eq!(hold.name(), "flight-path hold");
    }
}
