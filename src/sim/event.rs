use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Guard vocabulary
// ---------------------------------------------------------------------------

/// Phase boundaries a run can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Speed reaches the failure speed; one engine is lost.
    EngineFailure,
    /// Speed reaches the rotation speed; pitch-up begins.
    Rotation,
    /// Load factor rises through one while rotating.
    LiftOff,
    /// Lift coefficient reaches the hold threshold.
    BarHold,
    /// Attitude hold expires.
    EndHold,
    /// Load factor falls back through one; lift is trimmed from here on.
    SteadyClimb,
    /// Altitude reaches the screen height.
    ObstacleClearance,
    /// Reaction delay after failure (or touchdown free roll) has elapsed.
    BrakeActivation,
    /// Speed reaches zero.
    FullStop,
    /// Altitude falls through zero while airborne.
    GroundImpact,
    /// Caller-requested altitude crossing.
    TargetAltitude,
    /// Altitude falls through the flare height on the approach.
    Flare,
    /// Main gear reaches the runway at the end of the flare.
    TouchDown,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::EngineFailure => "engine failure",
            EventKind::Rotation => "rotation",
            EventKind::LiftOff => "lift-off",
            EventKind::BarHold => "bar hold",
            EventKind::EndHold => "end of hold",
            EventKind::SteadyClimb => "steady climb",
            EventKind::ObstacleClearance => "obstacle clearance",
            EventKind::BrakeActivation => "brake activation",
            EventKind::FullStop => "full stop",
            EventKind::GroundImpact => "ground impact",
            EventKind::TargetAltitude => "target altitude",
            EventKind::Flare => "flare",
            EventKind::TouchDown => "touchdown",
        };
        f.write_str(name)
    }
}

/// Sign convention of a guard crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventDirection {
    /// Guard value goes up through zero
    Rising,
    Falling,
    /// Either way; used for target altitudes
    #[default]
    Any,
}

/// What the integrator does once a guard has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventAction {
    /// Terminal event for the run
    Stop,
    /// Apply bookkeeping and keep integrating
    #[default]
    Continue,
}

/// A zero-crossing guard. The guard function itself is evaluated by the run
/// context that owns it; a guard fires at most once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventGuard {
    pub kind: EventKind,
    pub direction: EventDirection,
    pub action: EventAction,
    /// Root tolerance on time, s
    pub tolerance: f64,
}

impl EventGuard {
    pub fn new(kind: EventKind, direction: EventDirection, action: EventAction) -> Self {
        Self { kind, direction, action, tolerance: 1e-9 }
    }

    pub fn rising(kind: EventKind) -> Self {
        Self::new(kind, EventDirection::Rising, EventAction::Continue)
    }

    pub fn falling(kind: EventKind) -> Self {
        Self::new(kind, EventDirection::Falling, EventAction::Continue)
    }

    pub fn terminal(mut self) -> Self {
        self.action = EventAction::Stop;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.action == EventAction::Stop
    }
}

/// Whether a guard moving from `g_old` to `g_new` over one accepted step has
/// crossed zero the way `direction` asks for.
///
/// Reaching zero exactly counts. A guard that sits on zero when it is armed
/// (a zero delay timer, say) fires as soon as it moves off zero in its own
/// direction. An `Any` guard has no direction to leave by, so it must cross.
pub fn sign_change_detected(g_old: f64, g_new: f64, direction: EventDirection) -> bool {
    if g_old == 0.0 {
        return match direction {
            EventDirection::Rising => g_new > 0.0,
            EventDirection::Falling => g_new < 0.0,
            EventDirection::Any => false,
        };
    }
    match direction {
        EventDirection::Rising => g_old < 0.0 && g_new >= 0.0,
        EventDirection::Falling => g_old > 0.0 && g_new <= 0.0,
        EventDirection::Any => g_old * g_new <= 0.0,
    }
}

// ---------------------------------------------------------------------------
// Crossing location
// ---------------------------------------------------------------------------

/// A guard crossing bracketed by one accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub t0: f64,
    pub t1: f64,
    pub g0: f64,
    pub g1: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateError {
    #[error("guard does not change sign on [{t0}, {t1}] (g = {g0} .. {g1})")]
    NotBracketed { t0: f64, t1: f64, g0: f64, g1: f64 },
    #[error("crossing not resolved after {iterations} iterations, last estimate t = {t}")]
    NoConvergence { t: f64, iterations: usize },
}

/// Locates guard crossings in time with Brent's method (interpolation steps
/// fall back to bisection whenever they stop shrinking the bracket).
#[derive(Debug, Clone, Copy)]
pub struct CrossingLocator {
    /// Half-width of the final bracket, s
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for CrossingLocator {
    fn default() -> Self {
        Self { tolerance: 1e-12, max_iterations: 50 }
    }
}

impl CrossingLocator {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self { tolerance, max_iterations }
    }

    /// Time at which `guard` vanishes inside `bracket`.
    pub fn locate<G>(&self, mut guard: G, bracket: Bracket) -> Result<f64, LocateError>
    where
        G: FnMut(f64) -> f64,
    {
        let Bracket { t0, t1, g0, g1 } = bracket;
        if g0 == 0.0 {
            return Ok(t0);
        }
        if g1 == 0.0 {
            return Ok(t1);
        }
        if g0.signum() == g1.signum() {
            return Err(LocateError::NotBracketed { t0, t1, g0, g1 });
        }

        // `now` is the best estimate, `prev` the one before it and `far`
        // the end that keeps the crossing bracketed against `now`.
        let (mut prev, mut g_prev) = (t0, g0);
        let (mut now, mut g_now) = (t1, g1);
        let (mut far, mut g_far) = (t1, g1);
        let mut step = now - prev;
        let mut last_step = step;

        for _ in 0..self.max_iterations {
            if g_now.signum() == g_far.signum() {
                far = prev;
                g_far = g_prev;
                step = now - prev;
                last_step = step;
            }
            if g_far.abs() < g_now.abs() {
                prev = now;
                now = far;
                far = prev;
                g_prev = g_now;
                g_now = g_far;
                g_far = g_prev;
            }

            let slack = 2.0 * f64::EPSILON * now.abs() + 0.5 * self.tolerance;
            let half = 0.5 * (far - now);
            if half.abs() <= slack || g_now == 0.0 {
                return Ok(now);
            }

            if last_step.abs() >= slack && g_prev.abs() > g_now.abs() {
                let s = g_now / g_prev;
                let (mut p, mut q) = if prev == far {
                    // secant
                    (2.0 * half * s, 1.0 - s)
                } else {
                    // inverse quadratic through prev, now and far
                    let q = g_prev / g_far;
                    let r = g_now / g_far;
                    (
                        s * (2.0 * half * q * (q - r) - (now - prev) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let bound = (3.0 * half * q - (slack * q).abs()).min((last_step * q).abs());
                if 2.0 * p < bound {
                    last_step = step;
                    step = p / q;
                } else {
                    step = half;
                    last_step = step;
                }
            } else {
                step = half;
                last_step = step;
            }

            prev = now;
            g_prev = g_now;
            now += if step.abs() > slack { step } else { slack.copysign(half) };
            g_now = guard(now);
        }

        Err(LocateError::NoConvergence { t: now, iterations: self.max_iterations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bracket<G: Fn(f64) -> f64>(g: G, t0: f64, t1: f64) -> Bracket {
        Bracket { t0, t1, g0: g(t0), g1: g(t1) }
    }

    #[test]
    fn locates_smooth_crossing() {
        let locator = CrossingLocator::new(1e-14, 100);
        let g = |t: f64| t * t - 2.0;
        let root = locator.locate(g, bracket(g, 0.0, 2.0)).unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_unbracketed_guard() {
        let locator = CrossingLocator::default();
        let g = |t: f64| t * t + 1.0;
        let err = locator.locate(g, bracket(g, -1.0, 1.0)).unwrap_err();
        assert!(matches!(err, LocateError::NotBracketed { .. }));
    }

    #[test]
    fn locates_kinked_guard() {
        // time thresholds and clipped forces give piecewise-linear guards
        let locator = CrossingLocator::new(1e-12, 100);
        let g = |t: f64| if t < 0.3 { -1.0 + t } else { 10.0 * (t - 0.3) - 0.7 };
        let root = locator.locate(g, bracket(g, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(root, 0.37, epsilon = 1e-10);
    }

    #[test]
    fn zero_at_either_end_is_the_crossing() {
        let locator = CrossingLocator::default();
        let g = |t: f64| t - 1.0;
        assert_eq!(locator.locate(g, bracket(g, 1.0, 3.0)).unwrap(), 1.0);
        assert_eq!(locator.locate(g, bracket(g, -1.0, 1.0)).unwrap(), 1.0);
    }

    #[test]
    fn direction_filtering() {
        assert!(sign_change_detected(-1.0, 1.0, EventDirection::Rising));
        assert!(!sign_change_detected(1.0, -1.0, EventDirection::Rising));
        assert!(sign_change_detected(1.0, -1.0, EventDirection::Falling));
        assert!(sign_change_detected(1.0, -1.0, EventDirection::Any));
        assert!(!sign_change_detected(1.0, 2.0, EventDirection::Any));
    }

    #[test]
    fn reaching_zero_counts() {
        assert!(sign_change_detected(-1.0, 0.0, EventDirection::Rising));
        assert!(sign_change_detected(1.0, 0.0, EventDirection::Falling));
        assert!(!sign_change_detected(1.0, 0.0, EventDirection::Rising));
    }

    #[test]
    fn guard_armed_on_zero_fires_when_leaving_in_its_direction() {
        assert!(sign_change_detected(0.0, 0.5, EventDirection::Rising));
        assert!(!sign_change_detected(0.0, -0.5, EventDirection::Rising));
        assert!(sign_change_detected(0.0, -0.5, EventDirection::Falling));
        assert!(!sign_change_detected(0.0, 0.5, EventDirection::Falling));
        assert!(!sign_change_detected(0.0, 0.5, EventDirection::Any));
        assert!(!sign_change_detected(0.0, 0.0, EventDirection::Rising));
    }

    #[test]
    fn guard_builders() {
        let g = EventGuard::falling(EventKind::FullStop).terminal().with_tolerance(1e-10);
        assert!(g.is_terminal());
        assert_eq!(g.direction, EventDirection::Falling);
        assert_eq!(g.tolerance, 1e-10);
    }
}
