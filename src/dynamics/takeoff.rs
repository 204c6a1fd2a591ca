use crate::dynamics::balance::{balance_for, Loads};
use crate::dynamics::state::{ground, Phase, TakeoffState};
use crate::gnc::{PitchMode, PitchSchedule};
use crate::physics::aerodynamics::dynamic_pressure;
use crate::physics::{AeroQuery, ForceModel, ThrustQuery};
use crate::sim::recorder::{DerivedQuantities, SampleState};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Discrete regime of a takeoff run
// ---------------------------------------------------------------------------

/// Everything besides the continuous state that selects the right-hand side.
/// Changed only by fired guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regime {
    pub phase: Phase,
    pub pitch: PitchMode,
    pub engine_failed: bool,
}

impl Default for Regime {
    fn default() -> Self {
        Self { phase: Phase::GroundRoll, pitch: PitchMode::Fixed, engine_failed: false }
    }
}

// ---------------------------------------------------------------------------
// Takeoff equations of motion
// ---------------------------------------------------------------------------

/// Takeoff equations of motion over `[s, V, gamma, h, alpha]`.
///
/// Forces:
///   1. Thrust: all engines, one less after failure, idle once braking
///   2. Lift: from the attitude, or trimmed to `W cos gamma` in climb-out
///   3. Drag: polar with ground effect, scaled after an engine failure
///   4. Friction: `mu (W - L)` on the runway, rolling or braking
#[derive(Clone, Copy)]
pub struct TakeoffDynamics<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    pub schedule: PitchSchedule,
    pub failure_drag_factor: f64,
    pub throttle: f64,
    pub elevation: f64, // m
}

impl<'a> TakeoffDynamics<'a> {
    /// Forces, coefficients and rates at `(t, y)` in `regime`.
    pub fn evaluate(&self, regime: Regime, t: f64, y: &TakeoffState) -> DerivedQuantities {
        let ac = self.aircraft;
        let speed = y[ground::SPEED];
        let gamma = y[ground::GAMMA];
        let height = y[ground::ALTITUDE];
        let alpha = y[ground::AUX];
        let weight = ac.weight();

        let aero = AeroQuery {
            speed,
            alpha,
            flight_path_angle: gamma,
            altitude: height,
            elevation: self.elevation,
            t,
        };
        let q_s = dynamic_pressure(self.model.density(aero.pressure_altitude()), speed)
            * self.model.reference_area();
        let cl = if regime.pitch == PitchMode::Trimmed && q_s > 0.0 {
            weight * gamma.cos() / q_s
        } else {
            self.model.lift_coefficient(&aero)
        };
        let cd = self.model.drag_coefficient(&aero, cl);
        let lift = q_s * cl;
        let drag_factor = if regime.engine_failed { self.failure_drag_factor } else { 1.0 };
        let drag = q_s * cd * drag_factor;

        let engines = match regime.phase {
            Phase::BrakingRoll | Phase::Stopped => 0,
            _ if regime.engine_failed => ac.engine_count.saturating_sub(1),
            _ => ac.engine_count,
        };
        let thrust = self.model.thrust(&ThrustQuery {
            speed,
            flight_path_angle: gamma,
            t,
            altitude: aero.pressure_altitude(),
            phase: regime.phase,
            engines,
            throttle: self.throttle,
        });

        let mu = match regime.phase {
            Phase::GroundRoll | Phase::Rotation => self.model.friction_rolling(speed),
            Phase::BrakingRoll | Phase::Stopped => self.model.friction_braking(speed),
            Phase::Airborne | Phase::ClimbOut | Phase::Approach | Phase::Flare => 0.0,
        };
        let friction = mu * (weight - lift).max(0.0);

        let loads = Loads {
            thrust,
            lift,
            drag,
            friction,
            weight,
            mass: ac.mass,
            alpha,
            gamma,
            speed,
        };
        let response = balance_for(regime.phase)(&loads);
        let alpha_dot = match regime.phase {
            Phase::Stopped => 0.0,
            _ => self.schedule.alpha_dot(regime.pitch, alpha),
        };

        DerivedQuantities {
            thrust,
            lift,
            drag,
            friction,
            total_force: response.total_force,
            mass: ac.mass,
            weight,
            load_factor: lift / (weight * gamma.cos()),
            acceleration: response.speed_dot,
            alpha,
            pitch: alpha + gamma,
            cl,
            cd,
            alpha_dot,
            gamma_dot: response.gamma_dot,
            rate_of_climb: speed * gamma.sin(),
        }
    }

    pub fn derivatives(&self, regime: Regime, t: f64, y: &TakeoffState) -> TakeoffState {
        if regime.phase == Phase::Stopped {
            return TakeoffState::zeros();
        }
        let d = self.evaluate(regime, t, y);
        let speed = y[ground::SPEED];
        let gamma = y[ground::GAMMA];
        TakeoffState::new(
            speed * gamma.cos(),
            d.acceleration,
            d.gamma_dot,
            speed * gamma.sin(),
            d.alpha_dot,
        )
    }
}

/// Integrated quantities of a takeoff state as recorded.
pub fn sample_state(y: &TakeoffState) -> SampleState {
    SampleState {
        ground_distance: y[ground::DISTANCE],
        speed: y[ground::SPEED],
        flight_path_angle: y[ground::GAMMA],
        altitude: y[ground::ALTITUDE],
        ..Default::default()
    }
}
