use crate::dynamics::state::{point_mass, Phase, PointMassState};
use crate::gnc::{AttitudeCommand, AttitudeController};
use crate::physics::aerodynamics::dynamic_pressure;
use crate::physics::{AeroQuery, ForceModel, ThrustQuery};
use crate::sim::recorder::{DerivedQuantities, SampleState};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Free point-mass flight
// ---------------------------------------------------------------------------

/// Three-degree-of-freedom flight over `[V, gamma, psi, x, y, h]` with
/// attitude and throttle commanded by an [`AttitudeController`].
///
/// ```text
/// V'   = (T cos a - D) / m - g sin gamma
/// g'   = (L + T sin a) cos mu / (m V) - g cos gamma / V
/// psi' = (L + T sin a) sin mu / (m V cos gamma)
/// x'   = V cos gamma cos psi
/// y'   = V cos gamma sin psi
/// h'   = V sin gamma
/// ```
#[derive(Clone, Copy)]
pub struct PointMassDynamics<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    pub controller: &'a dyn AttitudeController,
    pub elevation: f64,
}

/// Below this speed the turn equations are frozen.
const MIN_TURN_SPEED: f64 = 1e-6;

impl<'a> PointMassDynamics<'a> {
    pub fn evaluate(&self, t: f64, y: &PointMassState) -> DerivedQuantities {
        let cmd = self.controller.command(t, y);
        let (d, _) = self.forces(t, y, &cmd);
        d
    }

    fn forces(&self, t: f64, y: &PointMassState, cmd: &AttitudeCommand) -> (DerivedQuantities, f64) {
        let ac = self.aircraft;
        let speed = y[point_mass::SPEED];
        let gamma = y[point_mass::GAMMA];
        let height = y[point_mass::ALTITUDE];
        let weight = ac.weight();

        let aero = AeroQuery {
            speed,
            alpha: cmd.alpha,
            flight_path_angle: gamma,
            altitude: height,
            elevation: self.elevation,
            t,
        };
        let q_s = dynamic_pressure(self.model.density(aero.pressure_altitude()), speed)
            * self.model.reference_area();
        let cl = self.model.lift_coefficient(&aero);
        let cd = self.model.drag_coefficient(&aero, cl);
        let lift = q_s * cl;
        let drag = q_s * cd;
        let thrust = self.model.thrust(&ThrustQuery {
            speed,
            flight_path_angle: gamma,
            t,
            altitude: aero.pressure_altitude(),
            phase: Phase::Airborne,
            engines: ac.engine_count,
            throttle: cmd.throttle,
        });

        let total = thrust * cmd.alpha.cos() - drag - weight * gamma.sin();
        let normal = lift + thrust * cmd.alpha.sin();
        let gamma_dot = if speed > MIN_TURN_SPEED {
            (normal * cmd.bank.cos() - weight * gamma.cos()) / (ac.mass * speed)
        } else {
            0.0
        };
        let derived = DerivedQuantities {
            thrust,
            lift,
            drag,
            friction: 0.0,
            total_force: total,
            mass: ac.mass,
            weight,
            load_factor: normal / weight,
            acceleration: total / ac.mass,
            alpha: cmd.alpha,
            pitch: cmd.alpha + gamma,
            cl,
            cd,
            alpha_dot: 0.0,
            gamma_dot,
            rate_of_climb: speed * gamma.sin(),
        };
        (derived, normal)
    }

    pub fn derivatives(&self, t: f64, y: &PointMassState) -> PointMassState {
        let cmd = self.controller.command(t, y);
        let (d, normal) = self.forces(t, y, &cmd);
        let speed = y[point_mass::SPEED];
        let gamma = y[point_mass::GAMMA];
        let heading = y[point_mass::HEADING];
        let cos_gamma = gamma.cos();
        let heading_dot = if speed > MIN_TURN_SPEED && cos_gamma.abs() > MIN_TURN_SPEED {
            normal * cmd.bank.sin() / (d.mass * speed * cos_gamma)
        } else {
            0.0
        };
        PointMassState::new(
            d.acceleration,
            d.gamma_dot,
            heading_dot,
            speed * cos_gamma * heading.cos(),
            speed * cos_gamma * heading.sin(),
            speed * gamma.sin(),
        )
    }
}

pub fn sample_state(y: &PointMassState) -> SampleState {
    SampleState {
        ground_distance: y[point_mass::X],
        speed: y[point_mass::SPEED],
        flight_path_angle: y[point_mass::GAMMA],
        altitude: y[point_mass::ALTITUDE],
        heading: y[point_mass::HEADING],
        cross_range: y[point_mass::Y],
        fuel_burned: 0.0,
    }
}
