use crate::dynamics::state::Phase;
use crate::physics::aerodynamics::{self, dynamic_pressure};
use crate::physics::atmosphere::{Atmosphere, Isa};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Force model contract
// ---------------------------------------------------------------------------

/// Inputs of a thrust lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustQuery {
    pub speed: f64,             // m/s
    pub flight_path_angle: f64, // rad
    pub t: f64,                 // s
    pub altitude: f64,          // m
    pub phase: Phase,
    pub engines: u32,           // operating engines
    pub throttle: f64,          // negative for reverse thrust
}

/// Inputs of an aerodynamic lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroQuery {
    pub speed: f64,             // m/s
    pub alpha: f64,             // rad, body angle of attack
    pub flight_path_angle: f64, // rad
    pub altitude: f64,          // m, height of the gear above the runway
    pub elevation: f64,         // m, runway pressure altitude
    pub t: f64,                 // s
}

impl AeroQuery {
    /// Pressure altitude of the aircraft.
    pub fn pressure_altitude(&self) -> f64 {
        self.elevation + self.altitude
    }
}

/// Thrust, aerodynamic and ground-friction collaborator.
///
/// Every method must be a pure function of its arguments: one model is shared
/// read-only by all runs of a balanced-field sweep.
pub trait ForceModel: Send + Sync {
    fn atmosphere(&self) -> &dyn Atmosphere;

    fn reference_area(&self) -> f64;

    fn thrust(&self, query: &ThrustQuery) -> f64;

    fn lift_coefficient(&self, query: &AeroQuery) -> f64;

    /// Drag coefficient at a given lift coefficient. `cl` may differ from
    /// [`ForceModel::lift_coefficient`] when the lift is trimmed.
    fn drag_coefficient(&self, query: &AeroQuery, cl: f64) -> f64;

    fn friction_rolling(&self, speed: f64) -> f64;

    fn friction_braking(&self, speed: f64) -> f64;

    fn density(&self, altitude: f64) -> f64 {
        self.atmosphere().density(altitude)
    }

    fn sound_speed(&self, altitude: f64) -> f64 {
        self.atmosphere().sound_speed(altitude)
    }

    fn lift(&self, query: &AeroQuery) -> f64 {
        dynamic_pressure(self.density(query.pressure_altitude()), query.speed)
            * self.reference_area()
            * self.lift_coefficient(query)
    }

    fn drag(&self, query: &AeroQuery) -> f64 {
        let cl = self.lift_coefficient(query);
        dynamic_pressure(self.density(query.pressure_altitude()), query.speed)
            * self.reference_area()
            * self.drag_coefficient(query, cl)
    }

    fn stall_speed(&self, altitude: f64, weight: f64, wing_area: f64, cl_max: f64) -> f64 {
        (2.0 * weight / (self.density(altitude) * wing_area * cl_max)).sqrt()
    }

    fn ground_effect_factor(&self, wing_span: f64, height: f64) -> f64 {
        aerodynamics::ground_effect_factor(wing_span, height)
    }

    /// kg/(N·s). Zero unless the model tracks fuel.
    fn specific_fuel_consumption(&self, _mach: f64, _altitude: f64, _thrust_ratio: f64) -> f64 {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Parabolic polar with ground effect
// ---------------------------------------------------------------------------

/// Reference force model built from an [`Aircraft`] description.
///
/// Linear lift curve, parabolic drag polar with McCormick ground effect and
/// a high-CL correction, per-engine static thrust with a linear speed lapse,
/// constant friction coefficients and constant SFC.
#[derive(Debug, Clone)]
pub struct ParabolicPolar<A: Atmosphere = Isa> {
    aircraft: Aircraft,
    atmosphere: A,
}

impl ParabolicPolar<Isa> {
    pub fn new(aircraft: Aircraft) -> Self {
        Self { aircraft, atmosphere: Isa::default() }
    }
}

impl<A: Atmosphere> ParabolicPolar<A> {
    pub fn with_atmosphere(aircraft: Aircraft, atmosphere: A) -> Self {
        Self { aircraft, atmosphere }
    }

    pub fn aircraft(&self) -> &Aircraft {
        &self.aircraft
    }
}

impl<A: Atmosphere> ForceModel for ParabolicPolar<A> {
    fn atmosphere(&self) -> &dyn Atmosphere {
        &self.atmosphere
    }

    fn reference_area(&self) -> f64 {
        self.aircraft.wing_area
    }

    fn thrust(&self, query: &ThrustQuery) -> f64 {
        let lapse = (1.0 - self.aircraft.thrust_lapse * query.speed).max(0.0);
        f64::from(query.engines) * self.aircraft.static_thrust * query.throttle * lapse
    }

    fn lift_coefficient(&self, query: &AeroQuery) -> f64 {
        self.aircraft.lift_coefficient(query.alpha)
    }

    fn drag_coefficient(&self, query: &AeroQuery, cl: f64) -> f64 {
        let ac = &self.aircraft;
        let phi = self.ground_effect_factor(ac.wing_span, ac.wing_height + query.altitude);
        ac.cd0
            + ac.delta_cd0
            + aerodynamics::induced_drag(cl, ac.aspect_ratio(), ac.oswald_factor, phi)
            + aerodynamics::high_lift_correction(cl, ac.k1, ac.k2)
    }

    fn friction_rolling(&self, _speed: f64) -> f64 {
        self.aircraft.mu_rolling
    }

    fn friction_braking(&self, _speed: f64) -> f64 {
        self.aircraft.mu_braking
    }

    fn specific_fuel_consumption(&self, _mach: f64, _altitude: f64, _thrust_ratio: f64) -> f64 {
        self.aircraft.sfc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::AircraftBuilder;
    use approx::assert_relative_eq;

    fn model() -> ParabolicPolar {
        ParabolicPolar::new(AircraftBuilder::new("test").stall_speed(60.0, 1.225).build())
    }

    fn aero(speed: f64, alpha: f64) -> AeroQuery {
        AeroQuery { speed, alpha, flight_path_angle: 0.0, altitude: 0.0, elevation: 0.0, t: 0.0 }
    }

    #[test]
    fn stall_speed_round_trip() {
        let m = model();
        let ac = m.aircraft();
        let vs = m.stall_speed(0.0, ac.weight(), ac.wing_area, ac.cl_max);
        assert_relative_eq!(vs, 60.0, epsilon = 0.05);
    }

    #[test]
    fn thrust_scales_with_engines() {
        let m = model();
        let mut q = ThrustQuery {
            speed: 50.0,
            flight_path_angle: 0.0,
            t: 0.0,
            altitude: 0.0,
            phase: Phase::GroundRoll,
            engines: 2,
            throttle: 1.0,
        };
        let both = m.thrust(&q);
        q.engines = 1;
        assert_relative_eq!(m.thrust(&q) * 2.0, both);
        q.engines = 0;
        assert_eq!(m.thrust(&q), 0.0);
    }

    #[test]
    fn ground_effect_reduces_drag() {
        let m = model();
        let on_runway = m.drag(&aero(60.0, 0.1));
        let mut high = aero(60.0, 0.1);
        high.altitude = 200.0;
        let off = m.drag(&high);
        assert!(on_runway < off, "ground effect drag {} should be below {}", on_runway, off);
    }

    #[test]
    fn lift_drops_with_elevation() {
        let m = model();
        let mut high = aero(60.0, 0.1);
        high.elevation = 2000.0;
        assert!(m.lift(&high) < m.lift(&aero(60.0, 0.1)));
    }

    #[test]
    fn lift_vanishes_at_rest() {
        assert_eq!(model().lift(&aero(0.0, 0.1)), 0.0);
    }
}
