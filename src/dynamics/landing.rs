use crate::dynamics::balance::{balance_for, Loads};
use crate::dynamics::state::{ground, LandingState, Phase, G0};
use crate::physics::aerodynamics::dynamic_pressure;
use crate::physics::{AeroQuery, ForceModel, ThrustQuery};
use crate::sim::recorder::{DerivedQuantities, SampleState};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Flare control law
// ---------------------------------------------------------------------------

/// Attitude and thrust laws of the flare, fixed when the flare starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlareLaw {
    pub t_start: f64,
    pub alpha_start: f64, // rad
    pub rate: f64,        // rad/s
    pub alpha_max: f64,   // rad
    pub thrust_start: f64, // N
    /// Time to ramp the thrust down to idle, s
    pub dt_idle: f64,
}

impl FlareLaw {
    pub fn alpha(&self, t: f64) -> f64 {
        (self.alpha_start + self.rate * (t - self.t_start)).min(self.alpha_max)
    }

    pub fn alpha_dot(&self, t: f64) -> f64 {
        if self.alpha_start + self.rate * (t - self.t_start) < self.alpha_max {
            self.rate
        } else {
            0.0
        }
    }

    /// Linear ramp from the flare-start thrust to `idle`.
    pub fn thrust(&self, t: f64, idle: f64) -> f64 {
        let w = ((t - self.t_start) / self.dt_idle).clamp(0.0, 1.0);
        self.thrust_start + (idle - self.thrust_start) * w
    }
}

// ---------------------------------------------------------------------------
// Landing equations of motion
// ---------------------------------------------------------------------------

/// Landing over `[s, V, gamma, h, fuel burned]`.
///
/// Approach: lift trimmed to `W cos gamma` at constant approach thrust.
/// Flare: attitude ramped by the [`FlareLaw`], thrust ramped to idle.
/// Runway: fixed ground attitude, `gamma` and `h` held at zero.
///
/// Mass decreases with the fuel burned at `SFC * |T|`, so reverse thrust also
/// consumes fuel.
#[derive(Clone, Copy)]
pub struct LandingDynamics<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    pub alpha: f64,    // rad, on the runway
    pub throttle: f64, // negative for reverse thrust
    pub elevation: f64,
    /// Thrust held on the approach, N
    pub approach_thrust: f64,
    pub flare: Option<FlareLaw>,
}

impl<'a> LandingDynamics<'a> {
    pub fn on_runway(
        model: &'a dyn ForceModel,
        aircraft: &'a Aircraft,
        alpha: f64,
        throttle: f64,
        elevation: f64,
    ) -> Self {
        Self { model, aircraft, alpha, throttle, elevation, approach_thrust: 0.0, flare: None }
    }

    fn path_angle(phase: Phase, y: &LandingState) -> f64 {
        if phase.on_ground() {
            0.0
        } else {
            y[ground::GAMMA]
        }
    }

    /// Thrust that holds the approach speed on a steady glide at `(speed, gamma, h)`.
    pub fn glide_thrust(&self, speed: f64, gamma: f64, height: f64) -> f64 {
        let weight = self.aircraft.weight();
        let aero = AeroQuery {
            speed,
            alpha: 0.0,
            flight_path_angle: gamma,
            altitude: height,
            elevation: self.elevation,
            t: 0.0,
        };
        let q_s = dynamic_pressure(self.model.density(aero.pressure_altitude()), speed)
            * self.model.reference_area();
        if q_s <= 0.0 {
            return 0.0;
        }
        let cl = weight * gamma.cos() / q_s;
        let alpha = self.aircraft.alpha_for_lift_coefficient(cl);
        let aero = AeroQuery { alpha, ..aero };
        ((q_s * self.model.drag_coefficient(&aero, cl) + weight * gamma.sin()) / alpha.cos()).max(0.0)
    }

    fn idle_thrust(&self, phase: Phase, t: f64, speed: f64, gamma: f64, altitude: f64) -> f64 {
        self.model.thrust(&ThrustQuery {
            speed,
            flight_path_angle: gamma,
            t,
            altitude,
            phase,
            engines: self.aircraft.engine_count,
            throttle: 0.0,
        })
    }

    pub fn evaluate(&self, phase: Phase, t: f64, y: &LandingState) -> DerivedQuantities {
        let ac = self.aircraft;
        let speed = y[ground::SPEED];
        let gamma = Self::path_angle(phase, y);
        let mass = ac.mass - y[ground::AUX];
        let weight = mass * G0;

        let mut aero = AeroQuery {
            speed,
            alpha: self.alpha,
            flight_path_angle: gamma,
            altitude: y[ground::ALTITUDE].max(0.0),
            elevation: self.elevation,
            t,
        };
        let q_s = dynamic_pressure(self.model.density(aero.pressure_altitude()), speed)
            * self.model.reference_area();
        let flare = self.flare.filter(|_| phase == Phase::Flare);

        let cl = match (phase, flare) {
            (Phase::Approach, _) if q_s > 0.0 => {
                let cl = weight * gamma.cos() / q_s;
                aero.alpha = ac.alpha_for_lift_coefficient(cl);
                cl
            }
            (_, Some(law)) => {
                aero.alpha = law.alpha(t);
                self.model.lift_coefficient(&aero)
            }
            _ => self.model.lift_coefficient(&aero),
        };
        let alpha = aero.alpha;
        let cd = self.model.drag_coefficient(&aero, cl);
        let lift = q_s * cl;
        let drag = q_s * cd;

        let thrust = match (phase, flare) {
            (Phase::Stopped, _) => 0.0,
            (Phase::Approach, _) => self.approach_thrust,
            (_, Some(law)) => law.thrust(t, self.idle_thrust(phase, t, speed, gamma, aero.pressure_altitude())),
            _ => self.model.thrust(&ThrustQuery {
                speed,
                flight_path_angle: gamma,
                t,
                altitude: aero.pressure_altitude(),
                phase,
                engines: ac.engine_count,
                throttle: self.throttle,
            }),
        };
        let mu = match phase {
            Phase::BrakingRoll | Phase::Stopped => self.model.friction_braking(speed),
            _ if phase.on_ground() => self.model.friction_rolling(speed),
            _ => 0.0,
        };
        let friction = mu * (weight - lift).max(0.0);

        let loads = Loads {
            thrust,
            lift,
            drag,
            friction,
            weight,
            mass,
            alpha,
            gamma,
            speed,
        };
        let response = balance_for(phase)(&loads);

        DerivedQuantities {
            thrust,
            lift,
            drag,
            friction,
            total_force: response.total_force,
            mass,
            weight,
            load_factor: lift / (weight * gamma.cos()),
            acceleration: response.speed_dot,
            alpha,
            pitch: alpha + gamma,
            cl,
            cd,
            alpha_dot: flare.map_or(0.0, |law| law.alpha_dot(t)),
            gamma_dot: response.gamma_dot,
            rate_of_climb: speed * gamma.sin(),
        }
    }

    pub fn derivatives(&self, phase: Phase, t: f64, y: &LandingState) -> LandingState {
        if phase == Phase::Stopped {
            return LandingState::zeros();
        }
        let d = self.evaluate(phase, t, y);
        let speed = y[ground::SPEED];
        let gamma = Self::path_angle(phase, y);
        let altitude = self.elevation + y[ground::ALTITUDE].max(0.0);
        let mach = speed / self.model.sound_speed(altitude);
        let full = self.aircraft.static_thrust * f64::from(self.aircraft.engine_count);
        let thrust_ratio = if full > 0.0 { d.thrust.abs() / full } else { 0.0 };
        let sfc = self.model.specific_fuel_consumption(mach, altitude, thrust_ratio);
        LandingState::new(
            speed * gamma.cos(),
            d.acceleration,
            d.gamma_dot,
            speed * gamma.sin(),
            sfc * d.thrust.abs(),
        )
    }
}

pub fn sample_state(phase: Phase, y: &LandingState) -> SampleState {
    let airborne = !phase.on_ground();
    SampleState {
        ground_distance: y[ground::DISTANCE],
        speed: y[ground::SPEED],
        flight_path_angle: if airborne { y[ground::GAMMA] } else { 0.0 },
        altitude: if airborne { y[ground::ALTITUDE] } else { 0.0 },
        fuel_burned: y[ground::AUX],
        ..Default::default()
    }
}
