use serde::{Deserialize, Serialize};

use crate::dynamics::state::G0;
use crate::error::{PerformanceError, Result};

// ---------------------------------------------------------------------------
// Aircraft definition (takeoff/landing configuration)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub name: String,
    pub mass: f64,                // kg
    pub wing_area: f64,           // m^2
    pub wing_span: f64,           // m
    pub oswald_factor: f64,
    pub wing_incidence: f64,      // rad
    pub wing_height: f64,         // wing-to-ground distance on the runway, m
    pub cl0: f64,                 // CL at zero wing angle, high-lift devices deployed
    pub cl_alpha: f64,            // 1/rad
    pub cl_max: f64,
    pub cd0: f64,
    pub delta_cd0: f64,           // landing gear + flap increment
    pub k1: f64,                  // linear polar correction above CL 1.2
    pub k2: f64,                  // quadratic polar correction above CL 1.2
    pub engine_count: u32,
    pub static_thrust: f64,       // per engine, N
    pub thrust_lapse: f64,        // fractional thrust loss per m/s
    pub sfc: f64,                 // kg/(N·s)
    pub mu_rolling: f64,
    pub mu_braking: f64,
}

impl Aircraft {
    pub fn weight(&self) -> f64 {
        self.mass * G0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.wing_span * self.wing_span / self.wing_area
    }

    /// Lift coefficient of the wing at a given body angle of attack.
    pub fn lift_coefficient(&self, alpha: f64) -> f64 {
        self.cl0 + self.cl_alpha * (alpha + self.wing_incidence)
    }

    /// Body angle of attack that produces `cl`.
    pub fn alpha_for_lift_coefficient(&self, cl: f64) -> f64 {
        (cl - self.cl0) / self.cl_alpha - self.wing_incidence
    }

    /// Reject physically inconsistent inputs before any integration starts.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("mass", self.mass),
            ("wing area", self.wing_area),
            ("wing span", self.wing_span),
            ("Oswald factor", self.oswald_factor),
            ("CL alpha", self.cl_alpha),
            ("CL max", self.cl_max),
        ];
        for (what, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PerformanceError::Configuration(format!(
                    "{} of {} must be positive, got {}",
                    what, self.name, value
                )));
            }
        }
        let non_negative = [
            ("wing height", self.wing_height),
            ("CD0", self.cd0),
            ("CD0 increment", self.delta_cd0),
            ("static thrust", self.static_thrust),
            ("thrust lapse", self.thrust_lapse),
            ("SFC", self.sfc),
            ("rolling friction", self.mu_rolling),
            ("braking friction", self.mu_braking),
        ];
        for (what, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PerformanceError::Configuration(format!(
                    "{} of {} must be non-negative, got {}",
                    what, self.name, value
                )));
            }
        }
        if self.engine_count == 0 {
            return Err(PerformanceError::Configuration(format!(
                "{} has no engines",
                self.name
            )));
        }
        if self.lift_coefficient(0.0) >= self.cl_max {
            return Err(PerformanceError::Configuration(format!(
                "{}: ground-attitude CL {:.3} already exceeds CL max {:.3}",
                self.name,
                self.lift_coefficient(0.0),
                self.cl_max
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Aircraft builder
// ---------------------------------------------------------------------------

pub struct AircraftBuilder {
    name: String,
    mass: f64,
    wing_area: f64,
    wing_span: f64,
    oswald_factor: f64,
    wing_incidence: f64,
    wing_height: f64,
    cl0: f64,
    cl_alpha: f64,
    cl_max: f64,
    cd0: f64,
    delta_cd0: f64,
    k1: f64,
    k2: f64,
    engine_count: u32,
    static_thrust: f64,
    thrust_lapse: f64,
    sfc: f64,
    mu_rolling: f64,
    mu_braking: f64,
}

impl AircraftBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mass: 66_000.0,
            wing_area: 122.6,
            wing_span: 34.1,
            oswald_factor: 0.8,
            wing_incidence: 2.0_f64.to_radians(),
            wing_height: 3.0,
            cl0: 0.8,
            cl_alpha: 5.5,
            cl_max: 2.4,
            cd0: 0.025,
            delta_cd0: 0.02,
            k1: 0.0,
            k2: 0.0,
            engine_count: 2,
            static_thrust: 120_000.0,
            thrust_lapse: 0.0,
            sfc: 1.6e-5,
            mu_rolling: 0.025,
            mu_braking: 0.3,
        }
    }

    pub fn mass(mut self, v: f64) -> Self { self.mass = v; self }
    pub fn wing_area(mut self, v: f64) -> Self { self.wing_area = v; self }
    pub fn wing_span(mut self, v: f64) -> Self { self.wing_span = v; self }
    pub fn oswald_factor(mut self, v: f64) -> Self { self.oswald_factor = v; self }
    pub fn wing_incidence(mut self, v: f64) -> Self { self.wing_incidence = v; self }
    pub fn wing_height(mut self, v: f64) -> Self { self.wing_height = v; self }
    pub fn cl0(mut self, v: f64) -> Self { self.cl0 = v; self }
    pub fn cl_alpha(mut self, v: f64) -> Self { self.cl_alpha = v; self }
    pub fn cl_max(mut self, v: f64) -> Self { self.cl_max = v; self }
    pub fn cd0(mut self, v: f64) -> Self { self.cd0 = v; self }
    pub fn delta_cd0(mut self, v: f64) -> Self { self.delta_cd0 = v; self }
    pub fn high_lift_polar_correction(mut self, k1: f64, k2: f64) -> Self { self.k1 = k1; self.k2 = k2; self }
    pub fn engine_count(mut self, v: u32) -> Self { self.engine_count = v; self }
    pub fn static_thrust(mut self, v: f64) -> Self { self.static_thrust = v; self }
    pub fn thrust_lapse(mut self, v: f64) -> Self { self.thrust_lapse = v; self }
    pub fn sfc(mut self, v: f64) -> Self { self.sfc = v; self }
    pub fn mu_rolling(mut self, v: f64) -> Self { self.mu_rolling = v; self }
    pub fn mu_braking(mut self, v: f64) -> Self { self.mu_braking = v; self }

    /// Pick the mass that gives the requested sea-level stall speed.
    pub fn stall_speed(mut self, v_stall: f64, density: f64) -> Self {
        self.mass = 0.5 * density * v_stall * v_stall * self.wing_area * self.cl_max / G0;
        self
    }

    pub fn build(self) -> Aircraft {
        Aircraft {
            name: self.name,
            mass: self.mass,
            wing_area: self.wing_area,
            wing_span: self.wing_span,
            oswald_factor: self.oswald_factor,
            wing_incidence: self.wing_incidence,
            wing_height: self.wing_height,
            cl0: self.cl0,
            cl_alpha: self.cl_alpha,
            cl_max: self.cl_max,
            cd0: self.cd0,
            delta_cd0: self.delta_cd0,
            k1: self.k1,
            k2: self.k2,
            engine_count: self.engine_count,
            static_thrust: self.static_thrust,
            thrust_lapse: self.thrust_lapse,
            sfc: self.sfc,
            mu_rolling: self.mu_rolling,
            mu_braking: self.mu_braking,
        }
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Twin-engine narrow-body in takeoff configuration.
    pub fn narrow_body() -> Aircraft {
        AircraftBuilder::new("Narrow-body twin")
            .mass(70_000.0)
            .static_thrust(120_000.0)
            .build()
    }

    /// Twin turboprop regional aircraft.
    pub fn regional_turboprop() -> Aircraft {
        AircraftBuilder::new("Regional turboprop")
            .mass(22_800.0)
            .wing_area(61.0)
            .wing_span(27.05)
            .wing_height(2.4)
            .cl0(0.9)
            .cl_max(2.6)
            .cd0(0.028)
            .static_thrust(38_000.0)
            .thrust_lapse(0.002)
            .build()
    }
}
