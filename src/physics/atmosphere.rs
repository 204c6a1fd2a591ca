use serde::{Deserialize, Serialize};

use crate::dynamics::state::G0;

// ---------------------------------------------------------------------------
// Atmosphere collaborator
// ---------------------------------------------------------------------------

const R_AIR: f64 = 287.052_87; // specific gas constant for dry air, J/(kg·K)
const GAMMA: f64 = 1.4;        // ratio of specific heats

const T0: f64 = 288.15;        // sea-level temperature, K
const P0: f64 = 101_325.0;     // sea-level pressure, Pa

/// Air properties at a given pressure altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirData {
    pub density: f64,      // kg/m^3
    pub pressure: f64,     // Pa
    pub temperature: f64,  // K
    pub sound_speed: f64,  // m/s
}

/// Atmosphere lookup consumed by force models.
///
/// Implementations must be pure functions of altitude so that runs can share
/// one instance across threads.
pub trait Atmosphere: Send + Sync {
    fn air_data(&self, altitude: f64) -> AirData;

    fn density(&self, altitude: f64) -> f64 {
        self.air_data(altitude).density
    }

    fn sound_speed(&self, altitude: f64) -> f64 {
        self.air_data(altitude).sound_speed
    }
}

/// ISA 1976 standard atmosphere up to 32 km, with an optional temperature
/// deviation applied at constant pressure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Isa {
    pub delta_temperature: f64, // K
}

impl Isa {
    pub fn with_deviation(delta_temperature: f64) -> Self {
        Self { delta_temperature }
    }
}

impl Atmosphere for Isa {
    fn air_data(&self, altitude: f64) -> AirData {
        let h = altitude.clamp(0.0, 32_000.0);

        let (t_std, pressure) = if h < 11_000.0 {
            // Troposphere: lapse -6.5 K/km
            gradient_layer(h, 0.0, T0, -0.0065, P0)
        } else if h < 20_000.0 {
            // Tropopause: isothermal 216.65 K
            isothermal_layer(h, 11_000.0, 216.65, 22_632.1)
        } else {
            // Stratosphere I: lapse +1.0 K/km
            gradient_layer(h, 20_000.0, 216.65, 0.001, 5_474.89)
        };

        let temperature = t_std + self.delta_temperature;
        AirData {
            density: pressure / (R_AIR * temperature),
            pressure,
            temperature,
            sound_speed: (GAMMA * R_AIR * temperature).sqrt(),
        }
    }
}

// ---------------------------------------------------------------------------
// Layer helpers
// ---------------------------------------------------------------------------

/// Gradient layer: T = T_base + lapse * (h - h_base)
fn gradient_layer(h: f64, h_base: f64, t_base: f64, lapse: f64, p_base: f64) -> (f64, f64) {
    let t = t_base + lapse * (h - h_base);
    let p = p_base * (t / t_base).powf(-G0 / (lapse * R_AIR));
    (t, p)
}

/// Isothermal layer: T = const, pressure decays exponentially
fn isothermal_layer(h: f64, h_base: f64, t: f64, p_base: f64) -> (f64, f64) {
    let p = p_base * ((-G0 / (R_AIR * t)) * (h - h_base)).exp();
    (t, p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
