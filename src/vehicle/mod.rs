pub mod aircraft;

pub use aircraft::{presets, Aircraft, AircraftBuilder};
