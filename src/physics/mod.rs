pub mod aerodynamics;
pub mod atmosphere;
pub mod force_model;

pub use atmosphere::{AirData, Atmosphere, Isa};
pub use force_model::{AeroQuery, ForceModel, ParabolicPolar, ThrustQuery};
