pub mod balance;
pub mod landing;
pub mod point_mass;
pub mod state;
pub mod takeoff;

pub use landing::{FlareLaw, LandingDynamics};
pub use point_mass::PointMassDynamics;
pub use state::{LandingState, Phase, PointMassState, TakeoffState, G0};
pub use takeoff::{Regime, TakeoffDynamics};
