use std::fmt;

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665;

// ---------------------------------------------------------------------------
// State vectors
// ---------------------------------------------------------------------------

/// `[ground distance, speed, flight-path angle, altitude, angle of attack]`
///
/// The fifth component is the commanded attitude. Its rate is zero during
/// ground roll and follows the pitch-rate schedule afterwards.
pub type TakeoffState = SVector<f64, 5>;

/// `[ground distance, speed, flight-path angle, altitude, fuel burned]`
pub type LandingState = SVector<f64, 5>;

/// `[speed, flight-path angle, heading, x, y, altitude]`
pub type PointMassState = SVector<f64, 6>;

/// Component indices shared by the takeoff and landing vectors.
pub mod ground {
    pub const DISTANCE: usize = 0;
    pub const SPEED: usize = 1;
    pub const GAMMA: usize = 2;
    pub const ALTITUDE: usize = 3;
    /// Angle of attack for takeoff, fuel burned for landing.
    pub const AUX: usize = 4;
}

/// Component indices of the free point-mass vector.
pub mod point_mass {
    pub const SPEED: usize = 0;
    pub const GAMMA: usize = 1;
    pub const HEADING: usize = 2;
    pub const X: usize = 3;
    pub const Y: usize = 4;
    pub const ALTITUDE: usize = 5;
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Mutually exclusive simulation phase.
///
/// Continue path: `GroundRoll -> Rotation -> Airborne -> ClimbOut`.
/// Abort path (and landing roll): `GroundRoll -> BrakingRoll -> Stopped`.
/// Landing from the screen: `Approach -> Flare -> GroundRoll -> ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    GroundRoll,
    Rotation,
    Airborne,
    ClimbOut,
    BrakingRoll,
    Stopped,
    /// Steady glide from the landing screen height
    Approach,
    Flare,
}

impl Phase {
    /// Wheels on the runway: flight-path angle held by the ground constraint.
    pub fn on_ground(self) -> bool {
        matches!(
            self,
            Phase::GroundRoll | Phase::Rotation | Phase::BrakingRoll | Phase::Stopped
        )
    }

    /// Transitions are one-directional; no phase is revisited.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::GroundRoll, Phase::Rotation)
                | (Phase::Rotation, Phase::Airborne)
                | (Phase::Airborne, Phase::ClimbOut)
                | (Phase::GroundRoll, Phase::BrakingRoll)
                | (Phase::BrakingRoll, Phase::Stopped)
                | (Phase::Approach, Phase::Flare)
                | (Phase::Flare, Phase::GroundRoll)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::GroundRoll => "ground roll",
            Phase::Rotation => "rotation",
            Phase::Airborne => "airborne",
            Phase::ClimbOut => "climb-out",
            Phase::BrakingRoll => "braking roll",
            Phase::Stopped => "stopped",
            Phase::Approach => "approach",
            Phase::Flare => "flare",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_path_is_forward_only() {
        assert!(Phase::GroundRoll.can_advance_to(Phase::Rotation));
        assert!(Phase::Rotation.can_advance_to(Phase::Airborne));
        assert!(Phase::Airborne.can_advance_to(Phase::ClimbOut));
        assert!(!Phase::Airborne.can_advance_to(Phase::Rotation));
        assert!(!Phase::ClimbOut.can_advance_to(Phase::Airborne));
    }

    #[test]
    fn abort_path_cannot_rotate() {
        assert!(Phase::GroundRoll.can_advance_to(Phase::BrakingRoll));
        assert!(Phase::BrakingRoll.can_advance_to(Phase::Stopped));
        assert!(!Phase::BrakingRoll.can_advance_to(Phase::Rotation));
        assert!(!Phase::Stopped.can_advance_to(Phase::GroundRoll));
    }

    #[test]
    fn ground_phases() {
        assert!(Phase::Rotation.on_ground());
        assert!(!Phase::Airborne.on_ground());
        assert!(!Phase::ClimbOut.on_ground());
        assert!(!Phase::Flare.on_ground());
    }

    #[test]
    fn landing_path_touches_down_into_the_roll() {
        assert!(Phase::Approach.can_advance_to(Phase::Flare));
        assert!(Phase::Flare.can_advance_to(Phase::GroundRoll));
        assert!(!Phase::Approach.can_advance_to(Phase::GroundRoll));
        assert!(!Phase::GroundRoll.can_advance_to(Phase::Flare));
    }
}
