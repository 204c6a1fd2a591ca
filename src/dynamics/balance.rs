use crate::dynamics::state::Phase;

// ---------------------------------------------------------------------------
// Force balance per phase
// ---------------------------------------------------------------------------

/// Forces acting on the aircraft at one instant, resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Loads {
    pub thrust: f64,   // N
    pub lift: f64,     // N
    pub drag: f64,     // N
    pub friction: f64, // N, zero off the runway
    pub weight: f64,   // N
    pub mass: f64,     // kg
    pub alpha: f64,    // rad, thrust line to flight path
    pub gamma: f64,    // rad
    pub speed: f64,    // m/s
}

/// Path-axis accelerations produced by a balance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Response {
    pub speed_dot: f64,   // m/s^2
    pub gamma_dot: f64,   // rad/s
    pub total_force: f64, // N, along the path
}

pub type BalanceFn = fn(&Loads) -> Response;

/// Pure force balance that applies in `phase`.
pub fn balance_for(phase: Phase) -> BalanceFn {
    match phase {
        Phase::GroundRoll | Phase::Rotation | Phase::BrakingRoll => ground_roll,
        Phase::Airborne | Phase::ClimbOut | Phase::Approach | Phase::Flare => airborne,
        Phase::Stopped => stopped,
    }
}

/// Wheels on the runway: the flight-path angle is held by the ground.
pub fn ground_roll(l: &Loads) -> Response {
    let total = l.thrust * l.alpha.cos() - l.drag - l.friction - l.weight * l.gamma.sin();
    Response { speed_dot: total / l.mass, gamma_dot: 0.0, total_force: total }
}

/// Free flight in the vertical plane.
pub fn airborne(l: &Loads) -> Response {
    let total = l.thrust * l.alpha.cos() - l.drag - l.weight * l.gamma.sin();
    let normal = l.lift + l.thrust * l.alpha.sin() - l.weight * l.gamma.cos();
    let gamma_dot = if l.speed > 0.0 { normal / (l.mass * l.speed) } else { 0.0 };
    Response { speed_dot: total / l.mass, gamma_dot, total_force: total }
}

/// At rest: brakes hold the aircraft.
pub fn stopped(_l: &Loads) -> Response {
    Response::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn loads() -> Loads {
        Loads {
            thrust: 100_000.0,
            lift: 400_000.0,
            drag: 20_000.0,
            friction: 5_000.0,
            weight: 600_000.0,
            mass: 61_000.0,
            alpha: 0.0,
            gamma: 0.0,
            speed: 60.0,
        }
    }

    #[test]
    fn dispatch_matches_phase() {
        let l = loads();
        assert_eq!(balance_for(Phase::GroundRoll)(&l), ground_roll(&l));
        assert_eq!(balance_for(Phase::BrakingRoll)(&l), ground_roll(&l));
        assert_eq!(balance_for(Phase::ClimbOut)(&l), airborne(&l));
        assert_eq!(balance_for(Phase::Flare)(&l), airborne(&l));
        assert_eq!(balance_for(Phase::Stopped)(&l), Response::default());
    }

    #[test]
    fn ground_roll_holds_path_and_charges_friction() {
        let r = ground_roll(&loads());
        assert_eq!(r.gamma_dot, 0.0);
        assert_relative_eq!(r.total_force, 75_000.0);
        assert_relative_eq!(r.speed_dot, 75_000.0 / 61_000.0);
    }

    #[test]
    fn airborne_ignores_friction_and_turns_with_lift() {
        let mut l = loads();
        l.lift = 650_000.0;
        let r = airborne(&l);
        assert_relative_eq!(r.total_force, 80_000.0);
        assert_relative_eq!(r.gamma_dot, 50_000.0 / (61_000.0 * 60.0));
    }

    #[test]
    fn airborne_at_zero_speed_does_not_divide() {
        let mut l = loads();
        l.speed = 0.0;
        assert_eq!(airborne(&l).gamma_dot, 0.0);
    }
}
