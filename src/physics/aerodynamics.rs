use std::f64::consts::PI;

/// CL above which the parabolic polar is corrected.
pub const POLAR_BREAK_CL: f64 = 1.2;

/// Dynamic pressure, Pa.
pub fn dynamic_pressure(density: f64, speed: f64) -> f64 {
    0.5 * density * speed * speed
}

/// McCormick ground-effect factor on induced drag.
///
/// `height` is measured from the ground to the wing. Returns 0 on the ground
/// plane and tends to 1 out of ground effect.
pub fn ground_effect_factor(wing_span: f64, height: f64) -> f64 {
    if wing_span <= 0.0 {
        return 1.0;
    }
    let r = 16.0 * height.max(0.0) / wing_span;
    let r2 = r * r;
    r2 / (1.0 + r2)
}

/// Induced drag coefficient of a parabolic polar, scaled by ground effect.
pub fn induced_drag(cl: f64, aspect_ratio: f64, oswald: f64, ground_factor: f64) -> f64 {
    ground_factor * cl * cl / (PI * aspect_ratio * oswald)
}

/// Extra drag above the polar break: `k1 (CL - 1.2) + k2 (CL - 1.2)^2`.
pub fn high_lift_correction(cl: f64, k1: f64, k2: f64) -> f64 {
    if cl > POLAR_BREAK_CL {
        let dcl = cl - POLAR_BREAK_CL;
        k1 * dcl + k2 * dcl * dcl
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ground_effect_bounds() {
        assert_eq!(ground_effect_factor(34.0, 0.0), 0.0);
        let near = ground_effect_factor(34.0, 3.0);
        let far = ground_effect_factor(34.0, 300.0);
        assert!(near > 0.0 && near < far, "near {} far {}", near, far);
        assert!(far < 1.0 && far > 0.99);
    }

    #[test]
    fn ground_effect_matches_mccormick_point() {
        // h/b = 1/16 gives (1)^2 / (1 + 1)
        assert_relative_eq!(ground_effect_factor(32.0, 2.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn no_correction_below_break() {
        assert_eq!(high_lift_correction(1.1, 0.1, 0.2), 0.0);
        assert_relative_eq!(high_lift_correction(1.7, 0.1, 0.2), 0.1 * 0.5 + 0.2 * 0.25);
    }

    #[test]
    fn induced_drag_quadratic_in_cl() {
        let a = induced_drag(1.0, 9.5, 0.8, 1.0);
        let b = induced_drag(2.0, 9.5, 0.8, 1.0);
        assert_relative_eq!(b / a, 4.0, epsilon = 1e-12);
    }
}
