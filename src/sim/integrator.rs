use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::sim::event::EventKind;

// ---------------------------------------------------------------------------
// Integrator errors and settings
// ---------------------------------------------------------------------------

/// Numerical failures of an integration run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("step size {h:e} s fell below the minimum at t = {t:.6} s")]
    StepSizeTooSmall { t: f64, h: f64 },
    #[error("step budget of {steps} exhausted at t = {t:.3} s")]
    MaxStepsExceeded { steps: usize, t: f64 },
    #[error("non-finite state at t = {t:.6} s")]
    NonFiniteState { t: f64 },
    #[error("locating {kind} failed: {message}")]
    EventLocation { kind: EventKind, message: String },
    #[error("invalid integrator input: {message}")]
    InvalidInput { message: String },
}

/// Step-error and event-location controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    pub initial_step: f64,             // s
    pub min_step: f64,                 // s
    pub max_step: f64,                 // s
    pub max_steps: usize,
    pub t_max: f64,                    // s
    pub event_tolerance: f64,          // s
    pub terminal_event_tolerance: f64, // s
    pub event_max_iterations: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-8,
            initial_step: 0.01,
            min_step: 1e-10,
            max_step: 1.0,
            max_steps: 200_000,
            t_max: 100.0,
            event_tolerance: 1e-9,
            terminal_event_tolerance: 1e-10,
            event_max_iterations: 50,
        }
    }
}

impl IntegratorSettings {
    pub fn validate(&self) -> Result<(), IntegrationError> {
        let checks = [
            (self.rtol > 0.0 || self.atol > 0.0, "at least one of rtol/atol must be positive"),
            (self.min_step > 0.0, "min_step must be positive"),
            (self.max_step >= self.min_step, "max_step must not be below min_step"),
            (self.initial_step > 0.0, "initial_step must be positive"),
            (self.t_max > 0.0, "t_max must be positive"),
            (self.event_tolerance > 0.0, "event_tolerance must be positive"),
            (self.terminal_event_tolerance > 0.0, "terminal_event_tolerance must be positive"),
            (self.event_max_iterations > 0, "event_max_iterations must be positive"),
        ];
        for (ok, message) in checks {
            if !ok {
                return Err(IntegrationError::InvalidInput { message: message.into() });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Step size controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct StepController {
    pub safety: f64,
    pub max_factor: f64,
    pub min_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
            exponent: 1.0 / 5.0, // error estimate is 4th order
        }
    }
}

impl StepController {
    pub fn compute_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        let factor = self.safety * error.powf(-self.exponent);
        factor.clamp(self.min_factor, self.max_factor)
    }
}

// ---------------------------------------------------------------------------
// Dormand-Prince 5(4) tableau
// ---------------------------------------------------------------------------

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the 5th and embedded 4th order weights
const E1: f64 = -71.0 / 57600.0;
const E3: f64 = 71.0 / 16695.0;
const E4: f64 = -71.0 / 1920.0;
const E5: f64 = 17253.0 / 339200.0;
const E6: f64 = -22.0 / 525.0;
const E7: f64 = 1.0 / 40.0;

/// Continuous extension: stage j contributes `sum_m P[j][m] x^(m+1)`.
const P: [[f64; 4]; 7] = [
    [1.0, -8048581381.0 / 2820520608.0, 8663915743.0 / 2820520608.0, -12715105075.0 / 11282082432.0],
    [0.0, 0.0, 0.0, 0.0],
    [0.0, 131558114200.0 / 32700410799.0, -68118460800.0 / 10900136933.0, 87487479700.0 / 32700410799.0],
    [0.0, -1754552775.0 / 470086768.0, 14199869525.0 / 1410260304.0, -10690763975.0 / 1880347072.0],
    [0.0, 127303824393.0 / 49829197408.0, -318862633887.0 / 49829197408.0, 701980252875.0 / 199316789632.0],
    [0.0, -282668133.0 / 205662961.0, 2019193451.0 / 616988883.0, -1453857185.0 / 822651844.0],
    [0.0, 40617522.0 / 29380423.0, -110615467.0 / 29380423.0, 69997945.0 / 29380423.0],
];

// ---------------------------------------------------------------------------
// Dense output
// ---------------------------------------------------------------------------

/// One accepted step with its stage derivatives, interpolable anywhere in
/// `[t0, t0 + h]` to 4th order.
#[derive(Debug, Clone)]
pub struct DenseStep<const N: usize> {
    pub t0: f64,
    pub h: f64,
    pub y0: SVector<f64, N>,
    pub y1: SVector<f64, N>,
    k: [SVector<f64, N>; 7],
}

impl<const N: usize> DenseStep<N> {
    pub fn t1(&self) -> f64 {
        self.t0 + self.h
    }

    /// Interpolated state at `t`. Exact at both step ends.
    pub fn eval(&self, t: f64) -> SVector<f64, N> {
        if t >= self.t1() {
            return self.y1;
        }
        if t <= self.t0 {
            return self.y0;
        }
        let x = (t - self.t0) / self.h;
        let powers = [x, x * x, x * x * x, x * x * x * x];
        let mut y = self.y0;
        for (row, k) in P.iter().zip(self.k.iter()) {
            let coef: f64 = row.iter().zip(powers.iter()).map(|(p, xm)| p * xm).sum();
            if coef != 0.0 {
                y += k * (self.h * coef);
            }
        }
        y
    }
}

/// Outcome of one trial step.
#[derive(Debug, Clone)]
pub struct StepOutcome<const N: usize> {
    pub accepted: bool,
    /// Scaled error norm (accepted when <= 1)
    pub error: f64,
    /// Suggested size of the next step
    pub h_next: f64,
    pub dense: DenseStep<N>,
}

// ---------------------------------------------------------------------------
// Integrator
// ---------------------------------------------------------------------------

/// Embedded Dormand-Prince 5(4) pair with local extrapolation.
#[derive(Debug, Clone, Copy)]
pub struct DormandPrince {
    pub rtol: f64,
    pub atol: f64,
    pub controller: StepController,
}

impl DormandPrince {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol, controller: StepController::default() }
    }

    pub fn from_settings(settings: &IntegratorSettings) -> Self {
        Self::new(settings.rtol, settings.atol)
    }

    /// Attempt one step of size `h` from `(t, y)`.
    ///
    /// Stage derivatives are always evaluated fresh, so the right-hand side
    /// may change between steps (phase switches) without stale FSAL data.
    pub fn step<F, const N: usize>(&self, f: &F, t: f64, y: &SVector<f64, N>, h: f64) -> StepOutcome<N>
    where
        F: Fn(f64, &SVector<f64, N>) -> SVector<f64, N>,
    {
        let y = *y;
        let k1 = f(t, &y);
        let k2 = f(t + C2 * h, &(y + k1 * (h * A21)));
        let k3 = f(t + C3 * h, &(y + (k1 * A31 + k2 * A32) * h));
        let k4 = f(t + C4 * h, &(y + (k1 * A41 + k2 * A42 + k3 * A43) * h));
        let k5 = f(t + C5 * h, &(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h));
        let k6 = f(t + h, &(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h));
        let y1 = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
        let k7 = f(t + h, &y1);

        let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
        let error = self.error_norm(&err, &y, &y1);
        let factor = if error.is_finite() {
            self.controller.compute_factor(error)
        } else {
            self.controller.min_factor
        };

        StepOutcome {
            accepted: error.is_finite() && error <= 1.0,
            error,
            h_next: h * factor,
            dense: DenseStep { t0: t, h, y0: y, y1, k: [k1, k2, k3, k4, k5, k6, k7] },
        }
    }

    /// Max-norm of the error scaled by `atol + rtol * max(|y0|, |y1|)`.
    fn error_norm<const N: usize>(
        &self,
        err: &SVector<f64, N>,
        y0: &SVector<f64, N>,
        y1: &SVector<f64, N>,
    ) -> f64 {
        let mut norm = 0.0_f64;
        for i in 0..N {
            let scale = self.atol + self.rtol * y0[i].abs().max(y1[i].abs());
            let ratio = err[i].abs() / scale;
            if ratio.is_nan() {
                return f64::NAN;
            }
            norm = norm.max(ratio);
        }
        norm
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::{Vector1, Vector2};

    fn decay(_t: f64, y: &Vector1<f64>) -> Vector1<f64> {
        -y
    }

    fn oscillator(_t: f64, y: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(y[1], -y[0])
    }

    #[test]
    fn weights_are_consistent() {
        assert_relative_eq!(B1 + B3 + B4 + B5 + B6, 1.0, epsilon = 1e-15);
        assert_relative_eq!(E1 + E3 + E4 + E5 + E6 + E7, 0.0, epsilon = 1e-15);
        // Continuous extension reproduces the 5th-order weights at x = 1
        let b = [B1, 0.0, B3, B4, B5, B6, 0.0];
        for (row, bj) in P.iter().zip(b.iter()) {
            assert_relative_eq!(row.iter().sum::<f64>(), *bj, epsilon = 1e-12);
        }
    }

    #[test]
    fn exponential_decay_single_step() {
        let dp = DormandPrince::new(1e-6, 1e-6);
        let out = dp.step(&decay, 0.0, &Vector1::new(1.0), 0.1);
        assert!(out.accepted);
        assert_relative_eq!(out.dense.y1[0], (-0.1_f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn oversized_step_rejected() {
        let dp = DormandPrince::new(1e-12, 1e-12);
        let out = dp.step(&oscillator, 0.0, &Vector2::new(1.0, 0.0), 2.0);
        assert!(!out.accepted, "error {} should reject a 2 s step", out.error);
        assert!(out.h_next < 2.0);
    }

    #[test]
    fn dense_output_tracks_solution() {
        let dp = DormandPrince::new(1e-10, 1e-10);
        let out = dp.step(&oscillator, 0.0, &Vector2::new(1.0, 0.0), 0.2);
        for i in 0..=10 {
            let t = 0.02 * i as f64;
            let y = out.dense.eval(t);
            assert_abs_diff_eq!(y[0], t.cos(), epsilon = 1e-6);
            assert_abs_diff_eq!(y[1], -t.sin(), epsilon = 1e-6);
        }
    }

    #[test]
    fn dense_output_exact_at_ends() {
        let dp = DormandPrince::new(1e-8, 1e-8);
        let out = dp.step(&decay, 1.0, &Vector1::new(2.0), 0.05);
        assert_eq!(out.dense.eval(1.0)[0], 2.0);
        assert_eq!(out.dense.eval(out.dense.t1()), out.dense.y1);
    }

    #[test]
    fn settings_validation() {
        assert!(IntegratorSettings::default().validate().is_ok());
        let bad = IntegratorSettings { min_step: 0.0, ..Default::default() };
        assert!(matches!(bad.validate(), Err(IntegrationError::InvalidInput { .. })));
    }
}
