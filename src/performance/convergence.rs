use serde::Serialize;

use crate::error::{Branch, PerformanceError, Result};
use crate::performance::config::{ConvergenceSettings, FlareConvergenceSettings};
use crate::performance::landing::{self, LandingCase, LandingResult, Start};
use crate::performance::takeoff::{simulate, ReferenceSpeeds, TakeoffCase, TakeoffResult};

/// How the attitude-rate search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConvergenceOutcome {
    /// Obstacle speed ratio within tolerance of the target
    Converged,
    /// The next rate would have been positive. The result is the best run
    /// inside the admissible range, not a converged one.
    BoundaryLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub outcome: ConvergenceOutcome,
    pub alpha_reduction_rate: f64, // rad/s
    pub ratio: f64,
    pub iterations: usize,
}

/// Per-iteration search state.
#[derive(Debug, Clone, Copy)]
struct ConvergenceState {
    alpha_reduction_rate: f64,
    last_ratio: f64,
    step: f64,
    best_rate: f64,
    best_ratio: f64,
}

impl ConvergenceState {
    fn new(step: f64) -> Self {
        Self {
            alpha_reduction_rate: 0.0,
            last_ratio: f64::NAN,
            step,
            best_rate: 0.0,
            best_ratio: f64::NAN,
        }
    }

    fn observe(&mut self, ratio: f64, target: f64) {
        self.last_ratio = ratio;
        if self.best_ratio.is_nan() || (ratio - target).abs() < (self.best_ratio - target).abs() {
            self.best_ratio = ratio;
            self.best_rate = self.alpha_reduction_rate;
        }
    }

    /// Next candidate rate, one fixed step away from the current one.
    fn propose(&self, target: f64) -> f64 {
        if self.last_ratio > target {
            self.alpha_reduction_rate + self.step
        } else {
            self.alpha_reduction_rate - self.step
        }
    }
}

/// Tune the post-hold attitude rate of a continued takeoff so the obstacle
/// is crossed at `settings.target_ratio` times the stall speed.
///
/// The rate starts at zero and is only searched over non-positive values: a
/// proposal above zero ends the search with the current run, flagged
/// [`ConvergenceOutcome::BoundaryLimited`].
pub(crate) fn tune_reduction_rate(
    case: &TakeoffCase<'_>,
    settings: &ConvergenceSettings,
    speeds: ReferenceSpeeds,
    failure_speed: Option<f64>,
) -> Result<TakeoffResult> {
    let target = settings.target_ratio;
    let mut state = ConvergenceState::new(settings.step);

    for iteration in 1..=settings.max_iterations {
        let rate = state.alpha_reduction_rate;
        let (record, summary) = simulate(case, speeds, Branch::Continue, failure_speed, rate)?;
        let ratio = summary.exit_ratio;
        state.observe(ratio, target);
        log::debug!(
            "pitch-rate iteration {}: rate = {:.4} deg/s, V/Vs = {:.4}",
            iteration,
            rate.to_degrees(),
            ratio
        );

        let report = |outcome| ConvergenceReport { outcome, alpha_reduction_rate: rate, ratio, iterations: iteration };
        if (ratio - target).abs() < settings.tolerance {
            return Ok(TakeoffResult { record, summary, convergence: Some(report(ConvergenceOutcome::Converged)) });
        }

        let next = state.propose(target);
        if next > 0.0 {
            log::warn!(
                "pitch-rate search stopped at the zero-rate boundary: V/Vs = {:.4} (target {:.3})",
                ratio,
                target
            );
            return Ok(TakeoffResult {
                record,
                summary,
                convergence: Some(report(ConvergenceOutcome::BoundaryLimited)),
            });
        }
        state.alpha_reduction_rate = next;
    }

    Err(PerformanceError::ConvergenceFailure {
        iterations: settings.max_iterations,
        best_rate: state.best_rate,
        best_ratio: state.best_ratio,
    })
}

// ---------------------------------------------------------------------------
// Flare rate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlareReport {
    pub rate: f64,      // rad/s
    pub sink_rate: f64, // m/s at touchdown
    pub iterations: usize,
}

/// Flare rate search state. Rates that balloon bound the search from above.
#[derive(Debug, Clone, Copy)]
struct FlareSearch {
    rate: f64,
    /// Highest rate that touched down without climbing
    safe: Option<f64>,
    /// Lowest rate that ballooned
    ballooned: Option<f64>,
    best_rate: f64,
    best_sink_rate: f64,
}

impl FlareSearch {
    fn new(rate: f64) -> Self {
        Self { rate, safe: None, ballooned: None, best_rate: rate, best_sink_rate: f64::INFINITY }
    }

    /// Next rate after a run that touched down at `sink_rate`.
    fn propose(&mut self, sink_rate: f64, ballooned: bool, settings: &FlareConvergenceSettings) -> f64 {
        if ballooned {
            self.ballooned = Some(self.ballooned.map_or(self.rate, |hi| hi.min(self.rate)));
            return match self.safe {
                Some(lo) => 0.5 * (lo + self.rate),
                None => self.rate - settings.coarse_step,
            };
        }
        self.safe = Some(self.safe.map_or(self.rate, |lo| lo.max(self.rate)));
        if sink_rate < self.best_sink_rate {
            self.best_sink_rate = sink_rate;
            self.best_rate = self.rate;
        }
        let step = if sink_rate - settings.target_sink_rate < settings.fine_band {
            settings.fine_step
        } else {
            settings.coarse_step
        };
        let next = self.rate + step;
        match self.ballooned {
            Some(hi) if next >= hi => 0.5 * (self.rate + hi),
            _ => next,
        }
    }
}

/// Raise the flare attitude rate from `case.approach.flare_rate` until the
/// touchdown sink rate drops below `settings.target_sink_rate`.
///
/// Too high a rate floats the aircraft back up; such rates cap the search
/// and the next candidate is taken halfway back.
pub(crate) fn tune_flare_rate(case: &LandingCase<'_>, settings: &FlareConvergenceSettings) -> Result<LandingResult> {
    let mut search = FlareSearch::new(case.approach.flare_rate);

    for iteration in 1..=settings.max_iterations {
        let rate = search.rate;
        let (record, summary) = landing::simulate(case, Start::Screen, rate)?;
        let Some(approach) = summary.approach else {
            break;
        };
        log::debug!(
            "flare-rate iteration {}: rate = {:.3} deg/s, sink = {:.3} m/s{}",
            iteration,
            rate.to_degrees(),
            approach.sink_rate,
            if approach.ballooned { " (ballooned)" } else { "" }
        );
        if !approach.ballooned && approach.sink_rate < settings.target_sink_rate {
            let flare = FlareReport { rate, sink_rate: approach.sink_rate, iterations: iteration };
            return Ok(LandingResult { record, summary, flare: Some(flare) });
        }
        search.rate = search.propose(approach.sink_rate, approach.ballooned, settings);
    }

    Err(PerformanceError::FlareConvergenceFailure {
        iterations: settings.max_iterations,
        best_rate: search.best_rate,
        best_sink_rate: search.best_sink_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::config::TakeoffSettings;
    use crate::performance::takeoff::run_continued_takeoff;
    use crate::physics::ParabolicPolar;
    use crate::vehicle::AircraftBuilder;

    fn model(static_thrust: f64) -> ParabolicPolar {
        ParabolicPolar::new(
            AircraftBuilder::new("test")
                .stall_speed(60.0, 1.225)
                .static_thrust(static_thrust)
                .build(),
        )
    }

    fn settings(k_cl_max: f64) -> TakeoffSettings {
        TakeoffSettings { k_rotation: 1.05, k_lift_off: 1.1, k_cl_max, ..Default::default() }
    }

    #[test]
    fn proposals_keep_a_constant_step() {
        let mut s = ConvergenceState::new(0.1);
        s.last_ratio = 1.1;
        assert_eq!(s.propose(1.2), -0.1);
        s.alpha_reduction_rate = -0.1;
        s.last_ratio = 1.1;
        assert_eq!(s.propose(1.2), -0.2);
        s.alpha_reduction_rate = -0.2;
        s.last_ratio = 1.3;
        assert!((s.propose(1.2) - (-0.1)).abs() < 1e-15);
        s.alpha_reduction_rate = -0.1;
        assert!(s.propose(1.2).abs() < 1e-15);
    }

    #[test]
    fn flare_search_steps_then_bisects_below_a_balloon() {
        let settings = FlareConvergenceSettings {
            target_sink_rate: 0.5,
            coarse_step: 0.1,
            fine_step: 0.02,
            fine_band: 0.25,
            max_iterations: 10,
        };
        let mut s = FlareSearch::new(1.0);
        assert!((s.propose(2.0, false, &settings) - 1.1).abs() < 1e-12);
        s.rate = 1.1;
        assert!((s.propose(0.6, false, &settings) - 1.12).abs() < 1e-12);
        s.rate = 1.12;
        assert!((s.propose(9.0, true, &settings) - 1.11).abs() < 1e-12);
        s.rate = 1.11;
        // the fine step would reach the ballooned rate again
        assert!((s.propose(0.55, false, &settings) - 1.115).abs() < 1e-12);
        assert_eq!(s.best_rate, 1.11);
    }

    #[test]
    fn climb_exit_converges_to_target_ratio() {
        let m = model(70_000.0);
        let case = TakeoffCase::new(&m, m.aircraft())
            .with_settings(settings(0.85))
            .with_convergence(ConvergenceSettings::default());
        let res = run_continued_takeoff(&case, None).unwrap();
        let report = res.convergence.unwrap();
        assert_eq!(report.outcome, ConvergenceOutcome::Converged);
        assert!((res.summary.exit_ratio - 1.2).abs() < 0.01, "ratio {}", res.summary.exit_ratio);
        assert!(report.alpha_reduction_rate < 0.0);
        assert_eq!(res.summary.alpha_reduction_rate, report.alpha_reduction_rate);
    }

    #[test]
    fn one_engine_out_continued_runs_converge() {
        let m = model(120_000.0);
        let case = TakeoffCase::new(&m, m.aircraft())
            .with_settings(settings(0.8))
            .with_convergence(ConvergenceSettings::default());
        let vr = case.reference_speeds().rotation;
        let res = run_continued_takeoff(&case, Some(0.9 * vr)).unwrap();
        assert_eq!(res.convergence.unwrap().outcome, ConvergenceOutcome::Converged);
        assert!(res.summary.times.engine_failure.is_some());
    }

    /// The search only lowers the rate below zero. When the zero-rate run
    /// already exits too fast it stops there instead of pitching up harder.
    #[test]
    fn fast_exit_at_zero_rate_is_boundary_limited() {
        let m = model(70_000.0);
        let target = ConvergenceSettings { target_ratio: 1.05, ..Default::default() };
        let case = TakeoffCase::new(&m, m.aircraft())
            .with_settings(settings(0.85))
            .with_convergence(target);
        let res = run_continued_takeoff(&case, None).unwrap();
        let report = res.convergence.unwrap();
        assert_eq!(report.outcome, ConvergenceOutcome::BoundaryLimited);
        assert_eq!(report.alpha_reduction_rate, 0.0);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn iteration_bound_reports_best_ratio() {
        let m = model(70_000.0);
        let tight = ConvergenceSettings { max_iterations: 2, tolerance: 1e-9, ..Default::default() };
        let case = TakeoffCase::new(&m, m.aircraft())
            .with_settings(settings(0.85))
            .with_convergence(tight);
        match run_continued_takeoff(&case, None) {
            Err(PerformanceError::ConvergenceFailure { iterations, best_ratio, .. }) => {
                assert_eq!(iterations, 2);
                assert!(best_ratio.is_finite() && best_ratio > 1.0);
            }
            other => panic!("expected convergence failure, got {:?}", other.map(|r| r.convergence)),
        }
    }
}
