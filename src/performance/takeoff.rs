use serde::Serialize;

use crate::dynamics::state::{ground, Phase, TakeoffState};
use crate::dynamics::takeoff::{sample_state, Regime, TakeoffDynamics};
use crate::error::{Branch, PerformanceError, Result};
use crate::gnc::{lift_off_attitude, PitchMode, PitchSchedule};
use crate::performance::config::{ConvergenceSettings, TakeoffSettings};
use crate::performance::convergence::{self, ConvergenceReport};
use crate::physics::ForceModel;
use crate::sim::event::{EventGuard, EventKind};
use crate::sim::integrator::IntegratorSettings;
use crate::sim::recorder::{TimeSample, TrajectoryRecord, TrajectoryRecorder};
use crate::sim::runner::{integrate, Simulation, Termination};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Inputs and results
// ---------------------------------------------------------------------------

/// Everything a takeoff run needs. The force model and aircraft are shared
/// read-only, so a case can be copied into parallel runs.
#[derive(Clone, Copy)]
pub struct TakeoffCase<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    pub settings: TakeoffSettings,
    pub integrator: IntegratorSettings,
    /// Tune the post-hold attitude rate of continued runs when set
    pub convergence: Option<ConvergenceSettings>,
}

impl<'a> TakeoffCase<'a> {
    pub fn new(model: &'a dyn ForceModel, aircraft: &'a Aircraft) -> Self {
        Self {
            model,
            aircraft,
            settings: TakeoffSettings::default(),
            integrator: IntegratorSettings::default(),
            convergence: None,
        }
    }

    pub fn with_settings(mut self, settings: TakeoffSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorSettings) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceSettings) -> Self {
        self.convergence = Some(convergence);
        self
    }

    pub fn reference_speeds(&self) -> ReferenceSpeeds {
        let ac = self.aircraft;
        let stall = self
            .model
            .stall_speed(self.settings.altitude, ac.weight(), ac.wing_area, ac.cl_max);
        ReferenceSpeeds {
            stall,
            rotation: self.settings.k_rotation * stall,
            lift_off: self.settings.k_lift_off * stall,
        }
    }

    /// Reject inconsistent inputs before any integration starts.
    pub fn validate(&self, failure_speed: Option<f64>) -> Result<ReferenceSpeeds> {
        self.aircraft.validate()?;
        self.settings.validate()?;
        self.integrator.validate()?;
        if let Some(c) = &self.convergence {
            c.validate()?;
        }
        let speeds = self.reference_speeds();
        if !(speeds.stall.is_finite() && speeds.stall > 0.0) {
            return Err(PerformanceError::config(format!("stall speed {} is not positive", speeds.stall)));
        }
        if let Some(vf) = failure_speed {
            if !(vf.is_finite() && vf > 0.0) {
                return Err(PerformanceError::config(format!("failure speed {} is not positive", vf)));
            }
            if vf > speeds.rotation {
                return Err(PerformanceError::config(format!(
                    "failure speed {:.3} m/s is above the rotation speed {:.3} m/s",
                    vf, speeds.rotation
                )));
            }
        }
        Ok(speeds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceSpeeds {
    pub stall: f64,    // m/s
    pub rotation: f64, // m/s
    pub lift_off: f64, // m/s
}

/// Instants of the fired guards. `None` means "not yet fired".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EventTimes {
    pub engine_failure: Option<f64>,
    pub rotation: Option<f64>,
    pub lift_off: Option<f64>,
    pub bar_hold: Option<f64>,
    pub end_hold: Option<f64>,
    pub steady_climb: Option<f64>,
    pub obstacle_clearance: Option<f64>,
    pub brake_activation: Option<f64>,
    pub full_stop: Option<f64>,
}

impl EventTimes {
    fn slot(&mut self, kind: EventKind) -> Option<&mut Option<f64>> {
        match kind {
            EventKind::EngineFailure => Some(&mut self.engine_failure),
            EventKind::Rotation => Some(&mut self.rotation),
            EventKind::LiftOff => Some(&mut self.lift_off),
            EventKind::BarHold => Some(&mut self.bar_hold),
            EventKind::EndHold => Some(&mut self.end_hold),
            EventKind::SteadyClimb => Some(&mut self.steady_climb),
            EventKind::ObstacleClearance => Some(&mut self.obstacle_clearance),
            EventKind::BrakeActivation => Some(&mut self.brake_activation),
            EventKind::FullStop => Some(&mut self.full_stop),
            EventKind::GroundImpact | EventKind::TargetAltitude | EventKind::Flare | EventKind::TouchDown => None,
        }
    }

    fn set(&mut self, kind: EventKind, t: f64) {
        if let Some(slot) = self.slot(kind) {
            *slot = Some(t);
        }
    }
}

/// Headline numbers of one takeoff run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TakeoffSummary {
    pub branch: Branch,
    pub speeds: ReferenceSpeeds,
    pub failure_speed: Option<f64>,
    pub alpha_reduction_rate: f64, // rad/s
    /// Speed at the terminal event (obstacle or full stop), m/s
    pub exit_speed: f64,
    /// `exit_speed` over stall speed
    pub exit_ratio: f64,
    pub ground_distance: f64, // m
    pub time: f64,            // s
    pub times: EventTimes,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeoffResult {
    pub record: TrajectoryRecord,
    pub summary: TakeoffSummary,
    /// Present when the attitude rate was tuned
    pub convergence: Option<ConvergenceReport>,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Takeoff to the obstacle height, optionally losing an engine at
/// `failure_speed`. With `case.convergence` set the post-hold attitude rate is
/// tuned so the obstacle is crossed at the target multiple of stall speed.
pub fn run_continued_takeoff(case: &TakeoffCase<'_>, failure_speed: Option<f64>) -> Result<TakeoffResult> {
    let speeds = case.validate(failure_speed)?;
    match &case.convergence {
        Some(settings) => convergence::tune_reduction_rate(case, settings, speeds, failure_speed),
        None => {
            let rate = case.settings.alpha_reduction_rate;
            let (record, summary) = simulate(case, speeds, Branch::Continue, failure_speed, rate)?;
            Ok(TakeoffResult { record, summary, convergence: None })
        }
    }
}

/// Rejected takeoff: an engine fails at `failure_speed`, the brakes come on
/// after the reaction delay and the run ends at rest.
pub fn run_aborted_takeoff(case: &TakeoffCase<'_>, failure_speed: f64) -> Result<TakeoffResult> {
    let speeds = case.validate(Some(failure_speed))?;
    let rate = case.settings.alpha_reduction_rate;
    let (record, summary) = simulate(case, speeds, Branch::Abort, Some(failure_speed), rate)?;
    Ok(TakeoffResult { record, summary, convergence: None })
}

/// One integration of an already validated case.
pub(crate) fn simulate(
    case: &TakeoffCase<'_>,
    speeds: ReferenceSpeeds,
    branch: Branch,
    failure_speed: Option<f64>,
    alpha_reduction_rate: f64,
) -> Result<(TrajectoryRecord, TakeoffSummary)> {
    let st = &case.settings;
    let schedule = PitchSchedule::rotating_to(
        st.alpha_ground,
        lift_off_attitude(case.aircraft, st.k_lift_off),
        st.dt_rotation,
        st.k_alpha_dot,
        alpha_reduction_rate,
    );
    let dynamics = TakeoffDynamics {
        model: case.model,
        aircraft: case.aircraft,
        schedule,
        failure_drag_factor: st.failure_drag_factor,
        throttle: st.throttle,
        elevation: st.altitude,
    };
    let mut run = TakeoffRun::new(dynamics, st, speeds, branch, failure_speed);
    let y0 = TakeoffState::new(0.0, 0.0, 0.0, 0.0, st.alpha_ground);

    let done = integrate(&mut run, &case.integrator, 0.0, y0)?;
    let kind = match done.termination {
        Termination::Event(kind) => kind,
        Termination::Horizon => {
            return Err(PerformanceError::IntegrationTimeout {
                t_max: case.integrator.t_max,
                partial: Box::new(run.recorder.finish(None)),
            })
        }
    };

    let speed = done.y[ground::SPEED];
    let summary = TakeoffSummary {
        branch,
        speeds,
        failure_speed,
        alpha_reduction_rate,
        exit_speed: speed,
        exit_ratio: speed / speeds.stall,
        ground_distance: done.y[ground::DISTANCE],
        time: done.t,
        times: run.times,
    };
    log::info!(
        "{} takeoff ended with {} at t = {:.2} s after {:.1} m ({} steps)",
        branch,
        kind,
        done.t,
        summary.ground_distance,
        done.steps
    );
    Ok((run.recorder.finish(Some(kind)), summary))
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

struct TakeoffRun<'a> {
    dynamics: TakeoffDynamics<'a>,
    regime: Regime,
    branch: Branch,
    guards: Vec<EventGuard>,
    speeds: ReferenceSpeeds,
    failure_speed: Option<f64>,
    cl_hold: f64,
    dt_hold: f64,
    obstacle_height: f64,
    reaction_delay: f64,
    times: EventTimes,
    recorder: TrajectoryRecorder,
}

impl<'a> TakeoffRun<'a> {
    fn new(
        dynamics: TakeoffDynamics<'a>,
        settings: &TakeoffSettings,
        speeds: ReferenceSpeeds,
        branch: Branch,
        failure_speed: Option<f64>,
    ) -> Self {
        let mut guards = Vec::new();
        if failure_speed.is_some() {
            guards.push(EventGuard::rising(EventKind::EngineFailure));
        }
        match branch {
            Branch::Continue => guards.extend([
                EventGuard::rising(EventKind::Rotation),
                EventGuard::rising(EventKind::LiftOff),
                EventGuard::rising(EventKind::BarHold),
                EventGuard::rising(EventKind::EndHold),
                EventGuard::falling(EventKind::SteadyClimb),
                EventGuard::rising(EventKind::ObstacleClearance).terminal(),
                EventGuard::falling(EventKind::GroundImpact).terminal(),
            ]),
            Branch::Abort => guards.extend([
                EventGuard::rising(EventKind::BrakeActivation),
                EventGuard::falling(EventKind::FullStop).terminal().with_tolerance(1e-10),
            ]),
        }
        Self {
            cl_hold: settings.k_cl_max * dynamics.aircraft.cl_max,
            dynamics,
            regime: Regime::default(),
            branch,
            guards,
            speeds,
            failure_speed,
            dt_hold: settings.dt_hold,
            obstacle_height: settings.obstacle_height,
            reaction_delay: settings.reaction_delay,
            times: EventTimes::default(),
            recorder: TrajectoryRecorder::with_capacity(512),
        }
    }

    fn advance(&mut self, next: Phase, t: f64) {
        debug_assert!(
            self.regime.phase.can_advance_to(next),
            "illegal transition {} -> {}",
            self.regime.phase,
            next
        );
        log::debug!("phase {} -> {} at t = {:.4} s", self.regime.phase, next, t);
        self.regime.phase = next;
    }

    /// Speed threshold the run still has to reach on the runway.
    fn pending_speed_target(&self) -> Option<EventKind> {
        let phase = self.regime.phase;
        if self.failure_speed.is_some()
            && !self.regime.engine_failed
            && matches!(phase, Phase::GroundRoll | Phase::Rotation)
        {
            Some(EventKind::EngineFailure)
        } else if self.branch == Branch::Continue && phase == Phase::GroundRoll {
            Some(EventKind::Rotation)
        } else {
            None
        }
    }
}

impl Simulation<5> for TakeoffRun<'_> {
    type Error = PerformanceError;

    fn derivatives(&self, t: f64, y: &TakeoffState) -> TakeoffState {
        self.dynamics.derivatives(self.regime, t, y)
    }

    fn guards(&self) -> &[EventGuard] {
        &self.guards
    }

    fn guard_value(&self, kind: EventKind, t: f64, y: &TakeoffState) -> Option<f64> {
        let phase = self.regime.phase;
        let pitch = self.regime.pitch;
        let speed = y[ground::SPEED];
        match kind {
            EventKind::EngineFailure if !self.regime.engine_failed => {
                self.failure_speed.map(|vf| speed - vf)
            }
            EventKind::Rotation if phase == Phase::GroundRoll => Some(speed - self.speeds.rotation),
            EventKind::LiftOff if phase == Phase::Rotation => {
                Some(self.dynamics.evaluate(self.regime, t, y).load_factor - 1.0)
            }
            EventKind::BarHold if pitch == PitchMode::Rising => {
                Some(self.dynamics.evaluate(self.regime, t, y).cl - self.cl_hold)
            }
            EventKind::EndHold if pitch == PitchMode::Holding => {
                self.times.bar_hold.map(|t_hold| t - (t_hold + self.dt_hold))
            }
            EventKind::SteadyClimb if pitch == PitchMode::Reducing && phase == Phase::Airborne => {
                Some(self.dynamics.evaluate(self.regime, t, y).load_factor - 1.0)
            }
            EventKind::ObstacleClearance => Some(y[ground::ALTITUDE] - self.obstacle_height),
            EventKind::GroundImpact if !phase.on_ground() => Some(y[ground::ALTITUDE]),
            EventKind::BrakeActivation if phase == Phase::GroundRoll => self
                .times
                .engine_failure
                .map(|t_fail| t - (t_fail + self.reaction_delay)),
            EventKind::FullStop if phase == Phase::BrakingRoll => Some(speed),
            _ => None,
        }
    }

    fn on_event(&mut self, guard: &EventGuard, t: f64, y: &TakeoffState) -> Result<()> {
        log::debug!(
            "{} at t = {:.4} s, V = {:.3} m/s, h = {:.3} m",
            guard.kind,
            t,
            y[ground::SPEED],
            y[ground::ALTITUDE]
        );
        self.times.set(guard.kind, t);
        match guard.kind {
            EventKind::EngineFailure => self.regime.engine_failed = true,
            EventKind::Rotation => {
                self.advance(Phase::Rotation, t);
                self.regime.pitch = PitchMode::Rising;
            }
            EventKind::LiftOff => self.advance(Phase::Airborne, t),
            EventKind::BarHold => self.regime.pitch = PitchMode::Holding,
            EventKind::EndHold => self.regime.pitch = PitchMode::Reducing,
            EventKind::SteadyClimb => {
                self.advance(Phase::ClimbOut, t);
                self.regime.pitch = PitchMode::Trimmed;
            }
            EventKind::BrakeActivation => self.advance(Phase::BrakingRoll, t),
            EventKind::FullStop => self.advance(Phase::Stopped, t),
            EventKind::GroundImpact => {
                return Err(PerformanceError::UnreachablePhase {
                    target: EventKind::ObstacleClearance,
                    t,
                    speed: y[ground::SPEED],
                })
            }
            EventKind::ObstacleClearance | EventKind::TargetAltitude | EventKind::Flare | EventKind::TouchDown => {}
        }
        Ok(())
    }

    fn record(&mut self, t: f64, y: &TakeoffState, event: Option<EventKind>) {
        let sample = TimeSample {
            t,
            phase: self.regime.phase,
            state: sample_state(y),
            derived: self.dynamics.evaluate(self.regime, t, y),
        };
        self.recorder.record(sample, event);
    }

    /// A runway speed target with non-positive acceleration over a whole step
    /// can never be reached.
    fn check_step(&self, t0: f64, y0: &TakeoffState, t1: f64, y1: &TakeoffState) -> Result<()> {
        let Some(target) = self.pending_speed_target() else {
            return Ok(());
        };
        let a0 = self.derivatives(t0, y0)[ground::SPEED];
        let a1 = self.derivatives(t1, y1)[ground::SPEED];
        if a0 <= 0.0 && a1 <= 0.0 {
            return Err(PerformanceError::UnreachablePhase { target, t: t1, speed: y1[ground::SPEED] });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ParabolicPolar;
    use crate::vehicle::AircraftBuilder;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn model(static_thrust: f64) -> ParabolicPolar {
        ParabolicPolar::new(
            AircraftBuilder::new("test")
                .stall_speed(60.0, 1.225)
                .static_thrust(static_thrust)
                .build(),
        )
    }

    fn scenario_settings() -> TakeoffSettings {
        TakeoffSettings { k_rotation: 1.1, k_lift_off: 1.1, ..Default::default() }
    }

    fn case(model: &ParabolicPolar) -> TakeoffCase<'_> {
        TakeoffCase::new(model, model.aircraft()).with_settings(scenario_settings())
    }

    #[test]
    fn reference_speeds_follow_factors() {
        let m = model(70_000.0);
        let speeds = case(&m).reference_speeds();
        assert_relative_eq!(speeds.stall, 60.0, max_relative = 1e-3);
        assert_relative_eq!(speeds.rotation, 1.1 * speeds.stall);
        assert_relative_eq!(speeds.lift_off, 1.1 * speeds.stall);
    }

    #[test]
    fn all_engines_takeoff_clears_obstacle() {
        let m = model(70_000.0);
        let res = run_continued_takeoff(&case(&m), None).unwrap();
        let times = res.summary.times;
        assert_eq!(res.record.termination(), Some(EventKind::ObstacleClearance));

        let t_rot = times.rotation.unwrap();
        let t_lo = times.lift_off.unwrap();
        let t_bar = times.bar_hold.unwrap();
        let t_end = times.end_hold.unwrap();
        let t_exit = times.obstacle_clearance.unwrap();
        assert!(times.engine_failure.is_none());
        assert!(0.0 < t_rot && t_rot < t_lo && t_rot < t_bar);
        assert!(t_bar <= t_end && t_end < t_exit);
        assert_relative_eq!(t_end - t_bar, 0.5, epsilon = 1e-6);

        let last = res.record.final_sample().unwrap();
        assert_abs_diff_eq!(last.state.altitude, 10.7, epsilon = 1e-6);
        assert_relative_eq!(res.summary.exit_speed, last.state.speed);
    }

    #[test]
    fn zero_hold_reduces_attitude_at_bar_hold() {
        let m = model(70_000.0);
        let settings = TakeoffSettings { dt_hold: 0.0, ..scenario_settings() };
        let res = run_continued_takeoff(&case(&m).with_settings(settings), None).unwrap();
        let times = res.summary.times;
        assert_eq!(times.end_hold, times.bar_hold);
        assert!(times.end_hold.is_some());
        assert_eq!(res.record.termination(), Some(EventKind::ObstacleClearance));
    }

    #[test]
    fn rotation_event_at_rotation_speed() {
        let m = model(70_000.0);
        let res = run_continued_takeoff(&case(&m), None).unwrap();
        let rot = res.record.event(EventKind::Rotation).unwrap();
        assert_abs_diff_eq!(rot.sample.state.speed, res.summary.speeds.rotation, epsilon = 1e-6);
        assert_eq!(rot.sample.phase, Phase::Rotation);
    }

    #[test]
    fn ground_distance_strictly_increases() {
        let m = model(70_000.0);
        let res = run_continued_takeoff(&case(&m), None).unwrap();
        let samples = res.record.samples();
        assert!(samples.len() > 10);
        // event samples repeat the instant of the preceding sample
        assert!(samples
            .windows(2)
            .filter(|w| w[1].t > w[0].t)
            .all(|w| w[1].state.ground_distance > w[0].state.ground_distance));
        assert!(samples.windows(2).all(|w| w[1].t >= w[0].t));
    }

    #[test]
    fn samples_balance_forces() {
        let m = model(70_000.0);
        let res = run_continued_takeoff(&case(&m), Some(55.0)).unwrap();
        for s in res.record.samples() {
            let d = &s.derived;
            assert_relative_eq!(d.total_force, d.mass * d.acceleration, epsilon = 1e-6, max_relative = 1e-9);
        }
    }

    #[test]
    fn phases_never_go_backwards() {
        let m = model(70_000.0);
        let res = run_continued_takeoff(&case(&m), None).unwrap();
        for w in res.record.samples().windows(2) {
            let (a, b) = (w[0].phase, w[1].phase);
            assert!(a == b || a.can_advance_to(b), "{} -> {}", a, b);
        }
    }

    #[test]
    fn identical_inputs_give_identical_records() {
        let m = model(70_000.0);
        let a = run_continued_takeoff(&case(&m), Some(50.0)).unwrap();
        let b = run_continued_takeoff(&case(&m), Some(50.0)).unwrap();
        assert_eq!(a.record, b.record);
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn aborted_takeoff_stops() {
        let m = model(70_000.0);
        let res = run_aborted_takeoff(&case(&m), 50.0).unwrap();
        let times = res.summary.times;
        assert_eq!(res.record.termination(), Some(EventKind::FullStop));

        let failure = res.record.event(EventKind::EngineFailure).unwrap();
        assert_abs_diff_eq!(failure.sample.state.speed, 50.0, epsilon = 1e-6);
        let t_fail = times.engine_failure.unwrap();
        assert_abs_diff_eq!(times.brake_activation.unwrap(), t_fail + 3.0, epsilon = 1e-6);
        assert!(times.full_stop.unwrap() > times.brake_activation.unwrap());
        assert!(times.rotation.is_none());
        assert_abs_diff_eq!(res.summary.exit_speed, 0.0, epsilon = 1e-6);
        assert_eq!(res.record.final_sample().unwrap().phase, Phase::Stopped);
    }

    #[test]
    fn zero_reaction_delay_brakes_at_failure() {
        let m = model(70_000.0);
        let settings = TakeoffSettings { reaction_delay: 0.0, ..scenario_settings() };
        let res = run_aborted_takeoff(&case(&m).with_settings(settings), 50.0).unwrap();
        let times = res.summary.times;
        assert_eq!(times.brake_activation, times.engine_failure);
        assert_eq!(res.record.termination(), Some(EventKind::FullStop));
        let delayed = run_aborted_takeoff(&case(&m), 50.0).unwrap();
        assert!(res.summary.ground_distance < delayed.summary.ground_distance);
    }

    #[test]
    fn failure_at_rotation_speed_fires_both() {
        let m = model(120_000.0);
        let c = case(&m);
        let vr = c.reference_speeds().rotation;
        let res = run_continued_takeoff(&c, Some(vr)).unwrap();
        let times = res.summary.times;
        assert_eq!(times.engine_failure, times.rotation);
        assert_eq!(res.record.termination(), Some(EventKind::ObstacleClearance));
    }

    #[test]
    fn failure_above_rotation_rejected() {
        let m = model(70_000.0);
        let err = run_aborted_takeoff(&case(&m), 80.0).unwrap_err();
        assert!(matches!(err, PerformanceError::Configuration(_)));
        let err = run_continued_takeoff(&case(&m), Some(-1.0)).unwrap_err();
        assert!(matches!(err, PerformanceError::Configuration(_)));
    }

    #[test]
    fn insufficient_thrust_is_unreachable() {
        let m = model(1_000.0);
        let err = run_continued_takeoff(&case(&m), None).unwrap_err();
        assert!(matches!(err, PerformanceError::UnreachablePhase { target: EventKind::Rotation, .. }), "{}", err);
    }

    #[test]
    fn short_horizon_times_out_with_partial_record() {
        let m = model(70_000.0);
        let c = case(&m).with_integrator(IntegratorSettings { t_max: 10.0, ..Default::default() });
        match run_continued_takeoff(&c, None) {
            Err(PerformanceError::IntegrationTimeout { t_max, partial }) => {
                assert_eq!(t_max, 10.0);
                assert!(!partial.is_empty());
                assert_abs_diff_eq!(partial.final_sample().unwrap().t, 10.0, epsilon = 1e-9);
                assert_eq!(partial.termination(), None);
            }
            other => panic!("expected timeout, got {:?}", other.map(|r| r.summary)),
        }
    }

    #[test]
    fn invalid_aircraft_rejected_before_running() {
        let ac = AircraftBuilder::new("broken").mass(-5.0).build();
        let m = ParabolicPolar::new(ac);
        let err = run_continued_takeoff(&TakeoffCase::new(&m, m.aircraft()), None).unwrap_err();
        assert!(matches!(err, PerformanceError::Configuration(_)));
    }
}
