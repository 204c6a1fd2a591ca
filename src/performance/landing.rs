use serde::Serialize;

use crate::dynamics::landing::{sample_state, FlareLaw, LandingDynamics};
use crate::dynamics::state::{ground, LandingState, Phase};
use crate::error::{PerformanceError, Result};
use crate::performance::config::{ApproachSettings, FlareConvergenceSettings, LandingSettings};
use crate::performance::convergence::{self, FlareReport};
use crate::physics::ForceModel;
use crate::sim::event::{EventGuard, EventKind};
use crate::sim::integrator::IntegratorSettings;
use crate::sim::recorder::{TimeSample, TrajectoryRecord, TrajectoryRecorder};
use crate::sim::runner::{integrate, Simulation, Termination};
use crate::vehicle::Aircraft;

// ---------------------------------------------------------------------------
// Inputs and results
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct LandingCase<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    /// Ground speed at main-gear touchdown for a ground-roll run, m/s. A run
    /// from the screen height reaches its own touchdown speed.
    pub touchdown_speed: f64,
    pub settings: LandingSettings,
    pub approach: ApproachSettings,
    /// Tune the flare attitude rate when set
    pub flare_convergence: Option<FlareConvergenceSettings>,
    pub integrator: IntegratorSettings,
}

impl<'a> LandingCase<'a> {
    pub fn new(model: &'a dyn ForceModel, aircraft: &'a Aircraft, touchdown_speed: f64) -> Self {
        Self {
            model,
            aircraft,
            touchdown_speed,
            settings: LandingSettings::default(),
            approach: ApproachSettings::default(),
            flare_convergence: None,
            integrator: IntegratorSettings::default(),
        }
    }

    /// Case for a landing flown from the screen height.
    pub fn from_screen(model: &'a dyn ForceModel, aircraft: &'a Aircraft) -> Self {
        Self::new(model, aircraft, 0.0)
    }

    pub fn with_settings(mut self, settings: LandingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_approach(mut self, approach: ApproachSettings) -> Self {
        self.approach = approach;
        self
    }

    pub fn with_flare_convergence(mut self, convergence: FlareConvergenceSettings) -> Self {
        self.flare_convergence = Some(convergence);
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorSettings) -> Self {
        self.integrator = integrator;
        self
    }

    /// Stall speed at the runway elevation.
    pub fn stall_speed(&self) -> f64 {
        let ac = self.aircraft;
        self.model
            .stall_speed(self.settings.altitude, ac.weight(), ac.wing_area, ac.cl_max)
    }

    pub fn approach_speed(&self) -> f64 {
        self.approach.k_approach * self.stall_speed()
    }

    fn validate(&self) -> Result<()> {
        self.aircraft.validate()?;
        self.settings.validate()?;
        self.integrator.validate()?;
        Ok(())
    }

    fn validate_touchdown(&self) -> Result<()> {
        self.validate()?;
        if !(self.touchdown_speed.is_finite() && self.touchdown_speed > 0.0) {
            return Err(PerformanceError::config(format!(
                "touchdown speed {} is not positive",
                self.touchdown_speed
            )));
        }
        Ok(())
    }

    fn validate_screen(&self) -> Result<()> {
        self.validate()?;
        self.approach.validate()?;
        if let Some(c) = &self.flare_convergence {
            c.validate()?;
        }
        let speed = self.approach_speed();
        if !(speed.is_finite() && speed > 0.0) {
            return Err(PerformanceError::config(format!("approach speed {} is not positive", speed)));
        }
        Ok(())
    }
}

/// Airborne part of a landing flown from the screen height. Times are
/// measured from the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApproachSummary {
    pub approach_speed: f64, // m/s
    pub flare_rate: f64,     // rad/s
    pub flare_time: f64,     // s
    pub touchdown_time: f64, // s
    /// Screen to touchdown, m
    pub air_distance: f64,
    /// Screen to full stop, m
    pub total_distance: f64,
    /// Positive downwards, m/s
    pub sink_rate: f64,
    /// The flight path turned upwards during the flare
    pub ballooned: bool,
}

/// Roll quantities are measured from touchdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandingSummary {
    pub touchdown_speed: f64,   // m/s
    pub ground_distance: f64,   // m
    pub brake_time: Option<f64>, // s after touchdown
    pub stop_time: f64,         // s after touchdown
    pub fuel_burned: f64,       // kg
    pub approach: Option<ApproachSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingResult {
    pub record: TrajectoryRecord,
    pub summary: LandingSummary,
    /// Present when the flare rate was tuned
    pub flare: Option<FlareReport>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Landing roll from touchdown to rest: free roll for `dt_free_roll`, then
/// braking until the aircraft stops.
pub fn run_landing_ground_roll(case: &LandingCase<'_>) -> Result<LandingResult> {
    case.validate_touchdown()?;
    let (record, summary) = simulate(case, Start::TouchDown, 0.0)?;
    Ok(LandingResult { record, summary, flare: None })
}

/// Full landing from the screen height: steady approach, flare, touchdown,
/// free roll and braking to rest. With `case.flare_convergence` set the flare
/// attitude rate is tuned for a gentle touchdown.
pub fn run_landing(case: &LandingCase<'_>) -> Result<LandingResult> {
    case.validate_screen()?;
    match &case.flare_convergence {
        Some(settings) => convergence::tune_flare_rate(case, settings),
        None => {
            let (record, summary) = simulate(case, Start::Screen, case.approach.flare_rate)?;
            Ok(LandingResult { record, summary, flare: None })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Start {
    TouchDown,
    Screen,
}

/// One landing run at a fixed flare rate.
pub(crate) fn simulate(
    case: &LandingCase<'_>,
    start: Start,
    flare_rate: f64,
) -> Result<(TrajectoryRecord, LandingSummary)> {
    let st = &case.settings;
    let ap = &case.approach;
    let mut dynamics =
        LandingDynamics::on_runway(case.model, case.aircraft, st.alpha_ground, st.throttle, st.altitude);

    let (phase, y0, touchdown) = match start {
        Start::TouchDown => (
            Phase::GroundRoll,
            LandingState::new(0.0, case.touchdown_speed, 0.0, 0.0, 0.0),
            Some(Touchdown { t: 0.0, distance: 0.0, speed: case.touchdown_speed, sink_rate: 0.0 }),
        ),
        Start::Screen => {
            let speed = case.approach_speed();
            dynamics.approach_thrust = dynamics.glide_thrust(speed, ap.approach_angle, ap.obstacle_height);
            (
                Phase::Approach,
                LandingState::new(0.0, speed, ap.approach_angle, ap.obstacle_height, 0.0),
                None,
            )
        }
    };
    let ac = case.aircraft;
    let mut run = LandingRun {
        dynamics,
        phase,
        flare_height: ap.flare_height,
        flare_rate,
        flare_alpha_max: ac.alpha_for_lift_coefficient(ap.k_cl_max * ac.cl_max),
        dt_flare: ap.dt_flare,
        dt_free_roll: st.dt_free_roll,
        guards: vec![
            EventGuard::falling(EventKind::Flare),
            EventGuard::falling(EventKind::TouchDown),
            EventGuard::rising(EventKind::BrakeActivation),
            EventGuard::falling(EventKind::FullStop).terminal().with_tolerance(1e-10),
        ],
        flare_time: None,
        touchdown,
        brake_time: None,
        ballooned: false,
        recorder: TrajectoryRecorder::with_capacity(256),
    };

    let done = integrate(&mut run, &case.integrator, 0.0, y0)?;
    if done.termination == Termination::Horizon {
        return Err(PerformanceError::IntegrationTimeout {
            t_max: case.integrator.t_max,
            partial: Box::new(run.recorder.finish(None)),
        });
    }
    let Some(td) = run.touchdown else {
        return Err(PerformanceError::UnreachablePhase {
            target: EventKind::TouchDown,
            t: done.t,
            speed: done.y[ground::SPEED],
        });
    };

    let approach = match start {
        Start::TouchDown => None,
        Start::Screen => Some(ApproachSummary {
            approach_speed: y0[ground::SPEED],
            flare_rate,
            flare_time: run.flare_time.unwrap_or(td.t),
            touchdown_time: td.t,
            air_distance: td.distance,
            total_distance: done.y[ground::DISTANCE],
            sink_rate: td.sink_rate,
            ballooned: run.ballooned,
        }),
    };
    let summary = LandingSummary {
        touchdown_speed: td.speed,
        ground_distance: done.y[ground::DISTANCE] - td.distance,
        brake_time: run.brake_time.map(|t| t - td.t),
        stop_time: done.t - td.t,
        fuel_burned: done.y[ground::AUX],
        approach,
    };
    log::info!(
        "landing roll stopped {:.2} s after touchdown, {:.1} m ({:.1} kg fuel)",
        summary.stop_time,
        summary.ground_distance,
        summary.fuel_burned
    );
    Ok((run.recorder.finish(Some(EventKind::FullStop)), summary))
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Touchdown {
    t: f64,
    distance: f64,
    speed: f64,
    sink_rate: f64,
}

struct LandingRun<'a> {
    dynamics: LandingDynamics<'a>,
    phase: Phase,
    flare_height: f64,
    flare_rate: f64,
    flare_alpha_max: f64,
    dt_flare: f64,
    dt_free_roll: f64,
    guards: Vec<EventGuard>,
    flare_time: Option<f64>,
    touchdown: Option<Touchdown>,
    brake_time: Option<f64>,
    ballooned: bool,
    recorder: TrajectoryRecorder,
}

impl LandingRun<'_> {
    fn advance(&mut self, next: Phase, t: f64) {
        debug_assert!(self.phase.can_advance_to(next), "{} -> {}", self.phase, next);
        log::debug!("{} -> {} at t = {:.4} s", self.phase, next, t);
        self.phase = next;
    }
}

impl Simulation<5> for LandingRun<'_> {
    type Error = PerformanceError;

    fn derivatives(&self, t: f64, y: &LandingState) -> LandingState {
        self.dynamics.derivatives(self.phase, t, y)
    }

    fn guards(&self) -> &[EventGuard] {
        &self.guards
    }

    fn guard_value(&self, kind: EventKind, t: f64, y: &LandingState) -> Option<f64> {
        let h = y[ground::ALTITUDE];
        match (kind, self.phase) {
            (EventKind::Flare, Phase::Approach) => Some(h - self.flare_height),
            (EventKind::TouchDown, Phase::Flare) => Some(h),
            (EventKind::BrakeActivation, Phase::GroundRoll) => {
                self.touchdown.map(|td| t - (td.t + self.dt_free_roll))
            }
            // the roll may also come to rest before the brakes are applied
            (EventKind::FullStop, phase) if phase.on_ground() && phase != Phase::Stopped => {
                Some(y[ground::SPEED])
            }
            _ => None,
        }
    }

    fn on_event(&mut self, guard: &EventGuard, t: f64, y: &LandingState) -> Result<()> {
        log::debug!(
            "{} at t = {:.4} s, V = {:.3} m/s, h = {:.3} m",
            guard.kind,
            t,
            y[ground::SPEED],
            y[ground::ALTITUDE]
        );
        match guard.kind {
            EventKind::Flare => {
                let approach = self.dynamics.evaluate(Phase::Approach, t, y);
                self.dynamics.flare = Some(FlareLaw {
                    t_start: t,
                    alpha_start: approach.alpha,
                    rate: self.flare_rate,
                    alpha_max: self.flare_alpha_max.max(approach.alpha),
                    thrust_start: approach.thrust,
                    dt_idle: self.dt_flare,
                });
                self.flare_time = Some(t);
                self.advance(Phase::Flare, t);
            }
            EventKind::TouchDown => {
                let speed = y[ground::SPEED];
                self.touchdown = Some(Touchdown {
                    t,
                    distance: y[ground::DISTANCE],
                    speed,
                    sink_rate: -speed * y[ground::GAMMA].sin(),
                });
                self.advance(Phase::GroundRoll, t);
            }
            EventKind::BrakeActivation => {
                self.brake_time = Some(t);
                self.advance(Phase::BrakingRoll, t);
            }
            EventKind::FullStop => self.phase = Phase::Stopped,
            _ => {}
        }
        Ok(())
    }

    fn record(&mut self, t: f64, y: &LandingState, event: Option<EventKind>) {
        if self.phase == Phase::Flare && y[ground::GAMMA] > 0.0 {
            self.ballooned = true;
        }
        let sample = TimeSample {
            t,
            phase: self.phase,
            state: sample_state(self.phase, y),
            derived: self.dynamics.evaluate(self.phase, t, y),
        };
        self.recorder.record(sample, event);
    }

    fn check_step(&self, t0: f64, y0: &LandingState, t1: f64, y1: &LandingState) -> Result<()> {
        if self.phase != Phase::BrakingRoll {
            return Ok(());
        }
        let a0 = self.derivatives(t0, y0)[ground::SPEED];
        let a1 = self.derivatives(t1, y1)[ground::SPEED];
        if a0 >= 0.0 && a1 >= 0.0 {
            return Err(PerformanceError::UnreachablePhase {
                target: EventKind::FullStop,
                t: t1,
                speed: y1[ground::SPEED],
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ParabolicPolar;
    use crate::vehicle::AircraftBuilder;
    use approx::assert_abs_diff_eq;

    fn model() -> ParabolicPolar {
        ParabolicPolar::new(AircraftBuilder::new("test").stall_speed(60.0, 1.225).build())
    }

    #[test]
    fn idle_roll_brakes_to_a_stop() {
        let m = model();
        let res = run_landing_ground_roll(&LandingCase::new(&m, m.aircraft(), 70.0)).unwrap();
        assert_eq!(res.record.termination(), Some(EventKind::FullStop));
        assert_abs_diff_eq!(res.summary.brake_time.unwrap(), 2.0, epsilon = 1e-6);
        assert!(res.summary.stop_time > 2.0);
        assert_abs_diff_eq!(res.record.final_sample().unwrap().state.speed, 0.0, epsilon = 1e-6);
        assert_eq!(res.summary.fuel_burned, 0.0);
        assert!(res.summary.ground_distance > 70.0 * 2.0 * 0.9);
        assert!(res.summary.approach.is_none());
    }

    #[test]
    fn zero_free_roll_brakes_at_touchdown() {
        let m = model();
        let case = LandingCase::new(&m, m.aircraft(), 70.0)
            .with_settings(LandingSettings { dt_free_roll: 0.0, ..Default::default() });
        let res = run_landing_ground_roll(&case).unwrap();
        assert_eq!(res.summary.brake_time, Some(0.0));
        assert_eq!(res.record.termination(), Some(EventKind::FullStop));
        let delayed = run_landing_ground_roll(&LandingCase::new(&m, m.aircraft(), 70.0)).unwrap();
        assert!(res.summary.ground_distance < delayed.summary.ground_distance);
    }

    #[test]
    fn reverse_thrust_shortens_the_roll_and_burns_fuel() {
        let m = model();
        let idle = run_landing_ground_roll(&LandingCase::new(&m, m.aircraft(), 70.0)).unwrap();
        let reverse = LandingCase::new(&m, m.aircraft(), 70.0)
            .with_settings(LandingSettings { throttle: -0.4, ..Default::default() });
        let reverse = run_landing_ground_roll(&reverse).unwrap();
        assert!(reverse.summary.ground_distance < idle.summary.ground_distance);
        assert!(reverse.summary.fuel_burned > 0.0);
        let last = reverse.record.final_sample().unwrap();
        assert!(last.derived.mass < m.aircraft().mass);
    }

    #[test]
    fn forward_thrust_never_stops() {
        let m = model();
        let case = LandingCase::new(&m, m.aircraft(), 70.0)
            .with_settings(LandingSettings { throttle: 1.0, ..Default::default() });
        let err = run_landing_ground_roll(&case).unwrap_err();
        assert!(matches!(err, PerformanceError::UnreachablePhase { target: EventKind::FullStop, .. }), "{}", err);
    }

    #[test]
    fn zero_touchdown_speed_rejected() {
        let m = model();
        let err = run_landing_ground_roll(&LandingCase::new(&m, m.aircraft(), 0.0)).unwrap_err();
        assert!(matches!(err, PerformanceError::Configuration(_)));
    }

    #[test]
    fn screen_landing_flares_touches_down_and_stops() {
        let m = model();
        let res = run_landing(&LandingCase::from_screen(&m, m.aircraft())).unwrap();
        let kinds: Vec<EventKind> = res.record.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Flare, EventKind::TouchDown, EventKind::BrakeActivation, EventKind::FullStop]
        );
        let flare = res.record.event(EventKind::Flare).unwrap();
        assert_abs_diff_eq!(flare.sample.state.altitude, 6.096, epsilon = 1e-6);
        assert_eq!(flare.sample.phase, Phase::Flare);

        let ap = res.summary.approach.unwrap();
        assert_abs_diff_eq!(ap.approach_speed, 1.23 * 60.0, epsilon = 0.1);
        assert!(ap.flare_time < ap.touchdown_time);
        assert!(ap.air_distance > 0.0);
        assert_abs_diff_eq!(ap.total_distance, ap.air_distance + res.summary.ground_distance, epsilon = 1e-9);
        assert!(ap.sink_rate > 0.0);
        assert!(!ap.ballooned);
        assert_abs_diff_eq!(res.summary.brake_time.unwrap(), 2.0, epsilon = 1e-6);
        // the glide holds the approach speed until the flare
        assert_abs_diff_eq!(flare.sample.state.speed, ap.approach_speed, epsilon = 0.2);
    }

    #[test]
    fn steeper_flare_softens_the_touchdown() {
        let m = model();
        let gentle = run_landing(&LandingCase::from_screen(&m, m.aircraft())).unwrap();
        let firm = LandingCase::from_screen(&m, m.aircraft())
            .with_approach(ApproachSettings { flare_rate: 1.5_f64.to_radians(), ..Default::default() });
        let firm = run_landing(&firm).unwrap();
        let (a, b) = (gentle.summary.approach.unwrap(), firm.summary.approach.unwrap());
        assert!(b.sink_rate < a.sink_rate, "{} vs {}", b.sink_rate, a.sink_rate);
        assert!(b.air_distance > a.air_distance);
    }

    #[test]
    fn tuned_flare_meets_the_sink_rate() {
        let m = model();
        let target = FlareConvergenceSettings::default();
        let case = LandingCase::from_screen(&m, m.aircraft()).with_flare_convergence(target);
        let res = run_landing(&case).unwrap();
        let report = res.flare.unwrap();
        let ap = res.summary.approach.unwrap();
        assert!(ap.sink_rate < target.target_sink_rate, "sink {}", ap.sink_rate);
        assert!(!ap.ballooned);
        assert!(report.rate > 1.0_f64.to_radians());
        assert_eq!(report.rate, ap.flare_rate);
        assert!(report.iterations > 1);
        assert_eq!(res.record.termination(), Some(EventKind::FullStop));
    }

    #[test]
    fn bad_approach_rejected() {
        let m = model();
        let case = LandingCase::from_screen(&m, m.aircraft())
            .with_approach(ApproachSettings { flare_height: 30.0, ..Default::default() });
        assert!(matches!(run_landing(&case), Err(PerformanceError::Configuration(_))));
    }

    #[test]
    fn short_horizon_keeps_the_partial_record() {
        let m = model();
        let case = LandingCase::from_screen(&m, m.aircraft())
            .with_integrator(IntegratorSettings { t_max: 3.0, ..Default::default() });
        match run_landing(&case) {
            Err(PerformanceError::IntegrationTimeout { partial, .. }) => {
                assert!(partial.event(EventKind::Flare).is_some());
                assert_eq!(partial.termination(), None);
            }
            other => panic!("expected timeout, got {:?}", other.map(|r| r.summary)),
        }
    }
}
