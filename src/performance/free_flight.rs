use crate::dynamics::point_mass::{sample_state, PointMassDynamics};
use crate::dynamics::state::{point_mass, Phase, PointMassState};
use crate::error::{PerformanceError, Result};
use crate::gnc::AttitudeController;
use crate::physics::ForceModel;
use crate::sim::event::{EventDirection, EventAction, EventGuard, EventKind};
use crate::sim::integrator::IntegratorSettings;
use crate::sim::recorder::{TimeSample, TrajectoryRecord, TrajectoryRecorder};
use crate::sim::runner::{integrate, Simulation, Termination};
use crate::vehicle::Aircraft;

/// Initial conditions and collaborators of a free point-mass trajectory.
#[derive(Clone, Copy)]
pub struct FreeFlightCase<'a> {
    pub model: &'a dyn ForceModel,
    pub aircraft: &'a Aircraft,
    pub controller: &'a dyn AttitudeController,
    /// `[V, gamma, psi, x, y, h]` at t = 0
    pub initial: PointMassState,
    /// Pressure altitude of the `h = 0` plane, m
    pub elevation: f64,
    /// Stop when the altitude crosses this value in either direction
    pub target_altitude: Option<f64>,
    pub integrator: IntegratorSettings,
}

impl<'a> FreeFlightCase<'a> {
    pub fn new(
        model: &'a dyn ForceModel,
        aircraft: &'a Aircraft,
        controller: &'a dyn AttitudeController,
        initial: PointMassState,
    ) -> Self {
        Self {
            model,
            aircraft,
            controller,
            initial,
            elevation: 0.0,
            target_altitude: None,
            integrator: IntegratorSettings::default(),
        }
    }

    pub fn with_target_altitude(mut self, altitude: f64) -> Self {
        self.target_altitude = Some(altitude);
        self
    }
}

/// Propagate the point-mass equations until the ground, the target altitude
/// or `t_max`. Reaching `t_max` is a normal end for free flight; the record
/// then has no terminal event.
pub fn run_free_trajectory(case: &FreeFlightCase<'_>, t_max: f64) -> Result<TrajectoryRecord> {
    case.aircraft.validate()?;
    if !(t_max.is_finite() && t_max > 0.0) {
        return Err(PerformanceError::config(format!("t_max {} is not positive", t_max)));
    }
    if !case.initial.iter().all(|v| v.is_finite()) || case.initial[point_mass::SPEED] <= 0.0 {
        return Err(PerformanceError::config("initial state must be finite with positive speed"));
    }
    if case.initial[point_mass::ALTITUDE] < 0.0 {
        return Err(PerformanceError::config("initial altitude is below the ground plane"));
    }
    let settings = IntegratorSettings { t_max, ..case.integrator };

    let mut guards = vec![EventGuard::falling(EventKind::GroundImpact).terminal()];
    if case.target_altitude.is_some() {
        guards.push(EventGuard::new(EventKind::TargetAltitude, EventDirection::Any, EventAction::Stop));
    }
    let mut run = FreeFlightRun {
        dynamics: PointMassDynamics {
            model: case.model,
            aircraft: case.aircraft,
            controller: case.controller,
            elevation: case.elevation,
        },
        guards,
        target_altitude: case.target_altitude,
        recorder: TrajectoryRecorder::with_capacity(256),
    };
    log::debug!("free trajectory with {} controller", case.controller.name());

    let done = integrate(&mut run, &settings, 0.0, case.initial)?;
    let termination = match done.termination {
        Termination::Event(kind) => Some(kind),
        Termination::Horizon => None,
    };
    log::info!(
        "free trajectory ended at t = {:.2} s, h = {:.1} m ({})",
        done.t,
        done.y[point_mass::ALTITUDE],
        termination.map_or_else(|| "horizon".to_string(), |k| k.to_string())
    );
    Ok(run.recorder.finish(termination))
}

struct FreeFlightRun<'a> {
    dynamics: PointMassDynamics<'a>,
    guards: Vec<EventGuard>,
    target_altitude: Option<f64>,
    recorder: TrajectoryRecorder,
}

impl Simulation<6> for FreeFlightRun<'_> {
    type Error = PerformanceError;

    fn derivatives(&self, t: f64, y: &PointMassState) -> PointMassState {
        self.dynamics.derivatives(t, y)
    }

    fn guards(&self) -> &[EventGuard] {
        &self.guards
    }

    fn guard_value(&self, kind: EventKind, _t: f64, y: &PointMassState) -> Option<f64> {
        let h = y[point_mass::ALTITUDE];
        match kind {
            EventKind::GroundImpact => Some(h),
            EventKind::TargetAltitude => self.target_altitude.map(|target| h - target),
            _ => None,
        }
    }

    fn on_event(&mut self, guard: &EventGuard, t: f64, y: &PointMassState) -> Result<()> {
        log::debug!(
            "{} at t = {:.4} s, V = {:.3} m/s, h = {:.3} m",
            guard.kind,
            t,
            y[point_mass::SPEED],
            y[point_mass::ALTITUDE]
        );
        Ok(())
    }

    fn record(&mut self, t: f64, y: &PointMassState, event: Option<EventKind>) {
        let sample = TimeSample {
            t,
            phase: Phase::Airborne,
            state: sample_state(y),
            derived: self.dynamics.evaluate(t, y),
        };
        self.recorder.record(sample, event);
    }
}
