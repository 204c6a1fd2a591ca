use nalgebra::SVector;

use super::event::{sign_change_detected, Bracket, CrossingLocator, EventAction, EventGuard, EventKind};
use super::integrator::{DenseStep, DormandPrince, IntegrationError, IntegratorSettings};

// ---------------------------------------------------------------------------
// Run context contract
// ---------------------------------------------------------------------------

/// The mutable state of one integration run.
///
/// The integrator only calls `derivatives` and `guard_value` between events,
/// so both must be pure functions of `(t, y)` and the context's current
/// phase. Phase switches happen exclusively inside `on_event`.
pub trait Simulation<const N: usize> {
    type Error: From<IntegrationError>;

    fn derivatives(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N>;

    /// Guards armed for this run, in logical order.
    fn guards(&self) -> &[EventGuard];

    /// Guard function value, or `None` while the guard is not armed.
    fn guard_value(&self, kind: EventKind, t: f64, y: &SVector<f64, N>) -> Option<f64>;

    /// Apply the bookkeeping of a fired guard at the located crossing.
    fn on_event(&mut self, guard: &EventGuard, t: f64, y: &SVector<f64, N>) -> Result<(), Self::Error>;

    /// Sample the trajectory. Called at `t0`, after every accepted step and at
    /// every fired guard.
    fn record(&mut self, t: f64, y: &SVector<f64, N>, event: Option<EventKind>);

    /// Inspect an accepted step before it is committed.
    fn check_step(
        &self,
        _t0: f64,
        _y0: &SVector<f64, N>,
        _t1: f64,
        _y1: &SVector<f64, N>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Event(EventKind),
    /// `t_max` reached before any terminal guard fired
    Horizon,
}

#[derive(Debug, Clone)]
pub struct Completion<const N: usize> {
    pub t: f64,
    pub y: SVector<f64, N>,
    pub termination: Termination,
    pub steps: usize,
}

// ---------------------------------------------------------------------------
// Event-driven integration loop
// ---------------------------------------------------------------------------

/// Integrate `sim` from `(t0, y0)` until a terminal guard fires or
/// `settings.t_max` is reached.
///
/// Guards are evaluated only on accepted steps. When one or more guards change
/// sign inside a step, the earliest crossing is located on the dense output,
/// the step is truncated there, every guard crossing within its tolerance of
/// that instant fires, and integration restarts from the crossing with the
/// updated right-hand side.
pub fn integrate<S, const N: usize>(
    sim: &mut S,
    settings: &IntegratorSettings,
    t0: f64,
    y0: SVector<f64, N>,
) -> Result<Completion<N>, S::Error>
where
    S: Simulation<N>,
{
    settings.validate()?;
    if !is_finite(&y0) {
        return Err(IntegrationError::NonFiniteState { t: t0 }.into());
    }

    let solver = DormandPrince::from_settings(settings);
    let guards: Vec<EventGuard> = sim.guards().to_vec();
    let mut fired = vec![false; guards.len()];

    let mut t = t0;
    let mut y = y0;
    let mut h = settings.initial_step.min(settings.max_step);
    let mut steps = 0usize;

    sim.record(t, &y, None);
    let mut g_prev = armed_values(&*sim, &guards, &fired, t, &y);

    loop {
        let remaining = settings.t_max - t;
        if remaining <= settings.min_step {
            return Ok(Completion { t, y, termination: Termination::Horizon, steps });
        }
        if steps >= settings.max_steps {
            return Err(IntegrationError::MaxStepsExceeded { steps, t }.into());
        }
        h = h.min(settings.max_step).min(remaining);

        let outcome = solver.step(&|tt: f64, yy: &SVector<f64, N>| sim.derivatives(tt, yy), t, &y, h);
        steps += 1;

        if !outcome.accepted {
            log::trace!("rejected step h = {:.3e} s at t = {:.6} s (error {:.3})", h, t, outcome.error);
            h = outcome.h_next;
            if h < settings.min_step {
                return Err(IntegrationError::StepSizeTooSmall { t, h }.into());
            }
            continue;
        }

        let dense = outcome.dense;
        let t1 = dense.t1();
        if !is_finite(&dense.y1) {
            return Err(IntegrationError::NonFiniteState { t: t1 }.into());
        }

        // --- Guards on the accepted step ---
        let mut hits: Vec<(f64, usize)> = Vec::new();
        for (i, guard) in guards.iter().enumerate() {
            if fired[i] {
                continue;
            }
            let Some(g0) = g_prev[i] else { continue };
            let Some(g1) = sim.guard_value(guard.kind, t1, &dense.y1) else { continue };
            if sign_change_detected(g0, g1, guard.direction) {
                let root = locate(&*sim, guard, &dense, g0, g1, settings)?;
                hits.push((root, i));
            }
        }

        let Some(t_event) = hits.iter().map(|&(root, _)| root).reduce(f64::min) else {
            sim.check_step(t, &y, t1, &dense.y1)?;
            t = t1;
            y = dense.y1;
            sim.record(t, &y, None);
            g_prev = armed_values(&*sim, &guards, &fired, t, &y);
            h = outcome.h_next;
            continue;
        };

        // --- Truncate the step at the earliest crossing ---
        let y_event = dense.eval(t_event);
        sim.check_step(t, &y, t_event, &y_event)?;

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut terminal = None;
        for &(root, i) in &hits {
            let guard = &guards[i];
            if root - t_event > guard.tolerance.max(settings.event_tolerance) {
                continue;
            }
            fired[i] = true;
            log::trace!("{} located at t = {:.9} s", guard.kind, t_event);
            sim.on_event(guard, t_event, &y_event)?;
            sim.record(t_event, &y_event, Some(guard.kind));
            if guard.action == EventAction::Stop && terminal.is_none() {
                terminal = Some(guard.kind);
            }
        }

        t = t_event;
        y = y_event;
        if let Some(kind) = terminal {
            return Ok(Completion { t, y, termination: Termination::Event(kind), steps });
        }
        g_prev = armed_values(&*sim, &guards, &fired, t, &y);
        h = outcome.h_next.min(h);
    }
}

fn armed_values<S, const N: usize>(
    sim: &S,
    guards: &[EventGuard],
    fired: &[bool],
    t: f64,
    y: &SVector<f64, N>,
) -> Vec<Option<f64>>
where
    S: Simulation<N>,
{
    guards
        .iter()
        .zip(fired)
        .map(|(guard, &done)| if done { None } else { sim.guard_value(guard.kind, t, y) })
        .collect()
}

/// Root of one guard on the dense output of an accepted step.
fn locate<S, const N: usize>(
    sim: &S,
    guard: &EventGuard,
    dense: &DenseStep<N>,
    g0: f64,
    g1: f64,
    settings: &IntegratorSettings,
) -> Result<f64, IntegrationError>
where
    S: Simulation<N>,
{
    let tol = if guard.is_terminal() {
        settings.terminal_event_tolerance
    } else {
        settings.event_tolerance
    };
    let locator = CrossingLocator::new(tol.min(guard.tolerance), settings.event_max_iterations);
    let g = |tau: f64| sim.guard_value(guard.kind, tau, &dense.eval(tau)).unwrap_or(g1);
    let bracket = Bracket { t0: dense.t0, t1: dense.t1(), g0, g1 };
    locator
        .locate(g, bracket)
        .map(|root| root.clamp(dense.t0, dense.t1()))
        .map_err(|e| IntegrationError::EventLocation { kind: guard.kind, message: e.to_string() })
}

fn is_finite<const N: usize>(y: &SVector<f64, N>) -> bool {
    y.iter().all(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
