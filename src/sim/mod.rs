pub mod event;
pub mod integrator;
pub mod recorder;
pub mod runner;

pub use event::{EventAction, EventDirection, EventGuard, EventKind};
pub use integrator::{IntegrationError, IntegratorSettings};
pub use recorder::{DerivedQuantities, EventRecord, SampleState, TimeSample, TrajectoryRecord, TrajectoryRecorder};
pub use runner::{integrate, Completion, Simulation, Termination};
