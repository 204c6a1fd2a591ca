use serde::Serialize;

use crate::dynamics::state::Phase;
use crate::sim::event::EventKind;

// ---------------------------------------------------------------------------
// Sample types
// ---------------------------------------------------------------------------

/// Integrated quantities of a sample. Fields a run does not integrate stay at
/// zero (heading and cross range on the runway, fuel during takeoff).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SampleState {
    pub ground_distance: f64,   // m
    pub speed: f64,             // m/s
    pub flight_path_angle: f64, // rad
    pub altitude: f64,          // m
    pub heading: f64,           // rad
    pub cross_range: f64,       // m
    pub fuel_burned: f64,       // kg
}

/// Forces and attitude evaluated at a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedQuantities {
    pub thrust: f64,      // N
    pub lift: f64,        // N
    pub drag: f64,        // N
    pub friction: f64,    // N
    pub total_force: f64, // N, along the path
    pub mass: f64,        // kg
    pub weight: f64,      // N
    pub load_factor: f64,
    pub acceleration: f64, // m/s^2
    pub alpha: f64,        // rad
    pub pitch: f64,        // rad, alpha + gamma
    pub cl: f64,
    pub cd: f64,
    pub alpha_dot: f64,     // rad/s
    pub gamma_dot: f64,     // rad/s
    pub rate_of_climb: f64, // m/s
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSample {
    pub t: f64,
    pub phase: Phase,
    pub state: SampleState,
    pub derived: DerivedQuantities,
}

impl TimeSample {
    /// Linear blend between two samples. Phase is taken from the left sample.
    pub fn lerp(&self, other: &TimeSample, w: f64) -> TimeSample {
        let mix = |a: f64, b: f64| a + (b - a) * w;
        let (a, b) = (&self.state, &other.state);
        let (da, db) = (&self.derived, &other.derived);
        TimeSample {
            t: mix(self.t, other.t),
            phase: self.phase,
            state: SampleState {
                ground_distance: mix(a.ground_distance, b.ground_distance),
                speed: mix(a.speed, b.speed),
                flight_path_angle: mix(a.flight_path_angle, b.flight_path_angle),
                altitude: mix(a.altitude, b.altitude),
                heading: mix(a.heading, b.heading),
                cross_range: mix(a.cross_range, b.cross_range),
                fuel_burned: mix(a.fuel_burned, b.fuel_burned),
            },
            derived: DerivedQuantities {
                thrust: mix(da.thrust, db.thrust),
                lift: mix(da.lift, db.lift),
                drag: mix(da.drag, db.drag),
                friction: mix(da.friction, db.friction),
                total_force: mix(da.total_force, db.total_force),
                mass: mix(da.mass, db.mass),
                weight: mix(da.weight, db.weight),
                load_factor: mix(da.load_factor, db.load_factor),
                acceleration: mix(da.acceleration, db.acceleration),
                alpha: mix(da.alpha, db.alpha),
                pitch: mix(da.pitch, db.pitch),
                cl: mix(da.cl, db.cl),
                cd: mix(da.cd, db.cd),
                alpha_dot: mix(da.alpha_dot, db.alpha_dot),
                gamma_dot: mix(da.gamma_dot, db.gamma_dot),
                rate_of_climb: mix(da.rate_of_climb, db.rate_of_climb),
            },
        }
    }
}

/// A fired guard and the sample taken at its crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub t: f64,
    pub sample: TimeSample,
}

// ---------------------------------------------------------------------------
// Trajectory record
// ---------------------------------------------------------------------------

/// Time-ordered samples of one run plus the events that fired, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryRecord {
    samples: Vec<TimeSample>,
    events: Vec<EventRecord>,
    /// Terminal event, `None` if the run stopped on its horizon
    termination: Option<EventKind>,
}

impl TrajectoryRecord {
    pub fn samples(&self) -> &[TimeSample] {
        &self.samples
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn termination(&self) -> Option<EventKind> {
        self.termination
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn event(&self, kind: EventKind) -> Option<&EventRecord> {
        self.events.iter().find(|e| e.kind == kind)
    }

    pub fn event_time(&self, kind: EventKind) -> Option<f64> {
        self.event(kind).map(|e| e.t)
    }

    pub fn final_sample(&self) -> Option<&TimeSample> {
        self.samples.last()
    }

    /// Ground distance covered by the run.
    pub fn final_distance(&self) -> f64 {
        self.final_sample().map_or(0.0, |s| s.state.ground_distance)
    }

    /// Sample interpolated at time `t`, clamped to the recorded span.
    pub fn at_time(&self, t: f64) -> Option<TimeSample> {
        self.interpolate(t, |s| s.t)
    }

    /// Sample interpolated at ground distance `s`.
    ///
    /// Ground distance is non-decreasing along every run, so the first sample
    /// at or beyond `s` brackets the query.
    pub fn at_distance(&self, s: f64) -> Option<TimeSample> {
        self.interpolate(s, |x| x.state.ground_distance)
    }

    fn interpolate(&self, x: f64, key: impl Fn(&TimeSample) -> f64) -> Option<TimeSample> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if x <= key(first) {
            return Some(*first);
        }
        if x >= key(last) {
            return Some(*last);
        }
        let i = self.samples.partition_point(|s| key(s) < x);
        let (a, b) = (&self.samples[i - 1], &self.samples[i]);
        let span = key(b) - key(a);
        if span <= 0.0 {
            return Some(*b);
        }
        Some(a.lerp(b, (x - key(a)) / span))
    }
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Append-only builder of a [`TrajectoryRecord`].
#[derive(Debug, Default)]
pub struct TrajectoryRecorder {
    record: TrajectoryRecord,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(samples: usize) -> Self {
        Self {
            record: TrajectoryRecord {
                samples: Vec::with_capacity(samples),
                ..Default::default()
            },
        }
    }

    /// Append a sample; an event sample is also logged in the event list.
    pub fn record(&mut self, sample: TimeSample, event: Option<EventKind>) {
        if let Some(kind) = event {
            self.record.events.push(EventRecord { kind, t: sample.t, sample });
        }
        self.record.samples.push(sample);
    }

    /// Close the record with its terminal event.
    pub fn finish(self, termination: Option<EventKind>) -> TrajectoryRecord {
        let mut record = self.record;
        record.termination = termination;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(t: f64, s: f64, v: f64) -> TimeSample {
        TimeSample {
            t,
            phase: Phase::GroundRoll,
            state: SampleState { ground_distance: s, speed: v, ..Default::default() },
            derived: DerivedQuantities { thrust: 1000.0 * v, ..Default::default() },
        }
    }

    fn record() -> TrajectoryRecord {
        let mut rec = TrajectoryRecorder::new();
        rec.record(sample(0.0, 0.0, 0.0), None);
        rec.record(sample(1.0, 1.0, 2.0), None);
        rec.record(sample(2.0, 4.0, 4.0), Some(EventKind::Rotation));
        rec.record(sample(3.0, 9.0, 6.0), None);
        rec.finish(None)
    }

    #[test]
    fn events_are_indexed_by_kind() {
        let rec = record();
        assert_eq!(rec.events().len(), 1);
        assert_eq!(rec.event_time(EventKind::Rotation), Some(2.0));
        assert!(rec.event(EventKind::LiftOff).is_none());
        assert_eq!(rec.len(), 4);
        assert_eq!(rec.termination(), None);
    }

    #[test]
    fn time_lookup_interpolates_all_fields() {
        let s = record().at_time(2.5).unwrap();
        assert_relative_eq!(s.state.ground_distance, 6.5);
        assert_relative_eq!(s.state.speed, 5.0);
        assert_relative_eq!(s.derived.thrust, 5000.0);
    }

    #[test]
    fn distance_lookup_clamps_to_record() {
        let rec = record();
        assert_eq!(rec.at_distance(-1.0).unwrap().t, 0.0);
        assert_eq!(rec.at_distance(100.0).unwrap().t, 3.0);
        assert_relative_eq!(rec.at_distance(2.5).unwrap().t, 1.5);
    }

    #[test]
    fn empty_record_has_no_samples() {
        let rec = TrajectoryRecorder::new().finish(None);
        assert!(rec.is_empty());
        assert!(rec.at_time(1.0).is_none());
        assert_eq!(rec.final_distance(), 0.0);
    }
}
