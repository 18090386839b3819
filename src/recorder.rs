use crate::clock::{Monotime, MonotonicClock};
use crate::error::Error;

/// The two index-aligned result sequences, handed to the caller by value
/// once the run completes. Immutable from then on.
#[derive(Debug)]
pub struct SampleSet {
    pub execution_times: Vec<i64>,
    pub jitter: Vec<i64>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.execution_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.execution_times.is_empty()
    }
}

/// Captures one (execution time, jitter) pair per iteration.
///
/// Execution time is the wall-clock span of the work phase. Jitter compares
/// the elapsed time since the run origin at the end of iteration i against
/// the ideal schedule i × period, so an overrun in one iteration stays
/// visible in later entries instead of resetting. Entry 0 of the jitter
/// sequence has no prior expectation and keeps the unset sentinel 0.
///
/// Values are stored raw. A negative or absurdly large duration from a
/// clock anomaly is data for the offline consumer, not a fault.
pub struct SampleRecorder {
    origin: Monotime,
    start: Monotime,
    last_end: Monotime,
    execution_times: Vec<i64>,
    jitter: Vec<i64>,
}

impl SampleRecorder {
    /// Preallocates both sequences at full length. `origin` is the task
    /// start timestamp the jitter baseline is measured from.
    pub fn new(sample_count: usize, origin: Monotime) -> Self {
        SampleRecorder {
            origin,
            start: origin,
            last_end: origin,
            execution_times: vec![0; sample_count],
            jitter: vec![0; sample_count],
        }
    }

    /// Records the start of the work phase.
    pub fn begin_iteration<C: MonotonicClock>(&mut self, clock: &C) -> Result<(), Error> {
        self.start = clock.now()?;
        Ok(())
    }

    /// Records the end of the work phase and stores the execution time for
    /// iteration `index`.
    pub fn end_iteration<C: MonotonicClock>(
        &mut self,
        index: usize,
        clock: &C,
    ) -> Result<(), Error> {
        let end = clock.now()?;
        self.execution_times[index] = end.diff_ns(self.start);
        self.last_end = end;
        Ok(())
    }

    /// Stores the jitter for iteration `index`, which must be >= 1.
    /// `expected_elapsed_ns` is the accumulated ideal schedule, exactly
    /// index × period; it is kept in integer nanoseconds by the caller and
    /// never recomputed from the scheduler's deadline.
    pub fn record_jitter(&mut self, index: usize, expected_elapsed_ns: i64) {
        debug_assert!(index > 0, "jitter has no baseline at iteration 0");
        let elapsed = self.last_end.diff_ns(self.origin);
        self.jitter[index] = (elapsed - expected_elapsed_ns).abs();
    }

    /// Transfers ownership of the completed sequences to the caller.
    pub fn into_samples(self) -> SampleSet {
        SampleSet {
            execution_times: self.execution_times,
            jitter: self.jitter,
        }
    }
}
