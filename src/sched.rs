use crate::clock::{Monotime, MonotonicClock, NANOS_PER_SEC};
use crate::error::Error;

/// Drift-free periodic wake-up scheduler. The next deadline is advanced by
/// exactly one period per iteration in timespec representation, so no error
/// accumulates across the run regardless of when each wake-up actually
/// happens.
pub struct PeriodScheduler {
    period_ns: u64,
    deadline: Monotime,
}

impl PeriodScheduler {
    pub fn new(period_ns: u64) -> Self {
        PeriodScheduler {
            period_ns,
            deadline: Monotime { sec: 0, nsec: 0 },
        }
    }

    /// Sets the first deadline. Called exactly once, before the first
    /// iteration.
    pub fn initialize(&mut self, now: Monotime) {
        self.deadline = now;
    }

    pub fn deadline(&self) -> Monotime {
        self.deadline
    }

    /// Blocks until the current deadline. An already-passed deadline returns
    /// immediately; the overrun shows up in the recorded samples instead of
    /// being treated as a failure.
    pub fn sleep_until_next_deadline<C: MonotonicClock>(&self, clock: &C) -> Result<(), Error> {
        clock.sleep_until(self.deadline)
    }

    /// Deadline ← Deadline + Period, carrying nanosecond overflow into the
    /// seconds component. Called exactly once per iteration.
    pub fn advance_deadline(&mut self) {
        self.deadline.nsec += self.period_ns as i64;
        if self.deadline.nsec >= NANOS_PER_SEC {
            self.deadline.sec += self.deadline.nsec / NANOS_PER_SEC;
            self.deadline.nsec %= NANOS_PER_SEC;
        }
    }
}
