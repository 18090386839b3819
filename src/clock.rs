use std::io;

use crate::error::Error;

pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Monotonic timestamp split into second and nanosecond components,
/// mirroring `struct timespec`. All arithmetic is integer nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monotime {
    pub sec: i64,
    pub nsec: i64,
}

impl Monotime {
    pub fn from_ns(ns: i64) -> Self {
        Monotime {
            sec: ns / NANOS_PER_SEC,
            nsec: ns % NANOS_PER_SEC,
        }
    }

    pub fn as_ns(&self) -> i64 {
        self.sec * NANOS_PER_SEC + self.nsec
    }

    /// Signed difference `self - earlier` in nanoseconds.
    pub fn diff_ns(&self, earlier: Monotime) -> i64 {
        (self.sec - earlier.sec) * NANOS_PER_SEC + (self.nsec - earlier.nsec)
    }
}

/// Read-and-wait interface over one monotonic clock domain. Mixing clock
/// domains between `now` and `sleep_until` would corrupt the measurements,
/// so both live behind the same trait.
pub trait MonotonicClock {
    fn now(&self) -> Result<Monotime, Error>;

    /// Blocks until the clock reaches `deadline`. A deadline already in the
    /// past returns immediately.
    fn sleep_until(&self, deadline: Monotime) -> Result<(), Error>;
}

/// CLOCK_MONOTONIC via clock_gettime / clock_nanosleep(TIMER_ABSTIME).
pub struct RealClock;

impl MonotonicClock for RealClock {
    fn now(&self) -> Result<Monotime, Error> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if ret != 0 {
            return Err(Error::Clock(format!(
                "clock_gettime(CLOCK_MONOTONIC) failed: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(Monotime {
            sec: ts.tv_sec as i64,
            nsec: ts.tv_nsec as i64,
        })
    }

    fn sleep_until(&self, deadline: Monotime) -> Result<(), Error> {
        let ts = libc::timespec {
            tv_sec: deadline.sec as libc::time_t,
            tv_nsec: deadline.nsec as libc::c_long,
        };
        // clock_nanosleep returns the error number directly, not via errno.
        // An interruption is fatal here: a skipped wake-up would invalidate
        // the jitter sequence, so it is not retried.
        let ret = unsafe {
            libc::clock_nanosleep(
                libc::CLOCK_MONOTONIC,
                libc::TIMER_ABSTIME,
                &ts,
                std::ptr::null_mut(),
            )
        };
        if ret != 0 {
            return Err(Error::Clock(format!(
                "clock_nanosleep(TIMER_ABSTIME) failed: {}",
                io::Error::from_raw_os_error(ret)
            )));
        }
        Ok(())
    }
}

/// Deterministic clock for the scenario tests: `now` reads a counter and
/// `sleep_until` jumps the counter forward to a future deadline.
#[cfg(test)]
pub(crate) struct FakeClock {
    now_ns: std::cell::Cell<i64>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new(start_ns: i64) -> Self {
        FakeClock {
            now_ns: std::cell::Cell::new(start_ns),
        }
    }

    pub fn advance(&self, ns: i64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    pub fn now_ns(&self) -> i64 {
        self.now_ns.get()
    }
}

#[cfg(test)]
impl MonotonicClock for FakeClock {
    fn now(&self) -> Result<Monotime, Error> {
        Ok(Monotime::from_ns(self.now_ns.get()))
    }

    fn sleep_until(&self, deadline: Monotime) -> Result<(), Error> {
        if deadline.as_ns() > self.now_ns.get() {
            self.now_ns.set(deadline.as_ns());
        }
        Ok(())
    }
}
