use std::io;
use std::mem;
use std::thread;

use crate::clock::{MonotonicClock, RealClock};
use crate::config::{Config, RtConfig};
use crate::error::Error;
use crate::recorder::{SampleRecorder, SampleSet};
use crate::sched::PeriodScheduler;

/// Applies the real-time scheduling attributes to the calling thread:
/// CPU affinity first, then policy and priority. Everything is validated
/// up front so a failure never leaves the loop running half-configured.
fn configure_current_thread(rt: &RtConfig) -> Result<(), Error> {
    let policy = rt.policy.as_raw();

    let min = unsafe { libc::sched_get_priority_min(policy) };
    let max = unsafe { libc::sched_get_priority_max(policy) };
    if min < 0 || max < 0 {
        return Err(Error::Config(format!(
            "cannot query priority range: {}",
            io::Error::last_os_error()
        )));
    }
    if rt.priority < min || rt.priority > max {
        return Err(Error::Config(format!(
            "priority {} out of range {}..={} for policy {:?}",
            rt.priority, min, max, rt.policy
        )));
    }

    if let Some(cpus) = &rt.cpus {
        set_affinity(cpus)?;
    }

    let tid = unsafe { libc::gettid() };
    let param = libc::sched_param {
        sched_priority: rt.priority,
    };
    let ret = unsafe { libc::sched_setscheduler(tid, policy, &param) };
    if ret != 0 {
        return Err(Error::Config(format!(
            "sched_setscheduler({:?}, priority {}) failed: {} \
             (real-time policies need root or CAP_SYS_NICE)",
            rt.policy,
            rt.priority,
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// Pins the calling thread to the given CPU cores.
fn set_affinity(cpus: &[usize]) -> Result<(), Error> {
    if cpus.is_empty() {
        return Err(Error::Config("cpu affinity set is empty".into()));
    }

    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    unsafe { libc::CPU_ZERO(&mut set) };
    for &cpu in cpus {
        if cpu >= libc::CPU_SETSIZE as usize {
            return Err(Error::Config(format!(
                "cpu index {} exceeds CPU_SETSIZE ({})",
                cpu,
                libc::CPU_SETSIZE
            )));
        }
        if online > 0 && cpu >= online as usize {
            return Err(Error::Config(format!(
                "cpu index {} out of range (0..{})",
                cpu, online
            )));
        }
        unsafe { libc::CPU_SET(cpu, &mut set) };
    }

    let tid = unsafe { libc::gettid() };
    let ret = unsafe { libc::sched_setaffinity(tid, mem::size_of::<libc::cpu_set_t>(), &set) };
    if ret != 0 {
        return Err(Error::Config(format!(
            "sched_setaffinity({:?}) failed: {}",
            cpus,
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// The periodic measurement loop: sleep until the deadline, advance it,
/// run the workload, record execution time and jitter. A clock failure
/// aborts the whole run and discards the partial sequences; the error says
/// how many complete samples were thrown away.
pub(crate) fn run_loop<C, F>(
    clock: &C,
    period_ns: u64,
    sample_count: usize,
    workload: &mut F,
) -> Result<SampleSet, Error>
where
    C: MonotonicClock,
    F: FnMut(),
{
    let abort = |e: Error, completed: usize| match e {
        Error::Clock(msg) => Error::Clock(format!(
            "{} (run aborted, {} complete samples discarded)",
            msg, completed
        )),
        other => other,
    };

    let origin = clock.now()?;
    let mut scheduler = PeriodScheduler::new(period_ns);
    scheduler.initialize(origin);
    let mut recorder = SampleRecorder::new(sample_count, origin);
    let mut expected_elapsed_ns: i64 = 0;

    for i in 0..sample_count {
        scheduler
            .sleep_until_next_deadline(clock)
            .map_err(|e| abort(e, i))?;
        scheduler.advance_deadline();

        recorder.begin_iteration(clock).map_err(|e| abort(e, i))?;
        workload();
        recorder.end_iteration(i, clock).map_err(|e| abort(e, i))?;

        if i > 0 {
            // The ideal schedule advances by exactly one period no matter
            // what actually happened, so overruns stay visible downstream.
            expected_elapsed_ns += period_ns as i64;
            recorder.record_jitter(i, expected_elapsed_ns);
        }
    }

    Ok(recorder.into_samples())
}

/// Runs the fixed-length measurement on a dedicated thread: configures the
/// thread's scheduling attributes, drives the loop with the real monotonic
/// clock, joins, and returns the completed sequences. No samples are
/// recorded if configuration fails.
pub fn run<F>(config: &Config, mut workload: F) -> Result<SampleSet, Error>
where
    F: FnMut() + Send + 'static,
{
    let rt = config.rt.clone();
    let period_ns = config.task.period_ns;
    let sample_count = config.task.samples;

    let handle = thread::Builder::new()
        .name("rtlat-task".into())
        .spawn(move || -> Result<SampleSet, Error> {
            configure_current_thread(&rt)?;
            log::debug!(
                target: "rtlat::task",
                "thread configured: policy={:?} priority={} cpus={:?}",
                rt.policy, rt.priority, rt.cpus,
            );
            run_loop(&RealClock, period_ns, sample_count, &mut workload)
        })?;

    handle
        .join()
        .map_err(|_| Error::Thread("sampling thread panicked".into()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FakeClock, Monotime};
    use crate::config::SchedPolicy;
    use std::cell::Cell;

    const PERIOD: i64 = 1_000_000;

    #[test]
    fn test_noop_workload_has_zero_times_and_jitter() {
        let clock = FakeClock::new(500);
        let samples = run_loop(&clock, PERIOD as u64, 5, &mut || {}).unwrap();
        assert_eq!(samples.len(), 5);
        assert!(samples.execution_times.iter().all(|&t| t == 0));
        assert!(samples.jitter.iter().all(|&j| j == 0));
    }

    #[test]
    fn test_overrun_propagates_into_later_jitter() {
        // The workload blows through two full periods on iteration 2 only.
        // The ideal schedule keeps advancing, so iteration 3 wakes a period
        // late and its jitter reflects the accumulated overrun.
        let clock = FakeClock::new(0);
        let calls = Cell::new(0usize);
        let samples = run_loop(&clock, PERIOD as u64, 5, &mut || {
            if calls.get() == 2 {
                clock.advance(2 * PERIOD);
            }
            calls.set(calls.get() + 1);
        })
        .unwrap();

        assert_eq!(samples.execution_times, vec![0, 0, 2 * PERIOD, 0, 0]);
        assert_eq!(samples.jitter[1], 0);
        assert_eq!(samples.jitter[2], 2 * PERIOD);
        assert_eq!(samples.jitter[3], PERIOD);
        assert_eq!(samples.jitter[4], 0);
    }

    #[test]
    fn test_constant_workload_jitter_does_not_drift() {
        // A workload shorter than the period finishes a constant offset
        // after each deadline; the offset must not accumulate.
        let clock = FakeClock::new(0);
        let samples = run_loop(&clock, PERIOD as u64, 6, &mut || {
            clock.advance(PERIOD / 4);
        })
        .unwrap();
        for i in 1..6 {
            assert_eq!(samples.jitter[i], PERIOD / 4, "at iteration {}", i);
        }
    }

    #[test]
    fn test_sequences_are_aligned_and_entry_zero_unset() {
        let clock = FakeClock::new(0);
        let samples = run_loop(&clock, PERIOD as u64, 8, &mut || {
            clock.advance(123);
        })
        .unwrap();
        assert_eq!(samples.execution_times.len(), 8);
        assert_eq!(samples.jitter.len(), 8);
        assert_eq!(samples.jitter[0], 0);
        assert!(samples.jitter[1..].iter().all(|&j| j == 123));
    }

    struct FailingClock {
        inner: FakeClock,
        now_calls_left: Cell<usize>,
    }

    impl MonotonicClock for FailingClock {
        fn now(&self) -> Result<Monotime, Error> {
            if self.now_calls_left.get() == 0 {
                return Err(Error::Clock("clock_gettime unavailable".into()));
            }
            self.now_calls_left.set(self.now_calls_left.get() - 1);
            self.inner.now()
        }

        fn sleep_until(&self, deadline: Monotime) -> Result<(), Error> {
            self.inner.sleep_until(deadline)
        }
    }

    #[test]
    fn test_clock_failure_aborts_and_discards() {
        // One origin read plus two reads per iteration: fails during
        // iteration 2, after two complete samples.
        let clock = FailingClock {
            inner: FakeClock::new(0),
            now_calls_left: Cell::new(5),
        };
        let err = run_loop(&clock, PERIOD as u64, 10, &mut || {}).unwrap_err();
        match err {
            Error::Clock(msg) => {
                assert!(msg.contains("2 complete samples discarded"), "{}", msg);
            }
            other => panic!("expected Error::Clock, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_cpu_index_is_config_error() {
        let mut config = Config::default();
        config.rt.policy = SchedPolicy::Normal;
        config.rt.priority = 0;
        config.rt.cpus = Some(vec![usize::MAX]);
        let err = run(&config, || {}).unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("cpu index")),
            other => panic!("expected Error::Config, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_cpu_set_is_config_error() {
        let err = set_affinity(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_priority_out_of_range_is_config_error() {
        let rt = RtConfig {
            priority: 50,
            policy: SchedPolicy::Normal,
            cpus: None,
        };
        let err = configure_current_thread(&rt).unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("out of range")),
            other => panic!("expected Error::Config, got {:?}", other),
        }
    }

    #[test]
    fn test_unprivileged_end_to_end_run() {
        // SCHED_OTHER at priority 0 needs no privileges; three 1ms periods
        // keep the test fast.
        let mut config = Config::default();
        config.task.samples = 3;
        config.rt.policy = SchedPolicy::Normal;
        config.rt.priority = 0;
        let samples = run(&config, || {}).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.jitter[0], 0);
        // Real clock: execution times are scheduling overhead, not negative.
        assert!(samples.execution_times.iter().all(|&t| t >= 0));
    }
}
