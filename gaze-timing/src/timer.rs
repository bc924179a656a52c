use std::time::{Duration, Instant};

/// Logical milliseconds since a clock's origin.
pub type Millis = u64;

/// Time source the scheduler runs against.
///
/// `now_ms` must never go backwards. `sleep_until` returns once `now_ms()`
/// has reached `deadline`; a deadline in the past returns immediately.
pub trait Clock {
    fn now_ms(&self) -> Millis;
    fn sleep_until(&mut self, deadline: Millis);
}

/// Deterministic clock for tests and offline sessions.
///
/// Sleeping jumps "now" straight to the deadline.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Millis,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Millis) -> Self {
        Self { now }
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> Millis {
        self.now
    }

    fn sleep_until(&mut self, deadline: Millis) {
        self.now = self.now.max(deadline);
    }
}

/// Wall-clock time source measured from construction.
///
/// Sleeps with `clock_nanosleep(CLOCK_MONOTONIC)` on Linux for sub-millisecond
/// wake-up accuracy.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }

    fn sleep_until(&mut self, deadline: Millis) {
        // A deadline past what `Instant` can represent is never reached.
        let Some(target) = self.start.checked_add(Duration::from_millis(deadline)) else {
            return;
        };
        loop {
            let now = Instant::now();
            if now >= target {
                break;
            }
            self.high_precision_sleep(target - now);
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        // EINTR leaves the remainder unslept; `sleep_until` loops on it.
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_only_moves_forward() {
        let mut clock = VirtualClock::starting_at(500);
        clock.sleep_until(200);
        assert_eq!(clock.now_ms(), 500);
        clock.sleep_until(1500);
        assert_eq!(clock.now_ms(), 1500);
    }

    #[test]
    fn monotonic_clock_sleeps_past_deadline() {
        let mut clock = MonotonicClock::new();
        let deadline = clock.now_ms() + 5;
        clock.sleep_until(deadline);
        assert!(clock.now_ms() >= deadline);
    }

    #[test]
    fn unreachable_deadline_returns_at_once() {
        let mut clock = MonotonicClock::new();
        clock.sleep_until(Millis::MAX);
        assert!(clock.now_ms() < 1000);
    }
}
