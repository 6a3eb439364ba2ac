use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-side countdown clock. The stored `time_left` is authoritative only
/// while the clock is stopped; while running, the effective remaining time is
/// `time_left - (now - last_started)`.
pub struct Clock {
    inner: Mutex<ClockInner>,
}

struct ClockInner {
    time_left: Duration,
    last_started: Option<Instant>,
    is_running: bool,
}

impl Clock {
    pub fn new(initial: Duration) -> Self {
        Clock {
            inner: Mutex::new(ClockInner {
                time_left: initial,
                last_started: None,
                is_running: false,
            }),
        }
    }

    /// Start counting down. No-op if already running.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.is_running {
            inner.last_started = Some(Instant::now());
            inner.is_running = true;
        }
    }

    /// Stop and bank the elapsed time. No-op if already stopped.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.is_running {
            if let Some(started) = inner.last_started {
                inner.time_left = inner.time_left.saturating_sub(started.elapsed());
            }
            inner.is_running = false;
        }
    }

    /// Instantaneous effective remaining time, saturating at zero.
    pub fn remaining(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        if inner.is_running {
            if let Some(started) = inner.last_started {
                return inner.time_left.saturating_sub(started.elapsed());
            }
        }
        inner.time_left
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().is_running
    }

    #[cfg(test)]
    pub(crate) fn set_remaining(&self, time_left: Duration) {
        self.inner.lock().unwrap().time_left = time_left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn stopped_clock_holds_its_time() {
        let clock = Clock::new(Duration::from_secs(60));
        sleep(Duration::from_millis(20));
        assert_eq!(clock.remaining(), Duration::from_secs(60));
    }

    #[test]
    fn running_clock_counts_down() {
        let clock = Clock::new(Duration::from_secs(60));
        clock.start();
        sleep(Duration::from_millis(30));
        let first = clock.remaining();
        assert!(first < Duration::from_secs(60));
        sleep(Duration::from_millis(30));
        assert!(clock.remaining() < first);
    }

    #[test]
    fn stop_banks_elapsed_time() {
        let clock = Clock::new(Duration::from_secs(60));
        clock.start();
        sleep(Duration::from_millis(30));
        clock.stop();
        let banked = clock.remaining();
        assert!(banked < Duration::from_secs(60));
        sleep(Duration::from_millis(30));
        assert_eq!(clock.remaining(), banked);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let clock = Clock::new(Duration::from_millis(100));
        clock.stop();
        assert_eq!(clock.remaining(), Duration::from_millis(100));

        clock.start();
        sleep(Duration::from_millis(20));
        // A second start must not reset the running window.
        clock.start();
        clock.stop();
        assert!(clock.remaining() < Duration::from_millis(100));
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let clock = Clock::new(Duration::from_millis(10));
        clock.start();
        sleep(Duration::from_millis(30));
        assert_eq!(clock.remaining(), Duration::ZERO);
        clock.stop();
        assert_eq!(clock.remaining(), Duration::ZERO);
    }
}
