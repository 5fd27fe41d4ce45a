use std::time::{Duration, Instant};

/// Monotonic elapsed-time gate
///
/// `time_elapsed` never blocks: callers poll it once per loop iteration and
/// act when it reports that a full period has passed since the last tick.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Start of the current period
    start: Instant,
    /// Fire on the next poll regardless of elapsed time
    armed: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Creates a clock whose first tick comes after one full period
    pub fn new() -> Self {
        Clock {
            start: Instant::now(),
            armed: false,
        }
    }

    /// Creates a clock whose first poll ticks immediately
    pub fn started() -> Self {
        Clock {
            start: Instant::now(),
            armed: true,
        }
    }

    /// Returns true once `period` has passed since the last tick, and starts
    /// a new period when it does
    pub fn time_elapsed(&mut self, period: Duration) -> bool {
        let now = Instant::now();

        if self.armed || now.duration_since(self.start) >= period {
            self.armed = false;
            self.start = now;
            return true;
        }

        false
    }

    /// Returns true if `timeout` has passed since the clock was last reset,
    /// without starting a new period
    pub fn has_elapsed(&self, timeout: Duration) -> bool {
        self.elapsed() >= timeout
    }

    /// Time since the start of the current period
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before `period` elapses, zero if it already has
    pub fn remaining(&self, period: Duration) -> Duration {
        if self.armed {
            return Duration::ZERO;
        }
        period.saturating_sub(self.elapsed())
    }

    /// Restarts the current period
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_started_clock_ticks_immediately() {
        let mut clock = Clock::started();
        assert!(clock.time_elapsed(Duration::from_secs(60)));
        // The immediate tick is only granted once
        assert!(!clock.time_elapsed(Duration::from_secs(60)));
    }

    #[test]
    fn test_tick_after_period() {
        let mut clock = Clock::new();
        let period = Duration::from_millis(20);
        assert!(!clock.time_elapsed(period));

        sleep(Duration::from_millis(30));
        assert!(clock.time_elapsed(period));
        // New period has started
        assert!(!clock.time_elapsed(period));
    }

    #[test]
    fn test_zero_period_always_ticks() {
        let mut clock = Clock::new();
        assert!(clock.time_elapsed(Duration::ZERO));
        assert!(clock.time_elapsed(Duration::ZERO));
    }

    #[test]
    fn test_has_elapsed_does_not_reset() {
        let clock = Clock::new();
        sleep(Duration::from_millis(15));
        assert!(clock.has_elapsed(Duration::from_millis(10)));
        assert!(clock.has_elapsed(Duration::from_millis(10)));
        assert!(!clock.has_elapsed(Duration::from_secs(60)));
    }

    #[test]
    fn test_remaining() {
        let clock = Clock::new();
        let remaining = clock.remaining(Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(59));
        assert_eq!(Clock::started().remaining(Duration::from_secs(60)), Duration::ZERO);
    }
}
