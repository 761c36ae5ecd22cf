use std::time::{Duration, Instant};

/// Monotonic stopwatch for an operation span
#[derive(Clone, Copy, Debug)]
pub struct Timer {
    started: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed fractional milliseconds, rounded to two decimals
    pub fn elapsed_ms(&self) -> f64 {
        round_ms(self.elapsed())
    }
}

pub fn round_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_ms_keeps_two_decimals() {
        assert_eq!(round_ms(Duration::from_micros(1_234)), 1.23);
        assert_eq!(round_ms(Duration::from_micros(1_235_600)), 1235.6);
        assert_eq!(round_ms(Duration::from_nanos(4_999)), 0.0);
        assert_eq!(round_ms(Duration::from_micros(20)), 0.02);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = Timer::start();
        let first = timer.elapsed_ms();
        std::thread::sleep(Duration::from_millis(2));
        let second = timer.elapsed_ms();

        assert!(first >= 0.0);
        assert!(second >= first);
        assert!(second >= 2.0);
    }
}
