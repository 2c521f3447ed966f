// Wall clock abstraction for the chart controller
use chrono::Utc;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        Utc::now().timestamp_millis() as f64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Manually driven clock for service tests.
    pub(crate) struct FixedClock {
        now: AtomicU64,
    }

    impl FixedClock {
        pub(crate) fn new(now_ms: f64) -> Self {
            Self {
                now: AtomicU64::new(now_ms.to_bits()),
            }
        }

        pub(crate) fn set(&self, now_ms: f64) {
            self.now.store(now_ms.to_bits(), Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now_ms(&self) -> f64 {
            f64::from_bits(self.now.load(Ordering::SeqCst))
        }
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000.0);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(5.0);
        assert_eq!(clock.now_ms(), 5.0);
        clock.set(9.5);
        assert_eq!(clock.now_ms(), 9.5);
    }
}
