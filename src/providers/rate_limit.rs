//! Per-process rate-limit gate for the primary geocoder (§4.3, §5).
//!
//! A single monotonic timestamp guarded by a mutex, not a global sleep:
//! `acquire()` blocks the calling thread until the configured minimum
//! interval has elapsed since the last call, then records the new call
//! time. Correct under concurrent access from a batch resolve.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval_secs: f64) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(min_interval_secs.max(0.0)),
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until at least `min_interval` has elapsed since the previous
    /// `acquire()`, then returns. The first call never blocks.
    pub fn acquire(&self) {
        let mut guard = self.last_call.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        if let Some(last) = *guard {
            let elapsed = now.duration_since(last);
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        *guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_does_not_block() {
        let gate = RateGate::new(1.0);
        let start = Instant::now();
        gate.acquire();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn second_call_waits_out_the_interval() {
        let gate = RateGate::new(0.05);
        gate.acquire();
        let start = Instant::now();
        gate.acquire();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
