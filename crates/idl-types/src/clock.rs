use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Strictly monotonic millisecond clock.
///
/// Wraps the wall clock so that consecutive calls never return the same or
/// an earlier value, even when they land inside one millisecond or the
/// system clock steps backward. Block timestamps and key derivation both
/// read from this clock, so two blocks sealed back-to-back always carry
/// distinct timestamps.
///
/// Safe for concurrent use across threads via an internal [`Mutex`].
#[derive(Debug)]
pub struct MonotonicClock {
    /// Last issued millisecond timestamp.
    last_ms: Mutex<u64>,
}

impl MonotonicClock {
    /// Create a clock starting from the current wall time.
    pub fn new() -> Self {
        Self {
            last_ms: Mutex::new(0),
        }
    }

    /// The next strictly increasing millisecond timestamp.
    pub fn now_ms(&self) -> u64 {
        let wall = Self::wall_clock_ms();
        let mut last = self.last_ms.lock().expect("clock mutex poisoned");
        let next = wall.max(*last + 1);
        *last = next;
        next
    }

    fn wall_clock_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
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
    fn timestamps_are_strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut prev = 0;
        for _ in 0..1000 {
            let ts = clock.now_ms();
            assert!(ts > prev);
            prev = ts;
        }
    }

    #[test]
    fn tracks_wall_clock() {
        let clock = MonotonicClock::new();
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = clock.now_ms();
        // Within a generous window of the real wall clock.
        assert!(ts >= wall && ts < wall + 60_000);
    }

    #[test]
    fn concurrent_callers_never_collide() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let clock = Arc::new(MonotonicClock::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let clock = Arc::clone(&clock);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| clock.now_ms()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for ts in handle.join().unwrap() {
                assert!(seen.insert(ts), "duplicate timestamp {ts}");
            }
        }
    }
}
