//! Elapsed-time measurement for probe legs.
//!
//! Every latency number in a [`ProbeResult`](super::result::ProbeResult)
//! comes from one of these handles. `Instant` is monotonic, so elapsed
//! values are non-negative by construction.

use std::time::Instant;

/// Handle over a started measurement.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: Instant,
}

impl Timer {
    /// Start a new measurement.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Milliseconds elapsed since [`Timer::start`].
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_elapsed_is_non_negative() {
        let timer = Timer::start();
        // u64 already guarantees this; the call must also not panic.
        let _ = timer.elapsed_ms();
    }

    #[test]
    fn test_elapsed_advances() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(15));
        assert!(timer.elapsed_ms() >= 10);
    }
}
