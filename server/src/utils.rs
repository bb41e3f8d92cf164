use std::time::Instant;

/// Monotonic millisecond clock for race timestamps.
///
/// Races only ever subtract timestamps, so the epoch is simply the moment
/// the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct RaceClock {
    epoch: Instant,
}

impl RaceClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now_millis(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for RaceClock {
    fn default() -> Self {
        Self::new()
    }
}
