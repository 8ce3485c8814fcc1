//! Local session clock for elapsed-time extrapolation.

use std::time::Instant;

/// Extrapolates display elapsed time between frames.
///
/// Reseeded, never averaged, on every accepted frame: the sensor peer's
/// elapsed time is authoritative and the local monotonic clock only fills
/// the gaps between frames.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    base_elapsed: f64,
    base_wall_clock: Instant,
}

impl SessionClock {
    /// Seed the clock from an accepted frame
    pub fn seed(base_elapsed: f64, now: Instant) -> Self {
        Self {
            base_elapsed,
            base_wall_clock: now,
        }
    }

    /// Replace the base; called on every accepted frame
    pub fn reseed(&mut self, base_elapsed: f64, now: Instant) {
        self.base_elapsed = base_elapsed;
        self.base_wall_clock = now;
    }

    /// Elapsed time to display right now
    pub fn display_elapsed(&self, now: Instant) -> f64 {
        self.base_elapsed + now.duration_since(self.base_wall_clock).as_secs_f64()
    }

    /// The elapsed value the clock was last seeded with
    pub fn base_elapsed(&self) -> f64 {
        self.base_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_extrapolation() {
        let start = Instant::now();
        let clock = SessionClock::seed(10.0, start);

        let later = start + Duration::from_millis(1500);
        let elapsed = clock.display_elapsed(later);
        assert!((elapsed - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_reseed_replaces_base() {
        let start = Instant::now();
        let mut clock = SessionClock::seed(10.0, start);

        // A later frame says 12.0 even though only 1s passed locally:
        // the frame wins outright
        let frame_at = start + Duration::from_secs(1);
        clock.reseed(12.0, frame_at);

        let later = frame_at + Duration::from_secs(2);
        assert!((clock.display_elapsed(later) - 14.0).abs() < 1e-9);
    }
}
