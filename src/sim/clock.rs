//! Accumulating cycle timer
//!
//! Used wherever a duration must repeat (phase groups) or expire.

use serde::{Deserialize, Serialize};

/// Accumulating timer that wraps at `period`
///
/// Invariant: `0 <= elapsed < period`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleClock {
    elapsed: f32,
    period: f32,
}

impl CycleClock {
    pub fn new(period: f32) -> Self {
        debug_assert!(period > 0.0, "cycle period must be positive, got {period}");
        Self {
            elapsed: 0.0,
            period: period.max(f32::EPSILON),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn period(&self) -> f32 {
        self.period
    }

    /// Progress through the cycle in `[0, 1)`
    #[inline]
    pub fn progress(&self) -> f32 {
        self.elapsed / self.period
    }

    /// Set elapsed time, wrapping into `[0, period)`
    pub fn set_elapsed(&mut self, elapsed: f32) {
        self.elapsed = elapsed.rem_euclid(self.period);
        // rem_euclid can round up to exactly `period` for tiny negatives
        if self.elapsed >= self.period {
            self.elapsed = 0.0;
        }
    }

    /// Advance by `dt`, returning how many times the clock wrapped
    pub fn advance(&mut self, dt: f32) -> u32 {
        debug_assert!(dt >= 0.0, "clock cannot run backward (dt = {dt})");
        let total = self.elapsed + dt.max(0.0);
        let wraps = (total / self.period).floor() as u32;
        self.set_elapsed(total);
        wraps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps_with_modulo() {
        let mut clock = CycleClock::new(100.0);
        assert_eq!(clock.advance(60.0), 0);
        assert_eq!(clock.advance(60.0), 1);
        assert!((clock.elapsed() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_offset_is_wrapped() {
        let mut clock = CycleClock::new(4000.0);
        clock.set_elapsed(9000.0);
        assert!((clock.elapsed() - 1000.0).abs() < 1e-3);

        clock.set_elapsed(-1000.0);
        assert!((clock.elapsed() - 3000.0).abs() < 1e-3);
    }

    #[test]
    fn test_progress() {
        let mut clock = CycleClock::new(200.0);
        clock.advance(50.0);
        assert!((clock.progress() - 0.25).abs() < 1e-6);
    }
}
