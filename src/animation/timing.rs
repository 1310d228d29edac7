//! Fixed-duration interpolation.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Quadratic ease-in-out.
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Interpolation from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: Easing,
    elapsed: Duration,
}

impl Timing {
    pub fn new(from: f64, to: f64, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            easing,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance and return `(value, finished)`.
    pub fn advance(&mut self, dt: Duration) -> (f64, bool) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.duration.is_zero() || self.elapsed >= self.duration {
            return (self.to, true);
        }
        let progress = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = self.easing.apply(progress);
        (self.from + (self.to - self.from) * eased, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-12);
        assert!(Easing::EaseInOut.apply(0.25) < 0.25);
    }

    #[test]
    fn test_timing_finishes_exactly_on_duration() {
        let mut timing = Timing::new(0.0, 1.0, Duration::from_millis(300), Easing::EaseInOut);
        let (v, done) = timing.advance(Duration::from_millis(150));
        assert!(!done);
        assert!((v - 0.5).abs() < 1e-9);
        let (_, done) = timing.advance(Duration::from_millis(149));
        assert!(!done);
        let (v, done) = timing.advance(Duration::from_millis(1));
        assert!(done);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn test_zero_duration_is_immediate() {
        let mut timing = Timing::new(1.0, 0.0, Duration::ZERO, Easing::Linear);
        assert_eq!(timing.advance(Duration::ZERO), (0.0, true));
    }
}
