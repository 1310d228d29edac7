//! Damped spring integration.

/// Largest integration step; longer frames are split into substeps.
const MAX_STEP_SECS: f64 = 1.0 / 240.0;

/// Spring parameters. The defaults are critically damped (damping 20,
/// stiffness 100, mass 1), so motion decelerates into the target without
/// overshoot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub damping: f64,
    pub stiffness: f64,
    pub mass: f64,
    /// Distance from target treated as arrived.
    pub rest_displacement: f64,
    /// Speed (units/s) treated as stopped.
    pub rest_speed: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            damping: 20.0,
            stiffness: 100.0,
            mass: 1.0,
            rest_displacement: 0.001,
            rest_speed: 0.01,
        }
    }
}

impl SpringConfig {
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    fn at_rest(&self, value: f64, velocity: f64, target: f64) -> bool {
        (target - value).abs() < self.rest_displacement && velocity.abs() < self.rest_speed
    }

    /// Advance `value`/`velocity` toward `target` by `dt` seconds using
    /// semi-implicit Euler. Returns true once the spring has come to rest, in
    /// which case `value` is snapped exactly onto `target`.
    pub fn step(&self, value: &mut f64, velocity: &mut f64, target: f64, dt: f64) -> bool {
        let mass = self.mass.max(f64::EPSILON);
        let mut remaining = dt.max(0.0);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_SECS);
            let force = -self.stiffness * (*value - target) - self.damping * *velocity;
            *velocity += force / mass * h;
            *value += *velocity * h;
            remaining -= h;
        }

        if self.at_rest(*value, *velocity, target) {
            *value = target;
            *velocity = 0.0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(config: &SpringConfig, from: f64, to: f64) -> (f64, usize) {
        let mut value = from;
        let mut velocity = 0.0;
        let mut frames = 0;
        while !config.step(&mut value, &mut velocity, to, 1.0 / 60.0) {
            frames += 1;
            assert!(frames < 10_000, "spring never settled");
        }
        (value, frames)
    }

    #[test]
    fn test_spring_settles_on_target() {
        let (value, frames) = settle(&SpringConfig::default(), 0.0, 250.0);
        assert_eq!(value, 250.0);
        // Critically damped at omega = 10: well under three seconds.
        assert!(frames < 180, "took {} frames", frames);
    }

    #[test]
    fn test_critically_damped_does_not_overshoot() {
        let config = SpringConfig::default();
        let mut value = 1.0;
        let mut velocity = 0.0;
        for _ in 0..600 {
            config.step(&mut value, &mut velocity, 2.5, 1.0 / 60.0);
            assert!(value <= 2.5 + 1e-6, "overshot to {}", value);
        }
    }

    #[test]
    fn test_underdamped_overshoots() {
        let config = SpringConfig::default().with_damping(4.0);
        let mut value = 0.0;
        let mut velocity = 0.0;
        let mut peak: f64 = 0.0;
        for _ in 0..120 {
            config.step(&mut value, &mut velocity, 1.0, 1.0 / 60.0);
            peak = peak.max(value);
        }
        assert!(peak > 1.0);
    }

    #[test]
    fn test_long_frame_is_substepped() {
        let config = SpringConfig::default();
        let mut value = 0.0;
        let mut velocity = 0.0;
        // A single half-second frame must not blow up.
        config.step(&mut value, &mut velocity, 100.0, 0.5);
        assert!(value > 0.0 && value < 100.0);
    }
}
