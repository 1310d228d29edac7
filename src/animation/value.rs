//! Values that can be set directly or animated, with cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::spring::SpringConfig;
use super::timing::{Easing, Timing};

static NEXT_ANIMATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one started animation so completion can be matched to the
/// animation that was actually started (not one that superseded it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(u64);

impl AnimationId {
    fn next() -> Self {
        Self(NEXT_ANIMATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Spring {
        target: f64,
        velocity: f64,
        config: SpringConfig,
    },
    Timing(Timing),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Running {
    id: AnimationId,
    motion: Motion,
}

/// A scalar that is either at rest or driven by one animation.
///
/// Writing the value directly, or starting a new animation, cancels whatever
/// was running. The value read mid-animation is always the interpolated one.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedValue {
    value: f64,
    running: Option<Running>,
}

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            running: None,
        }
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Write the value, cancelling any running animation.
    pub fn set(&mut self, value: f64) {
        self.running = None;
        self.value = value;
    }

    /// Freeze at the current interpolated value.
    pub fn stop(&mut self) {
        self.running = None;
    }

    pub fn is_animating(&self) -> bool {
        self.running.is_some()
    }

    /// Where the value is heading: the animation target, or the value itself.
    pub fn target(&self) -> f64 {
        match self.running.map(|r| r.motion) {
            Some(Motion::Spring { target, .. }) => target,
            Some(Motion::Timing(timing)) => timing.to,
            None => self.value,
        }
    }

    /// Spring toward `target`. Velocity of a spring already running is
    /// carried over so retargeting stays smooth.
    pub fn spring_to(&mut self, target: f64, config: SpringConfig) -> AnimationId {
        let velocity = match self.running.map(|r| r.motion) {
            Some(Motion::Spring { velocity, .. }) => velocity,
            _ => 0.0,
        };
        self.start(Motion::Spring {
            target,
            velocity,
            config,
        })
    }

    /// Interpolate toward `target` over `duration`.
    pub fn timing_to(&mut self, target: f64, duration: Duration, easing: Easing) -> AnimationId {
        self.start(Motion::Timing(Timing::new(
            self.value, target, duration, easing,
        )))
    }

    fn start(&mut self, motion: Motion) -> AnimationId {
        let id = AnimationId::next();
        self.running = Some(Running { id, motion });
        id
    }

    /// Advance the running animation. Returns the id of an animation that
    /// finished during this tick.
    pub fn tick(&mut self, dt: Duration) -> Option<AnimationId> {
        let running = self.running.as_mut()?;
        let finished = match &mut running.motion {
            Motion::Spring {
                target,
                velocity,
                config,
            } => config.step(&mut self.value, velocity, *target, dt.as_secs_f64()),
            Motion::Timing(timing) => {
                let (value, done) = timing.advance(dt);
                self.value = value;
                done
            }
        };

        if finished {
            let id = running.id;
            self.running = None;
            return Some(id);
        }
        None
    }
}

impl Default for AnimatedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn run(value: &mut AnimatedValue) -> Option<AnimationId> {
        for _ in 0..1000 {
            if let Some(id) = value.tick(FRAME) {
                return Some(id);
            }
        }
        None
    }

    #[test]
    fn test_set_cancels_animation() {
        let mut value = AnimatedValue::new(1.0);
        value.spring_to(3.0, SpringConfig::default());
        value.tick(FRAME);
        assert!(value.is_animating());

        value.set(2.0);
        assert!(!value.is_animating());
        assert_eq!(value.tick(FRAME), None);
        assert_eq!(value.get(), 2.0);
    }

    #[test]
    fn test_stop_keeps_interpolated_value() {
        let mut value = AnimatedValue::new(0.0);
        value.timing_to(1.0, Duration::from_millis(100), Easing::Linear);
        value.tick(Duration::from_millis(40));
        value.stop();
        assert!((value.get() - 0.4).abs() < 1e-9);
        assert_eq!(value.target(), value.get());
    }

    #[test]
    fn test_completion_reports_matching_id() {
        let mut value = AnimatedValue::new(1.0);
        let first = value.timing_to(0.0, Duration::from_millis(200), Easing::EaseInOut);
        value.tick(FRAME);
        let second = value.timing_to(0.5, Duration::from_millis(50), Easing::EaseInOut);
        assert_ne!(first, second);
        assert_eq!(run(&mut value), Some(second));
        assert_eq!(value.get(), 0.5);
    }

    #[test]
    fn test_spring_retarget_carries_velocity() {
        let mut value = AnimatedValue::new(0.0);
        value.spring_to(100.0, SpringConfig::default());
        for _ in 0..5 {
            value.tick(FRAME);
        }
        let before = value.get();
        value.spring_to(200.0, SpringConfig::default());
        value.tick(FRAME);
        // Still moving forward immediately, no restart from rest.
        assert!(value.get() > before);
        assert_eq!(value.target(), 200.0);
    }
}
