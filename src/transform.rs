//! Live scale/translation shared between the gesture layer and the renderer.

use std::time::Duration;

use tracing::warn;

use crate::animation::{AnimatedValue, SpringConfig};
use crate::config::{MAX_ZOOM, MIN_ZOOM};

/// Plain scale + translation, applied as translate-then-scale about the
/// element center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub const fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A change coming from a live gesture, relative to the committed snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformDelta {
    /// Multiply the saved scale; the result is clamped to the zoom range.
    Scale(f64),
    /// Offset the saved translation. Not clamped.
    Translate(f64, f64),
}

/// Content transform of one popup session plus the snapshot the next gesture
/// builds on.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    scale: AnimatedValue,
    translate_x: AnimatedValue,
    translate_y: AnimatedValue,
    saved: Transform2D,
    min_zoom: f64,
    max_zoom: f64,
}

impl TransformState {
    /// Bounds that are inverted or not finite fall back to the defaults.
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        let valid = min_zoom.is_finite() && max_zoom.is_finite() && min_zoom <= max_zoom;
        let (min_zoom, max_zoom) = if valid {
            (min_zoom, max_zoom)
        } else {
            warn!(min_zoom, max_zoom, "Invalid zoom bounds, using defaults");
            (MIN_ZOOM, MAX_ZOOM)
        };
        Self {
            scale: AnimatedValue::new(1.0),
            translate_x: AnimatedValue::new(0.0),
            translate_y: AnimatedValue::new(0.0),
            saved: Transform2D::IDENTITY,
            min_zoom,
            max_zoom,
        }
    }

    pub fn current(&self) -> Transform2D {
        Transform2D::new(
            self.scale.get(),
            self.translate_x.get(),
            self.translate_y.get(),
        )
    }

    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.translate_x.get(), self.translate_y.get())
    }

    /// The committed snapshot.
    pub fn saved(&self) -> Transform2D {
        self.saved
    }

    /// Apply a live gesture delta. Direct writes cancel running animations
    /// on the touched channels only.
    pub fn apply(&mut self, delta: TransformDelta) {
        match delta {
            TransformDelta::Scale(factor) => {
                let scale = (self.saved.scale * factor).clamp(self.min_zoom, self.max_zoom);
                self.scale.set(scale);
            }
            TransformDelta::Translate(dx, dy) => {
                self.translate_x.set(self.saved.translate_x + dx);
                self.translate_y.set(self.saved.translate_y + dy);
            }
        }
    }

    /// Snapshot the current values as the new baseline. Running animations
    /// stop where they are so the captured value is what stays on screen.
    pub fn commit(&mut self) {
        self.scale.stop();
        self.saved.scale = self.scale.get();
        self.commit_translation();
    }

    /// Snapshot translation only; a scale animation keeps running.
    pub fn commit_translation(&mut self) {
        self.translate_x.stop();
        self.translate_y.stop();
        self.saved.translate_x = self.translate_x.get();
        self.saved.translate_y = self.translate_y.get();
    }

    /// Record a resting target as the snapshot without touching live values.
    pub fn set_saved(&mut self, saved: Transform2D) {
        self.saved = saved;
    }

    /// Spring all channels toward `target` and record it as the snapshot.
    pub fn spring_to(&mut self, target: Transform2D, config: SpringConfig) {
        self.scale.spring_to(target.scale, config);
        self.spring_translation_to(target.translate_x, target.translate_y, config);
        self.saved.scale = target.scale;
    }

    /// Spring translation toward `(x, y)` and record it as the snapshot.
    pub fn spring_translation_to(&mut self, x: f64, y: f64, config: SpringConfig) {
        self.translate_x.spring_to(x, config);
        self.translate_y.spring_to(y, config);
        self.saved.translate_x = x;
        self.saved.translate_y = y;
    }

    /// Spring scale only and record it as the snapshot scale.
    pub fn spring_scale_to(&mut self, scale: f64, config: SpringConfig) {
        self.scale.spring_to(scale, config);
        self.saved.scale = scale;
    }

    pub fn is_animating(&self) -> bool {
        self.scale.is_animating()
            || self.translate_x.is_animating()
            || self.translate_y.is_animating()
    }

    /// Advance running animations. Returns true while any is still moving.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.scale.tick(dt);
        self.translate_x.tick(dt);
        self.translate_y.tick(dt);
        self.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn state() -> TransformState {
        TransformState::new(MIN_ZOOM, MAX_ZOOM)
    }

    #[test]
    fn test_scale_clamped_for_any_factor() {
        let mut t = state();
        for factor in [0.0, 0.01, 0.2, 0.5, 1.0, 3.0, 4.5, 100.0, f64::MAX] {
            t.apply(TransformDelta::Scale(factor));
            let expected = factor.clamp(MIN_ZOOM, MAX_ZOOM);
            assert_eq!(t.scale(), expected, "factor {}", factor);
        }
    }

    #[test]
    fn test_scale_relative_to_saved() {
        let mut t = state();
        t.apply(TransformDelta::Scale(2.0));
        t.commit();
        t.apply(TransformDelta::Scale(1.5));
        assert_eq!(t.scale(), 3.0);
        t.apply(TransformDelta::Scale(2.0));
        assert_eq!(t.scale(), MAX_ZOOM);
    }

    #[test]
    fn test_translation_unclamped_and_relative() {
        let mut t = state();
        t.apply(TransformDelta::Translate(5000.0, -20.0));
        assert_eq!(t.translation(), (5000.0, -20.0));
        t.commit_translation();
        t.apply(TransformDelta::Translate(-10.0, 10.0));
        assert_eq!(t.translation(), (4990.0, -10.0));
    }

    #[test]
    fn test_commit_captures_mid_animation_value() {
        let mut t = state();
        t.spring_scale_to(2.5, SpringConfig::default());
        for _ in 0..5 {
            t.tick(FRAME);
        }
        let mid = t.scale();
        assert!(mid > 1.0 && mid < 2.5);

        t.commit();
        assert_eq!(t.saved().scale, mid);
        assert!(!t.is_animating());
        t.tick(FRAME);
        assert_eq!(t.scale(), mid);
    }

    #[test]
    fn test_commit_translation_keeps_scale_spring() {
        let mut t = state();
        t.spring_scale_to(2.5, SpringConfig::default());
        t.commit_translation();
        assert!(t.is_animating());
        assert_eq!(t.saved().scale, 2.5);
    }

    #[test]
    fn test_spring_to_settles() {
        let mut t = state();
        t.apply(TransformDelta::Scale(0.9));
        t.apply(TransformDelta::Translate(30.0, 40.0));
        t.spring_to(Transform2D::IDENTITY, SpringConfig::default());
        assert_eq!(t.saved(), Transform2D::IDENTITY);
        let mut frames = 0;
        while t.tick(FRAME) {
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(t.current(), Transform2D::IDENTITY);
    }

    #[test]
    fn test_bad_zoom_bounds_fall_back() {
        for (min, max) in [(4.0, 0.3), (f64::NAN, 4.0), (0.3, f64::INFINITY)] {
            let mut t = TransformState::new(min, max);
            t.apply(TransformDelta::Scale(10.0));
            assert_eq!(t.scale(), MAX_ZOOM);
            t.apply(TransformDelta::Scale(0.0));
            assert_eq!(t.scale(), MIN_ZOOM);
        }
    }
}
