//! Decides what a released gesture means for the popup.

use crate::config::EngineConfig;
use crate::geometry::{Size, Viewport};

/// Result of evaluating a gesture end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dismissal {
    /// Close the popup.
    Close,
    /// Spring back to fit: scale 1, no translation.
    SnapBack,
    /// Keep the released scale as the new baseline.
    Commit { scale: f64 },
    /// Spring translation to the nearest in-bounds position.
    Settle { x: f64, y: f64 },
}

/// Thresholds the policy works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DismissalPolicy {
    pub pinch_close_below: f64,
    pub pan_close_distance: f64,
    pub pan_close_max_scale: f64,
}

impl DismissalPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            pinch_close_below: config.pinch_close_below,
            pan_close_distance: config.pan_close_distance,
            pan_close_max_scale: config.pan_close_max_scale,
        }
    }

    /// Shrinking well below fit closes; a small overshoot below fit snaps
    /// back; anything at or above fit is kept.
    pub fn on_pinch_end(&self, scale: f64) -> Dismissal {
        if scale < self.pinch_close_below {
            Dismissal::Close
        } else if scale < 1.0 {
            Dismissal::SnapBack
        } else {
            Dismissal::Commit { scale }
        }
    }

    /// A long drag near fit closes. Otherwise translation settles inside the
    /// bounds that keep the scaled content covering the viewport.
    pub fn on_pan_end(
        &self,
        distance: f64,
        scale: f64,
        translation: (f64, f64),
        content: Size,
        viewport: Viewport,
    ) -> Dismissal {
        if distance > self.pan_close_distance && scale <= self.pan_close_max_scale {
            return Dismissal::Close;
        }

        let (x, y) = clamp_translation(translation, scale, content, viewport);
        Dismissal::Settle { x, y }
    }
}

impl Default for DismissalPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Largest translation per axis that keeps `content * scale` over the viewport.
pub fn max_translation(scale: f64, content: Size, viewport: Viewport) -> (f64, f64) {
    (
        ((content.width * scale - viewport.width) / 2.0).max(0.0),
        ((content.height * scale - viewport.height) / 2.0).max(0.0),
    )
}

pub fn clamp_translation(
    translation: (f64, f64),
    scale: f64,
    content: Size,
    viewport: Viewport,
) -> (f64, f64) {
    let (max_x, max_y) = max_translation(scale, content, viewport);
    (
        translation.0.clamp(-max_x, max_x),
        translation.1.clamp(-max_y, max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Viewport = Viewport::new(400.0, 800.0);
    const CONTENT: Size = Size::new(360.0, 360.0);

    #[test]
    fn test_pinch_thresholds() {
        let policy = DismissalPolicy::default();
        assert_eq!(policy.on_pinch_end(0.75), Dismissal::Close);
        assert_eq!(policy.on_pinch_end(0.3), Dismissal::Close);
        assert_eq!(policy.on_pinch_end(0.85), Dismissal::SnapBack);
        assert_eq!(policy.on_pinch_end(0.8), Dismissal::SnapBack);
        assert_eq!(policy.on_pinch_end(1.0), Dismissal::Commit { scale: 1.0 });
        assert_eq!(policy.on_pinch_end(1.5), Dismissal::Commit { scale: 1.5 });
    }

    #[test]
    fn test_pan_close_needs_distance_and_low_scale() {
        let policy = DismissalPolicy::default();
        assert_eq!(
            policy.on_pan_end(160.0, 1.1, (0.0, 160.0), CONTENT, SCREEN),
            Dismissal::Close
        );
        assert_eq!(
            policy.on_pan_end(160.0, 1.2, (0.0, 160.0), CONTENT, SCREEN),
            Dismissal::Close
        );
        assert!(matches!(
            policy.on_pan_end(160.0, 1.3, (0.0, 160.0), CONTENT, SCREEN),
            Dismissal::Settle { .. }
        ));
        assert!(matches!(
            policy.on_pan_end(100.0, 1.0, (0.0, 100.0), CONTENT, SCREEN),
            Dismissal::Settle { .. }
        ));
        // Exactly the threshold is not "beyond" it.
        assert!(matches!(
            policy.on_pan_end(150.0, 1.0, (150.0, 0.0), CONTENT, SCREEN),
            Dismissal::Settle { .. }
        ));
    }

    #[test]
    fn test_settle_returns_to_center_when_content_fits() {
        let policy = DismissalPolicy::default();
        assert_eq!(
            policy.on_pan_end(100.0, 1.0, (60.0, -80.0), CONTENT, SCREEN),
            Dismissal::Settle { x: 0.0, y: 0.0 }
        );
    }

    #[test]
    fn test_settle_clamps_per_axis() {
        let policy = DismissalPolicy::default();
        // At 3x: 1080 wide -> +-340 horizontally, 1080 tall -> +-140 vertically.
        assert_eq!(
            policy.on_pan_end(500.0, 3.0, (500.0, -300.0), CONTENT, SCREEN),
            Dismissal::Settle {
                x: 340.0,
                y: -140.0
            }
        );
        assert_eq!(
            policy.on_pan_end(50.0, 3.0, (20.0, 10.0), CONTENT, SCREEN),
            Dismissal::Settle { x: 20.0, y: 10.0 }
        );
    }

    #[test]
    fn test_max_translation_never_negative() {
        assert_eq!(max_translation(0.5, CONTENT, SCREEN), (0.0, 0.0));
    }
}
