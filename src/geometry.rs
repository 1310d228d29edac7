//! Screen-space geometry for the shared-element transition.
//!
//! The resolver takes the thumbnail's measured rect and works out where the
//! popup grows to: a rect centered in the viewport, scaled to fill a fixed
//! fraction of it.

use crate::error::MeasureError;

/// Axis-aligned rect in screen pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GeometryRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Rect with the same center, scaled by `factor`.
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        let (cx, cy) = self.center();
        let width = self.width * factor;
        let height = self.height * factor;
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Reject rects a transition cannot be computed from.
    pub fn validate(self) -> Result<Self, MeasureError> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(MeasureError::Degenerate {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// The screen the popup is presented on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> GeometryRect {
        GeometryRect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Source and target of one popup session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGeometry {
    /// Where the thumbnail sits right now.
    pub source_rect: GeometryRect,
    /// Where the media ends up when fully open.
    pub target_rect: GeometryRect,
    /// Scale applied to the source to reach the target.
    pub optimal_scale: f64,
    /// Translation moving the source center onto the viewport center.
    pub center_offset: (f64, f64),
    /// False when measurement failed and the popup just fades in.
    pub shared_element: bool,
}

impl ResolvedGeometry {
    /// Full-screen geometry with no shared-element motion.
    pub fn fullscreen(viewport: Viewport) -> Self {
        Self {
            source_rect: viewport.rect(),
            target_rect: viewport.rect(),
            optimal_scale: 1.0,
            center_offset: (0.0, 0.0),
            shared_element: false,
        }
    }

    /// On-screen content size at content scale 1.
    pub fn fitted_size(&self) -> Size {
        self.target_rect.size()
    }
}

/// Compute the session geometry from a thumbnail measurement.
///
/// Measurement failures fall back to [`ResolvedGeometry::fullscreen`]; this
/// never fails.
pub fn resolve(
    measured: Result<GeometryRect, MeasureError>,
    viewport: Viewport,
    fit_factor: f64,
) -> ResolvedGeometry {
    let source = match measured.and_then(GeometryRect::validate) {
        Ok(rect) => rect,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Thumbnail measurement failed, opening without shared element"
            );
            return ResolvedGeometry::fullscreen(viewport);
        }
    };

    let optimal_scale =
        (viewport.width / source.width).min(viewport.height / source.height) * fit_factor;
    let (cx, cy) = source.center();
    let center_offset = (viewport.width / 2.0 - cx, viewport.height / 2.0 - cy);
    let target_rect = source
        .scaled_about_center(optimal_scale)
        .translated(center_offset.0, center_offset.1);

    tracing::trace!(
        ?source,
        ?target_rect,
        optimal_scale,
        "Resolved popup geometry"
    );

    ResolvedGeometry {
        source_rect: source,
        target_rect,
        optimal_scale,
        center_offset,
        shared_element: true,
    }
}
