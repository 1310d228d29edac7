//! Render contract between the popup engine and the host.
//!
//! The host supplies content nodes; the engine supplies where and how they are
//! laid out. Nothing here draws.

use crate::geometry::{GeometryRect, Size};
use crate::transform::Transform2D;

/// Content supplied by the host for one popup.
pub trait PopupContent {
    /// Whatever the host's UI layer renders (a widget, a view id, a string in tests).
    type Node;

    /// The inline thumbnail. Always rendered, open or not.
    fn render_collapsed(&self) -> Self::Node;

    /// The media shown in the overlay, laid out at `size` before transforms.
    fn render_expanded(&self, size: Size) -> Self::Node;
}

/// Everything the host needs to draw the overlay this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame<N> {
    pub node: N,
    /// Untransformed layout box of the expanded node.
    pub layout: GeometryRect,
    /// Transform applied about the center of `layout`.
    pub transform: Transform2D,
    /// Where the node ends up on screen after the transform.
    pub on_screen: GeometryRect,
    /// Opacity of the dark backdrop, 0..=1.
    pub backdrop_opacity: f64,
    pub show_close_affordance: bool,
}

/// One rendered frame: the thumbnail, plus the overlay while a session exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupFrame<N> {
    pub collapsed: N,
    pub overlay: Option<OverlayFrame<N>>,
}

impl<N> PopupFrame<N> {
    pub fn is_overlay_visible(&self) -> bool {
        self.overlay.is_some()
    }
}
