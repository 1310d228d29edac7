//! Animation primitives for the popup.
//!
//! This module provides:
//! - `SpringConfig` / spring stepping - physically modeled motion for scale and translation
//! - `Timing` - fixed-duration eased interpolation for opacity
//! - `AnimatedValue` - a value that can be written directly or animated, cancellably
//! - `FrameLoop` - drives anything `Animated` at a fixed frame interval on tokio

pub mod frame_loop;
pub mod spring;
pub mod timing;
pub mod value;

use std::time::Duration;

pub use frame_loop::FrameLoop;
pub use spring::SpringConfig;
pub use timing::{Easing, Timing};
pub use value::{AnimatedValue, AnimationId};

/// Something advanced once per frame.
pub trait Animated {
    /// Advance by `dt`. Returns true while anything is still moving.
    fn tick(&mut self, dt: Duration) -> bool;
}
