//! Gesture handling for the opened media.
//!
//! - `recognizer` turns raw pointer events into double-tap, pinch and pan phases
//! - `composer` combines them as `(double-tap RACE pinch) SIMULTANEOUS pan` and
//!   applies them to the content transform

pub mod composer;
pub mod recognizer;

pub use composer::{GestureComposer, GestureContext, GestureOutcome};
pub use recognizer::{GestureRecognizers, Point, PointerEvent, PointerId, PointerPhase};

/// Phase of a continuous gesture carrying its payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase<T> {
    Begin,
    Update(T),
    End(T),
}

/// Output of the recognizers, input of the composer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    DoubleTap { x: f64, y: f64 },
    /// Payload is the scale factor relative to the span at begin.
    Pinch(Phase<f64>),
    /// Payload is the total translation since begin.
    Pan(Phase<(f64, f64)>),
}
