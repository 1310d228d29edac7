//! Full-screen media popup.
//!
//! - `PopupController` - lifecycle state machine, open/close choreography, gesture routing
//! - `PopupContent` / `PopupFrame` - render contract with the host

pub mod controller;
pub mod render;

pub use controller::{
    CloseReason, PopupController, PopupEvent, PopupState, EVENT_QUEUE_CAPACITY,
};
pub use render::{OverlayFrame, PopupContent, PopupFrame};
