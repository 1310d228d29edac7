//! mediapop: gesture-driven shared-element media popup and exclusive audio
//! playback for chat UIs.
//!
//! The crate is headless. Hosts feed it measured geometry, pointer events and
//! frame ticks, and draw whatever [`popup::PopupFrame`] tells them to.

pub mod animation;
pub mod config;
pub mod dismissal;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod media;
pub mod playback;
pub mod popup;
pub mod transform;

pub use config::{EngineConfig, PopupConfig};
pub use error::{MeasureError, PlaybackError};
pub use geometry::{GeometryRect, Viewport};
pub use popup::{PopupController, PopupEvent, PopupState};
pub use playback::{AudioMessage, PlaybackCoordinator, PlaybackId};
