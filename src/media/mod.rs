//! Chat message bubbles that open the media popup.
//!
//! - `ImageMessage` - zoomable image popup with the full gesture pipeline
//! - `VideoMessage` - popup that hands off to the platform player after a delay

pub mod image;
pub mod video;

pub use image::ImageMessage;
pub use video::{VideoMessage, VideoSurface, DEFAULT_PREVIEW_SIZE};
