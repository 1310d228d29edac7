//! Audio playback for chat messages.
//!
//! - `coordinator` - process-wide registry enforcing a single active audio stream
//! - `audio` - per-message player controller built on the coordinator

pub mod audio;
pub mod coordinator;

pub use audio::{format_time, AudioBackend, AudioMessage, AudioStatus};
pub use coordinator::{
    ensure_exclusive, global, pause_fn, register, unregister, PauseFn, PauseReport,
    PlaybackCoordinator, PlaybackId,
};
