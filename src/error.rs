//! Error types for the popup engine and playback layer.

use thiserror::Error;

/// Why a thumbnail could not be measured at activation time.
///
/// Never surfaces to callers of the popup: the geometry resolver turns it into
/// the full-screen fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("host surface is not laid out yet")]
    NotLaidOut,
    #[error("measured rect is degenerate ({width}x{height})")]
    Degenerate { width: f64, height: f64 },
}

/// Failures reported by audio/video backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("playback backend failed: {0}")]
    Backend(String),
    #[error("media duration is unknown")]
    UnknownDuration,
}

impl PlaybackError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
