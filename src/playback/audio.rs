//! Controller behind one audio message bubble.
//!
//! Registers with the coordinator for as long as it lives, so dropping the
//! bubble can never leave a stale pause callback behind.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::coordinator::{pause_fn, PlaybackCoordinator, PlaybackId};
use crate::error::PlaybackError;

/// Positions within this distance of the end count as finished.
const END_TOLERANCE_SECS: f64 = 0.05;

/// Raw values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 10_000.0;

/// The platform audio player behind a message.
pub trait AudioBackend: Send + Sync + 'static {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;
    fn pause(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;
    /// Seek to `seconds` from the start.
    fn seek(&self, seconds: f64) -> BoxFuture<'_, Result<(), PlaybackError>>;
    /// Current position, in seconds or milliseconds depending on the platform.
    fn position(&self) -> BoxFuture<'_, Option<f64>>;
    /// Total length, same units caveat as `position`.
    fn duration(&self) -> BoxFuture<'_, Option<f64>>;
}

/// What the bubble shows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioStatus {
    pub playing: bool,
    /// Seconds.
    pub position: f64,
    /// Seconds, once known.
    pub duration: Option<f64>,
}

impl AudioStatus {
    fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn at_end(&self) -> bool {
        self.known_duration()
            .is_some_and(|d| self.position >= (d - END_TOLERANCE_SECS).max(0.0))
    }

    /// Playback progress in 0..=1.
    pub fn progress(&self) -> f64 {
        match self.known_duration() {
            Some(d) if self.position > 0.0 => (self.position / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

fn normalize_seconds(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    Some(if raw > MILLIS_THRESHOLD {
        raw / 1000.0
    } else {
        raw
    })
}

/// `m:ss`, or `0:00` for anything that is not a sane time.
pub fn format_time(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = total_seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub struct AudioMessage<B: AudioBackend> {
    id: PlaybackId,
    backend: Arc<B>,
    coordinator: Arc<PlaybackCoordinator>,
    status: Arc<Mutex<AudioStatus>>,
}

impl<B: AudioBackend> std::fmt::Debug for AudioMessage<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioMessage")
            .field("id", &self.id)
            .field("status", &*self.status.lock())
            .finish()
    }
}

impl<B: AudioBackend> AudioMessage<B> {
    /// Mount against the process-wide coordinator.
    pub fn new(backend: B) -> Self {
        Self::with_coordinator(super::coordinator::global(), backend)
    }

    pub fn with_coordinator(coordinator: Arc<PlaybackCoordinator>, backend: B) -> Self {
        let id = PlaybackId::new();
        let backend = Arc::new(backend);
        let status = Arc::new(Mutex::new(AudioStatus::default()));

        let pause = {
            let backend = Arc::clone(&backend);
            let status = Arc::clone(&status);
            pause_fn(move || {
                let backend = Arc::clone(&backend);
                let status = Arc::clone(&status);
                async move {
                    let result = backend.pause().await;
                    status.lock().playing = false;
                    result
                }
            })
        };
        coordinator.register(id, pause);
        debug!(?id, "Audio message mounted");

        Self {
            id,
            backend,
            coordinator,
            status,
        }
    }

    pub fn id(&self) -> PlaybackId {
        self.id
    }

    pub fn status(&self) -> AudioStatus {
        *self.status.lock()
    }

    pub fn is_playing(&self) -> bool {
        self.status.lock().playing
    }

    pub fn progress(&self) -> f64 {
        self.status().progress()
    }

    pub fn position_label(&self) -> String {
        format_time(self.status().position)
    }

    pub fn duration_label(&self) -> String {
        format_time(self.status().duration.unwrap_or(0.0))
    }

    /// Pause if playing. Otherwise rewind if finished, silence every other
    /// audio message, then play.
    ///
    /// When two messages start at once, the later `ensure_exclusive` caller
    /// keeps playing and the earlier one pauses itself once its play resolves.
    pub async fn toggle_play(&self) -> Result<(), PlaybackError> {
        let status = self.status();
        if status.playing {
            self.backend.pause().await?;
            self.status.lock().playing = false;
            return Ok(());
        }

        if status.at_end() {
            self.backend.seek(0.0).await?;
            self.status.lock().position = 0.0;
        }

        self.coordinator.ensure_exclusive(self.id).await;
        self.backend.play().await?;

        if !self.coordinator.is_latest(self.id) {
            debug!(id = ?self.id, "Superseded by a later start, pausing");
            let result = self.backend.pause().await;
            self.status.lock().playing = false;
            return result;
        }
        self.status.lock().playing = true;
        Ok(())
    }

    /// Seek to a fraction of the duration.
    pub async fn seek_fraction(&self, fraction: f64) -> Result<(), PlaybackError> {
        let duration = self
            .status()
            .known_duration()
            .ok_or(PlaybackError::UnknownDuration)?;
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = (duration * fraction).clamp(0.0, duration);
        self.backend.seek(target).await?;
        self.status.lock().position = target;
        Ok(())
    }

    /// Scrub from a touch at `x` on a track `track_width` wide. Ignored until
    /// the track has been laid out.
    pub async fn scrub(&self, x: f64, track_width: f64) -> Result<(), PlaybackError> {
        if track_width <= 0.0 {
            return Ok(());
        }
        self.seek_fraction(x / track_width).await
    }

    /// Pull position/duration from the backend. Reaching the end flips the
    /// bubble back to "play".
    pub async fn refresh_status(&self) -> AudioStatus {
        let position = self.backend.position().await.and_then(normalize_seconds);
        let duration = self.backend.duration().await.and_then(normalize_seconds);

        let mut status = self.status.lock();
        if let Some(position) = position {
            status.position = position;
        }
        if duration.is_some() {
            status.duration = duration;
        }
        if status.playing && status.at_end() {
            debug!(id = ?self.id, "Audio reached the end");
            status.playing = false;
        }
        *status
    }
}

impl<B: AudioBackend> Drop for AudioMessage<B> {
    fn drop(&mut self) {
        self.coordinator.unregister(self.id);
        if self.status.lock().playing {
            warn!(id = ?self.id, "Audio message dropped while playing");
        }
    }
}
