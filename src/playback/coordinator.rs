//! Process-wide registry that keeps at most one audio stream playing.
//!
//! Widgets register a pause callback when mounted and unregister when
//! unmounted. Before starting playback a widget awaits
//! [`PlaybackCoordinator::ensure_exclusive`], which pauses everyone else.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::PlaybackError;

static NEXT_PLAYBACK_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL: Lazy<Arc<PlaybackCoordinator>> =
    Lazy::new(|| Arc::new(PlaybackCoordinator::new()));

/// Opaque identity of one playback widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(u64);

impl PlaybackId {
    /// A fresh id, distinct from every other id in this process.
    pub fn new() -> Self {
        Self(NEXT_PLAYBACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PlaybackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Silences one widget.
pub type PauseFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), PlaybackError>> + Send + Sync>;

/// Wrap a closure as a [`PauseFn`].
pub fn pause_fn<F, Fut>(f: F) -> PauseFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PlaybackError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

struct AudioRegistryEntry {
    id: PlaybackId,
    pause: PauseFn,
}

/// Summary of one `ensure_exclusive` fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseReport {
    /// Pause callbacks invoked.
    pub attempted: usize,
    /// Of those, how many failed or panicked.
    pub failed: usize,
}

/// Registry of mounted playback widgets, kept in registration order.
#[derive(Default)]
pub struct PlaybackCoordinator {
    entries: Mutex<Vec<AudioRegistryEntry>>,
    /// Most recent `ensure_exclusive` caller. Ties between interleaved starts
    /// go to this one.
    latest: Mutex<Option<PlaybackId>>,
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<PlaybackId> = self.entries.lock().iter().map(|e| e.id).collect();
        f.debug_struct("PlaybackCoordinator")
            .field("entries", &ids)
            .field("latest", &*self.latest.lock())
            .finish()
    }
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, or replace the callback of an existing id in place.
    pub fn register(&self, id: PlaybackId, pause: PauseFn) {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.pause = pause,
            None => entries.push(AudioRegistryEntry { id, pause }),
        }
        trace!(?id, registered = entries.len(), "Registered playback instance");
    }

    /// Remove `id`. Unknown ids are ignored.
    pub fn unregister(&self, id: PlaybackId) {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.id != id);
        trace!(?id, registered = entries.len(), "Unregistered playback instance");
    }

    pub fn is_registered(&self, id: PlaybackId) -> bool {
        self.entries.lock().iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether `id` made the most recent `ensure_exclusive` call.
    ///
    /// A widget checks this once its own `play` resolves: if another widget
    /// asked for exclusivity in the meantime, the later caller wins and this
    /// one must pause again.
    pub fn is_latest(&self, id: PlaybackId) -> bool {
        *self.latest.lock() == Some(id)
    }

    /// Pause every registered instance except `requester` and wait for all of
    /// them to settle.
    ///
    /// Pauses run concurrently. A failing or panicking pause is logged and
    /// skipped; it never fails the call or holds up the others. There is no
    /// timeout: a pause that never completes keeps this pending.
    pub async fn ensure_exclusive(&self, requester: PlaybackId) -> PauseReport {
        *self.latest.lock() = Some(requester);
        // Snapshot so the lock is not held across the await and callbacks
        // may register/unregister freely.
        let targets: Vec<(PlaybackId, PauseFn)> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.id != requester)
            .map(|e| (e.id, Arc::clone(&e.pause)))
            .collect();

        let pauses = targets.into_iter().map(|(id, pause)| async move {
            let started = std::panic::catch_unwind(AssertUnwindSafe(|| pause()));
            let result = match started {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(panic) => Err(panic),
            };
            match result {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    debug!(?id, error = %e, "Pause failed, ignoring");
                    false
                }
                Err(_) => {
                    debug!(?id, "Pause panicked, ignoring");
                    false
                }
            }
        });

        let results = future::join_all(pauses).await;
        let report = PauseReport {
            attempted: results.len(),
            failed: results.iter().filter(|ok| !**ok).count(),
        };
        debug!(?requester, ?report, "Exclusive playback ensured");
        report
    }
}

/// The process-wide coordinator.
pub fn global() -> Arc<PlaybackCoordinator> {
    Arc::clone(&GLOBAL)
}

/// [`PlaybackCoordinator::register`] on the process-wide coordinator.
pub fn register(id: PlaybackId, pause: PauseFn) {
    GLOBAL.register(id, pause);
}

/// [`PlaybackCoordinator::unregister`] on the process-wide coordinator.
pub fn unregister(id: PlaybackId) {
    GLOBAL.unregister(id);
}

/// [`PlaybackCoordinator::ensure_exclusive`] on the process-wide coordinator.
pub async fn ensure_exclusive(requester: PlaybackId) -> PauseReport {
    GLOBAL.ensure_exclusive(requester).await
}
