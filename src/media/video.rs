//! Video bubble.
//!
//! The popup only frames the preview; the platform player owns playback.
//! Shortly after the popup opens an autoplay task hands over to the player in
//! fullscreen, and leaving fullscreen closes the popup again.

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::animation::Animated;
use crate::config::{EngineConfig, PopupConfig};
use crate::error::{MeasureError, PlaybackError};
use crate::geometry::{GeometryRect, Size, Viewport};
use crate::popup::{PopupContent, PopupController, PopupEvent, PopupFrame};

/// Preview size used until the host reports a real layout.
pub const DEFAULT_PREVIEW_SIZE: Size = Size::new(200.0, 200.0);

/// The platform video player.
pub trait VideoSurface: Send + Sync + 'static {
    fn enter_fullscreen(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;
}

pub struct VideoMessage<S, C> {
    surface: Arc<S>,
    content: C,
    popup: PopupController,
    preview: Size,
    autoplay_delay: Duration,
    autoplay: Option<JoinHandle<()>>,
}

impl<S, C> std::fmt::Debug for VideoMessage<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoMessage")
            .field("popup", &self.popup)
            .field("preview", &self.preview)
            .field("autoplay_pending", &self.autoplay.is_some())
            .finish()
    }
}

impl<S: VideoSurface, C: PopupContent> VideoMessage<S, C> {
    pub fn new(
        surface: S,
        content: C,
        engine: EngineConfig,
        config: PopupConfig,
        viewport: Viewport,
    ) -> Self {
        let autoplay_delay = engine.video_autoplay_delay;
        Self {
            surface: Arc::new(surface),
            content,
            popup: PopupController::new(engine, config, viewport).with_gestures(false),
            preview: DEFAULT_PREVIEW_SIZE,
            autoplay_delay,
            autoplay: None,
        }
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn events(&self) -> Receiver<PopupEvent> {
        self.popup.events()
    }

    pub fn preview_size(&self) -> Size {
        self.preview
    }

    /// Record the preview's laid out size. An empty layout keeps the default.
    pub fn set_preview_layout(&mut self, size: Size) {
        self.preview = if size.width > 0.0 && size.height > 0.0 {
            size
        } else {
            DEFAULT_PREVIEW_SIZE
        };
    }

    pub fn is_autoplay_pending(&self) -> bool {
        self.autoplay.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Open the popup and schedule the hand-over to the player.
    ///
    /// A measured rect with no area is widened to the preview size at the
    /// same origin. Autoplay needs a tokio runtime; without one the popup
    /// still opens and the host must start playback itself.
    pub fn open(&mut self, measured: Result<GeometryRect, MeasureError>) -> bool {
        let measured = measured.map(|rect| {
            if rect.width > 0.0 && rect.height > 0.0 {
                rect
            } else {
                GeometryRect::new(rect.x, rect.y, self.preview.width, self.preview.height)
            }
        });
        if !self.popup.open(measured) {
            return false;
        }
        self.schedule_autoplay();
        true
    }

    fn schedule_autoplay(&mut self) {
        self.cancel_autoplay();
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No runtime, skipping video autoplay");
                return;
            }
        };

        let surface = Arc::clone(&self.surface);
        let delay = self.autoplay_delay;
        self.autoplay = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = surface.enter_fullscreen().await {
                warn!(error = %e, "Failed to enter fullscreen");
                return;
            }
            match surface.play().await {
                Ok(()) => debug!("Video autoplay started"),
                Err(e) => warn!(error = %e, "Video autoplay failed"),
            }
        }));
    }

    fn cancel_autoplay(&mut self) {
        if let Some(handle) = self.autoplay.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending video autoplay");
            }
            handle.abort();
        }
    }

    pub fn close(&mut self) -> bool {
        self.cancel_autoplay();
        self.popup.close()
    }

    /// The player left fullscreen.
    pub fn on_fullscreen_exit(&mut self) -> bool {
        debug!("Video left fullscreen");
        self.close()
    }

    pub fn render(&self) -> PopupFrame<C::Node> {
        self.popup.render(&self.content)
    }

    pub fn tick(&mut self, dt: Duration) -> bool {
        self.popup.tick(dt)
    }
}

impl<S, C> Drop for VideoMessage<S, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.autoplay.take() {
            handle.abort();
        }
    }
}

impl<S: VideoSurface, C: PopupContent> Animated for VideoMessage<S, C> {
    fn tick(&mut self, dt: Duration) -> bool {
        VideoMessage::tick(self, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureEvent;
    use crate::popup::PopupState;
    use futures::FutureExt;
    use parking_lot::Mutex;

    #[derive(Debug, Default, Clone)]
    struct FakeSurface {
        calls: Arc<Mutex<Vec<&'static str>>>,
        refuse_fullscreen: bool,
    }

    impl FakeSurface {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    impl VideoSurface for FakeSurface {
        fn enter_fullscreen(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
            self.calls.lock().push("fullscreen");
            let result = if self.refuse_fullscreen {
                Err(PlaybackError::backend("no fullscreen"))
            } else {
                Ok(())
            };
            futures::future::ready(result).boxed()
        }

        fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
            self.calls.lock().push("play");
            futures::future::ready(Ok(())).boxed()
        }
    }

    struct Clip;

    impl PopupContent for Clip {
        type Node = Size;

        fn render_collapsed(&self) -> Size {
            Size::default()
        }

        fn render_expanded(&self, size: Size) -> Size {
            size
        }
    }

    fn message(surface: &FakeSurface) -> VideoMessage<FakeSurface, Clip> {
        VideoMessage::new(
            surface.clone(),
            Clip,
            EngineConfig::default(),
            PopupConfig::default(),
            Viewport::new(400.0, 800.0),
        )
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_after_delay() {
        let surface = FakeSurface::default();
        let mut video = message(&surface);
        assert!(video.open(Ok(GeometryRect::new(10.0, 300.0, 160.0, 90.0))));

        advance(900).await;
        assert!(surface.calls().is_empty());
        assert!(video.is_autoplay_pending());

        advance(200).await;
        assert_eq!(surface.calls(), vec!["fullscreen", "play"]);
        assert!(!video.is_autoplay_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_delay_cancels_autoplay() {
        let surface = FakeSurface::default();
        let mut video = message(&surface);
        video.open(Ok(GeometryRect::new(10.0, 300.0, 160.0, 90.0)));

        advance(500).await;
        assert!(video.close());
        advance(2000).await;
        assert!(surface.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fullscreen_refused_skips_play() {
        let surface = FakeSurface {
            refuse_fullscreen: true,
            ..FakeSurface::default()
        };
        let mut video = message(&surface);
        video.open(Ok(GeometryRect::new(10.0, 300.0, 160.0, 90.0)));
        advance(1100).await;
        assert_eq!(surface.calls(), vec!["fullscreen"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_fullscreen_closes_popup() {
        let surface = FakeSurface::default();
        let mut video = message(&surface);
        video.open(Ok(GeometryRect::new(10.0, 300.0, 160.0, 90.0)));
        advance(1100).await;

        assert!(video.on_fullscreen_exit());
        assert_eq!(video.popup().state(), PopupState::Closing);
        while video.tick(Duration::from_millis(16)) {}
        assert_eq!(video.popup().state(), PopupState::Closed);
    }

    #[test]
    fn test_empty_layout_uses_default_preview() {
        let surface = FakeSurface::default();
        let mut video = message(&surface);
        video.set_preview_layout(Size::new(0.0, 0.0));
        assert_eq!(video.preview_size(), DEFAULT_PREVIEW_SIZE);
        video.set_preview_layout(Size::new(320.0, 180.0));
        assert_eq!(video.preview_size(), Size::new(320.0, 180.0));

        video.set_preview_layout(Size::default());
        // No runtime here: the popup opens without scheduling autoplay.
        assert!(video.open(Ok(GeometryRect::new(10.0, 300.0, 0.0, 0.0))));
        assert!(!video.is_autoplay_pending());
        assert_eq!(
            video.popup().source_rect(),
            Some(GeometryRect::new(10.0, 300.0, 200.0, 200.0))
        );
    }

    #[test]
    fn test_gestures_disabled() {
        let surface = FakeSurface::default();
        let mut video = message(&surface);
        video.open(Ok(GeometryRect::new(10.0, 300.0, 160.0, 90.0)));
        let popup = &mut video.popup;
        assert_eq!(
            popup.handle_gesture(GestureEvent::DoubleTap { x: 0.0, y: 0.0 }),
            None
        );
    }
}
