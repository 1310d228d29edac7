use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::info;

use mediapop::animation::FrameLoop;
use mediapop::geometry::Size;
use mediapop::gesture::{PointerEvent, PointerPhase};
use mediapop::media::ImageMessage;
use mediapop::playback::{AudioBackend, AudioMessage};
use mediapop::popup::{PopupContent, PopupState};
use mediapop::{EngineConfig, GeometryRect, PlaybackError, PopupConfig, Viewport};

/// Stands in for a host image view.
struct DemoImage;

impl PopupContent for DemoImage {
    type Node = String;

    fn render_collapsed(&self) -> String {
        "thumbnail".to_string()
    }

    fn render_expanded(&self, size: Size) -> String {
        format!("image {:.0}x{:.0}", size.width, size.height)
    }
}

/// Stands in for a platform audio player.
struct DemoPlayer {
    name: &'static str,
    playing: Mutex<bool>,
}

impl DemoPlayer {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            playing: Mutex::new(false),
        }
    }

    fn set(&self, playing: bool) -> BoxFuture<'_, Result<(), PlaybackError>> {
        *self.playing.lock() = playing;
        info!(player = self.name, playing, "Player state");
        futures::future::ready(Ok(())).boxed()
    }
}

impl AudioBackend for DemoPlayer {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        self.set(true)
    }

    fn pause(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        self.set(false)
    }

    fn seek(&self, _seconds: f64) -> BoxFuture<'_, Result<(), PlaybackError>> {
        futures::future::ready(Ok(())).boxed()
    }

    fn position(&self) -> BoxFuture<'_, Option<f64>> {
        futures::future::ready(Some(0.0)).boxed()
    }

    fn duration(&self) -> BoxFuture<'_, Option<f64>> {
        futures::future::ready(Some(42.0)).boxed()
    }
}

async fn popup_demo(engine: EngineConfig) -> Result<()> {
    let frame_loop = FrameLoop::new(engine.frame_interval);
    let message = Arc::new(Mutex::new(ImageMessage::new(
        DemoImage,
        engine,
        PopupConfig::default(),
        Viewport::new(390.0, 844.0),
    )));
    let events = message.lock().events();

    message
        .lock()
        .open(Ok(GeometryRect::new(16.0, 420.0, 160.0, 120.0)));
    let frames = frame_loop.run(Arc::clone(&message)).await;
    info!(frames, "Open animation finished");

    // Drag down far enough to dismiss.
    {
        let mut message = message.lock();
        let t0 = Instant::now();
        for (i, y) in [400.0, 480.0, 560.0, 600.0].into_iter().enumerate() {
            let phase = match i {
                0 => PointerPhase::Down,
                3 => PointerPhase::Up,
                _ => PointerPhase::Move,
            };
            let at = t0 + std::time::Duration::from_millis(16 * i as u64);
            for outcome in message.handle_pointer(PointerEvent::new(1, phase, 195.0, y, at)) {
                info!(?outcome, "Gesture outcome");
            }
        }
    }
    let frames = frame_loop.run(Arc::clone(&message)).await;
    info!(frames, "Close animation finished");

    let state = message.lock().popup().state();
    if state != PopupState::Closed {
        bail!("popup did not close, stuck in {:?}", state);
    }
    while let Ok(event) = events.try_recv() {
        info!(?event, "Popup event");
    }
    Ok(())
}

async fn playback_demo() -> Result<()> {
    let first = AudioMessage::new(DemoPlayer::new("first"));
    let second = AudioMessage::new(DemoPlayer::new("second"));

    first.refresh_status().await;
    first.toggle_play().await?;
    second.toggle_play().await?;

    info!(
        first = first.is_playing(),
        second = second.is_playing(),
        duration = %first.duration_label(),
        "Exclusive playback"
    );
    if first.is_playing() {
        bail!("first player should have been paused");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediapop=info".parse()?),
        )
        .init();

    let engine = EngineConfig::from_env();
    popup_demo(engine).await?;
    playback_demo().await?;
    Ok(())
}
