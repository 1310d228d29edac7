// Engine tunables for the media popup.
// Defaults reproduce the chat toolkit's feel; every value can be overridden
// through MEDIAPOP_* environment variables for tuning on device.

use std::time::Duration;

use crate::animation::SpringConfig;

/// Minimum content zoom reachable by pinching.
pub const MIN_ZOOM: f64 = 0.3;
/// Maximum content zoom reachable by pinching.
pub const MAX_ZOOM: f64 = 4.0;
/// Fraction of the viewport the opened media fills.
pub const FIT_FACTOR: f64 = 0.9;
/// Zoom level a double-tap jumps to.
pub const DOUBLE_TAP_ZOOM: f64 = 2.5;
/// Resting scale above which a double-tap zooms back out.
pub const DOUBLE_TAP_ZOOM_OUT_ABOVE: f64 = 1.5;
/// Pinch released below this scale closes the popup.
pub const PINCH_CLOSE_BELOW: f64 = 0.8;
/// Pan distance (px) beyond which a release may close the popup.
pub const PAN_CLOSE_DISTANCE: f64 = 150.0;
/// Pan-to-close only applies at or below this scale.
pub const PAN_CLOSE_MAX_SCALE: f64 = 1.2;

const OPEN_FADE_MS: u64 = 300;
const CLOSE_FADE_MS: u64 = 200;
const FRAME_INTERVAL_MS: u64 = 16;
const VIDEO_AUTOPLAY_DELAY_MS: u64 = 1000;

/// Per-popup options supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupConfig {
    /// Render a close button in the overlay.
    pub show_close_affordance: bool,
    /// Grow from the thumbnail. When false the popup fades in full-screen.
    pub animate_to_center: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            show_close_affordance: true,
            animate_to_center: true,
        }
    }
}

/// Tap detection parameters for the double-tap recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapConfig {
    /// Longest press still counted as a tap.
    pub max_press: Duration,
    /// Longest gap between the two taps.
    pub max_gap: Duration,
    /// Movement allowed during one tap.
    pub slop: f64,
    /// Distance allowed between the two taps.
    pub double_tap_slop: f64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            max_press: Duration::from_millis(250),
            max_gap: Duration::from_millis(300),
            slop: 10.0,
            double_tap_slop: 40.0,
        }
    }
}

/// All engine tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub fit_factor: f64,
    pub double_tap_zoom: f64,
    pub double_tap_zoom_out_above: f64,
    pub pinch_close_below: f64,
    pub pan_close_distance: f64,
    pub pan_close_max_scale: f64,
    /// Movement before a pan starts.
    pub pan_slop: f64,
    pub tap: TapConfig,
    pub spring: SpringConfig,
    pub open_fade: Duration,
    pub close_fade: Duration,
    pub frame_interval: Duration,
    pub video_autoplay_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            fit_factor: FIT_FACTOR,
            double_tap_zoom: DOUBLE_TAP_ZOOM,
            double_tap_zoom_out_above: DOUBLE_TAP_ZOOM_OUT_ABOVE,
            pinch_close_below: PINCH_CLOSE_BELOW,
            pan_close_distance: PAN_CLOSE_DISTANCE,
            pan_close_max_scale: PAN_CLOSE_MAX_SCALE,
            pan_slop: 10.0,
            tap: TapConfig::default(),
            spring: SpringConfig::default(),
            open_fade: Duration::from_millis(OPEN_FADE_MS),
            close_fade: Duration::from_millis(CLOSE_FADE_MS),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            video_autoplay_delay: Duration::from_millis(VIDEO_AUTOPLAY_DELAY_MS),
        }
    }
}

impl EngineConfig {
    /// Defaults with `MEDIAPOP_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let float = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
        };
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_millis)
        };

        if let Some(v) = float("MEDIAPOP_MIN_ZOOM") {
            config.min_zoom = v;
        }
        if let Some(v) = float("MEDIAPOP_MAX_ZOOM") {
            config.max_zoom = v;
        }
        if config.min_zoom > config.max_zoom {
            tracing::warn!(
                min = config.min_zoom,
                max = config.max_zoom,
                "Ignoring inverted zoom bounds from environment"
            );
            config.min_zoom = MIN_ZOOM;
            config.max_zoom = MAX_ZOOM;
        }
        if let Some(v) = float("MEDIAPOP_SPRING_DAMPING") {
            config.spring.damping = v;
        }
        if let Some(v) = float("MEDIAPOP_SPRING_STIFFNESS") {
            config.spring.stiffness = v;
        }
        if let Some(v) = float("MEDIAPOP_PAN_CLOSE_DISTANCE") {
            config.pan_close_distance = v;
        }
        if let Some(d) = millis("MEDIAPOP_OPEN_FADE_MS") {
            config.open_fade = d;
        }
        if let Some(d) = millis("MEDIAPOP_CLOSE_FADE_MS") {
            config.close_fade = d;
        }
        if let Some(d) = millis("MEDIAPOP_FRAME_MS") {
            config.frame_interval = d;
        }
        config
    }
}
