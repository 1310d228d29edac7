//! Fixed-interval frame driver on tokio.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

use super::Animated;

/// Ticks an [`Animated`] target until it goes idle.
///
/// The target sits behind a mutex shared with whatever feeds it input; the
/// lock is held only for the duration of one tick, never across an await.
#[derive(Debug, Clone, Copy)]
pub struct FrameLoop {
    interval: Duration,
}

impl FrameLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the target reports idle. Returns the number of frames ticked.
    pub async fn run<A: Animated>(&self, target: Arc<Mutex<A>>) -> u64 {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; use it as the time origin.
        let mut last = ticker.tick().await;
        let mut frames = 0u64;

        loop {
            let now: Instant = ticker.tick().await;
            let dt = now.saturating_duration_since(last);
            last = now;
            frames += 1;

            let busy = target.lock().tick(dt);
            if !busy {
                break;
            }
        }

        trace!(frames, "Frame loop idle");
        frames
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedValue, Easing};

    struct Fade(AnimatedValue);

    impl Animated for Fade {
        fn tick(&mut self, dt: Duration) -> bool {
            self.0.tick(dt);
            self.0.is_animating()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_idle() {
        let mut value = AnimatedValue::new(0.0);
        value.timing_to(1.0, Duration::from_millis(160), Easing::Linear);
        let fade = Arc::new(Mutex::new(Fade(value)));

        let frames = FrameLoop::default().run(Arc::clone(&fade)).await;

        assert_eq!(frames, 10);
        assert_eq!(fade.lock().0.get(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_target_stops_after_one_frame() {
        let fade = Arc::new(Mutex::new(Fade(AnimatedValue::new(1.0))));
        let frames = FrameLoop::default().run(fade).await;
        assert_eq!(frames, 1);
    }
}
