//! Combines recognizer output into one interaction on the content transform.
//!
//! Composition is `(double-tap RACE pinch) SIMULTANEOUS pan`: a double-tap is
//! rejected while a pinch owns the interaction, and pan phases always apply
//! alongside whichever of the two is active.

use tracing::{debug, trace};

use super::{GestureEvent, Phase};
use crate::animation::SpringConfig;
use crate::config::EngineConfig;
use crate::dismissal::{Dismissal, DismissalPolicy};
use crate::geometry::{Size, Viewport};
use crate::transform::{Transform2D, TransformDelta, TransformState};

/// Layout facts the pan-end clamp needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    /// On-screen content size at content scale 1.
    pub content: Size,
    pub viewport: Viewport,
}

/// What a handled gesture event amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Double-tap toggled zoom; `scale` is the new resting scale.
    ZoomToggled { scale: f64 },
    /// A pinch or pan was released and the dismissal policy ruled.
    Released(Dismissal),
}

#[derive(Debug)]
pub struct GestureComposer {
    policy: DismissalPolicy,
    spring: SpringConfig,
    double_tap_zoom: f64,
    zoom_out_above: f64,
    pinch_active: bool,
    pan_active: bool,
}

impl GestureComposer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            policy: DismissalPolicy::from_config(config),
            spring: config.spring,
            double_tap_zoom: config.double_tap_zoom,
            zoom_out_above: config.double_tap_zoom_out_above,
            pinch_active: false,
            pan_active: false,
        }
    }

    /// Forget in-flight gestures, e.g. when the popup starts closing.
    pub fn reset(&mut self) {
        self.pinch_active = false;
        self.pan_active = false;
    }

    /// Apply one gesture event to `transform`.
    ///
    /// Snap-back, commit and settle outcomes are applied here. A `Close`
    /// outcome is only reported; closing the popup is the caller's job.
    pub fn handle(
        &mut self,
        event: GestureEvent,
        transform: &mut TransformState,
        ctx: &GestureContext,
    ) -> Option<GestureOutcome> {
        match event {
            GestureEvent::DoubleTap { .. } => self.double_tap(transform),
            GestureEvent::Pinch(phase) => self.pinch(phase, transform),
            GestureEvent::Pan(phase) => self.pan(phase, transform, ctx),
        }
    }

    fn double_tap(&mut self, transform: &mut TransformState) -> Option<GestureOutcome> {
        if self.pinch_active {
            trace!("Double tap lost the race to an active pinch");
            return None;
        }

        // Decide on the resting scale, not the in-flight one, so a second
        // double-tap during the zoom spring still toggles back.
        let scale = if transform.saved().scale > self.zoom_out_above {
            transform.spring_to(Transform2D::IDENTITY, self.spring);
            1.0
        } else {
            transform.spring_scale_to(self.double_tap_zoom, self.spring);
            self.double_tap_zoom
        };
        debug!(scale, "Double tap toggled zoom");
        Some(GestureOutcome::ZoomToggled { scale })
    }

    fn pinch(
        &mut self,
        phase: Phase<f64>,
        transform: &mut TransformState,
    ) -> Option<GestureOutcome> {
        match phase {
            Phase::Begin => {
                self.pinch_active = true;
                if self.pan_active {
                    // The running pan owns the translation baseline.
                    let translation = transform.saved();
                    transform.commit();
                    transform.set_saved(Transform2D {
                        scale: transform.saved().scale,
                        ..translation
                    });
                } else {
                    transform.commit();
                }
                None
            }
            Phase::Update(factor) => {
                if self.pinch_active {
                    transform.apply(TransformDelta::Scale(factor));
                }
                None
            }
            Phase::End(factor) => {
                if !self.pinch_active {
                    return None;
                }
                self.pinch_active = false;
                transform.apply(TransformDelta::Scale(factor));

                let outcome = self.policy.on_pinch_end(transform.scale());
                match outcome {
                    // A running pan owns translation and settles it on release.
                    Dismissal::SnapBack if self.pan_active => {
                        transform.spring_scale_to(1.0, self.spring)
                    }
                    Dismissal::SnapBack => transform.spring_to(Transform2D::IDENTITY, self.spring),
                    Dismissal::Commit { scale } => {
                        let saved = transform.saved();
                        transform.set_saved(Transform2D { scale, ..saved });
                    }
                    Dismissal::Close | Dismissal::Settle { .. } => {}
                }
                debug!(?outcome, "Pinch released");
                Some(GestureOutcome::Released(outcome))
            }
        }
    }

    fn pan(
        &mut self,
        phase: Phase<(f64, f64)>,
        transform: &mut TransformState,
        ctx: &GestureContext,
    ) -> Option<GestureOutcome> {
        match phase {
            Phase::Begin => {
                self.pan_active = true;
                transform.commit_translation();
                None
            }
            Phase::Update((dx, dy)) => {
                if self.pan_active {
                    transform.apply(TransformDelta::Translate(dx, dy));
                }
                None
            }
            Phase::End((dx, dy)) => {
                if !self.pan_active {
                    return None;
                }
                self.pan_active = false;
                transform.apply(TransformDelta::Translate(dx, dy));

                let outcome = self.policy.on_pan_end(
                    dx.hypot(dy),
                    transform.scale(),
                    transform.translation(),
                    ctx.content,
                    ctx.viewport,
                );
                if let Dismissal::Settle { x, y } = outcome {
                    transform.spring_translation_to(x, y, self.spring);
                }
                debug!(?outcome, distance = dx.hypot(dy), "Pan released");
                Some(GestureOutcome::Released(outcome))
            }
        }
    }
}
