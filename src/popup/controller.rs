//! Popup lifecycle: Closed -> Opening -> Open -> Closing -> Closed.
//!
//! A session is created on every open from freshly measured geometry and
//! thrown away when the close fade completes, so nothing leaks between opens.
//! The thumbnail keeps rendering underneath the whole time.

use std::time::Duration;

use async_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, trace};

use super::render::{OverlayFrame, PopupContent, PopupFrame};
use crate::animation::{Animated, AnimatedValue, AnimationId, Easing};
use crate::config::{EngineConfig, PopupConfig};
use crate::dismissal::Dismissal;
use crate::error::MeasureError;
use crate::geometry::{self, GeometryRect, ResolvedGeometry, Viewport};
use crate::gesture::{
    GestureComposer, GestureContext, GestureEvent, GestureOutcome, GestureRecognizers,
    PointerEvent,
};
use crate::transform::{Transform2D, TransformState};

/// Events kept for a host that is not draining `events()`. Older ones are
/// dropped first.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Callback run once the close animation has fully finished.
pub type DismissCallback = Box<dyn FnMut() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Closed,
    Opening,
    Open,
    Closing,
}

impl PopupState {
    pub fn accepts_gestures(self) -> bool {
        matches!(self, PopupState::Opening | PopupState::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Close button or back request.
    Requested,
    /// Pinched below the close threshold.
    PinchedAway,
    /// Dragged far at near-fit zoom.
    DraggedAway,
}

/// Lifecycle notifications for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupEvent {
    Opened {
        session: u64,
        geometry: ResolvedGeometry,
    },
    /// Open animation finished.
    Settled { session: u64 },
    Gesture {
        session: u64,
        outcome: GestureOutcome,
    },
    Closing { session: u64, reason: CloseReason },
    /// Overlay is gone; the session no longer exists.
    Dismissed { session: u64 },
}

/// State scoped to one open..dismiss cycle.
#[derive(Debug)]
struct PopupSession {
    id: u64,
    geometry: ResolvedGeometry,
    /// Grow from the thumbnail instead of fading in place.
    shared_element: bool,
    present_scale: AnimatedValue,
    present_x: AnimatedValue,
    present_y: AnimatedValue,
    opacity: AnimatedValue,
    content: TransformState,
    close_fade: Option<AnimationId>,
}

impl PopupSession {
    fn presentation(&self) -> Transform2D {
        Transform2D::new(
            self.present_scale.get(),
            self.present_x.get(),
            self.present_y.get(),
        )
    }

    fn presentation_animating(&self) -> bool {
        self.present_scale.is_animating()
            || self.present_x.is_animating()
            || self.present_y.is_animating()
            || self.opacity.is_animating()
    }

    /// Presentation and content composed, about the center of the layout box.
    fn composite(&self) -> Transform2D {
        let p = self.presentation();
        let c = self.content.current();
        Transform2D::new(
            p.scale * c.scale,
            p.translate_x + c.translate_x,
            p.translate_y + c.translate_y,
        )
    }

    fn gesture_context(&self, viewport: Viewport) -> GestureContext {
        GestureContext {
            content: self.geometry.fitted_size(),
            viewport,
        }
    }
}

pub struct PopupController {
    engine: EngineConfig,
    config: PopupConfig,
    viewport: Viewport,
    state: PopupState,
    session: Option<PopupSession>,
    next_session: u64,
    recognizers: GestureRecognizers,
    composer: GestureComposer,
    gestures_enabled: bool,
    events_tx: Sender<PopupEvent>,
    events_rx: Receiver<PopupEvent>,
    on_dismiss: Option<DismissCallback>,
}

impl std::fmt::Debug for PopupController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupController")
            .field("config", &self.config)
            .field("viewport", &self.viewport)
            .field("state", &self.state)
            .field("session", &self.session.as_ref().map(|s| s.id))
            .field("on_dismiss", &self.on_dismiss.as_ref().map(|_| "<closure>"))
            .finish()
    }
}

impl PopupController {
    pub fn new(engine: EngineConfig, config: PopupConfig, viewport: Viewport) -> Self {
        let (events_tx, events_rx) = async_channel::bounded(EVENT_QUEUE_CAPACITY);
        Self {
            recognizers: GestureRecognizers::new(&engine),
            composer: GestureComposer::new(&engine),
            engine,
            config,
            viewport,
            state: PopupState::Closed,
            session: None,
            next_session: 1,
            gestures_enabled: true,
            events_tx,
            events_rx,
            on_dismiss: None,
        }
    }

    /// Disable pinch/pan/double-tap, e.g. for media that handles its own input.
    pub fn with_gestures(mut self, enabled: bool) -> Self {
        self.gestures_enabled = enabled;
        self
    }

    /// Run `callback` each time a close animation completes.
    pub fn on_dismiss<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_dismiss = Some(Box::new(callback));
    }

    /// Lifecycle event stream. Every receiver clone sees each event once in
    /// total (it is a shared queue, not a broadcast). At most
    /// [`EVENT_QUEUE_CAPACITY`] undrained events are kept.
    pub fn events(&self) -> Receiver<PopupEvent> {
        self.events_rx.clone()
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.session.is_some()
    }

    pub fn config(&self) -> PopupConfig {
        self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Viewport changes apply from the next open.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn source_rect(&self) -> Option<GeometryRect> {
        self.session.as_ref().map(|s| s.geometry.source_rect)
    }

    pub fn target_rect(&self) -> Option<GeometryRect> {
        self.session.as_ref().map(|s| s.geometry.target_rect)
    }

    /// Current content (gesture) transform.
    pub fn content_transform(&self) -> Option<Transform2D> {
        self.session.as_ref().map(|s| s.content.current())
    }

    /// Current presentation (open/close) transform.
    pub fn presentation_transform(&self) -> Option<Transform2D> {
        self.session.as_ref().map(|s| s.presentation())
    }

    pub fn backdrop_opacity(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.opacity.get())
    }

    fn emit(&self, event: PopupEvent) {
        match self.events_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                // Nobody is draining; make room by dropping the oldest.
                let dropped = self.events_rx.try_recv().ok();
                trace!(?dropped, "Popup event queue full");
                if let Err(e) = self.events_tx.try_send(event) {
                    trace!(error = %e, "Dropping popup event");
                }
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Open from the thumbnail measured at activation time.
    ///
    /// Returns false when a session is already running; an open request that
    /// arrives while closing is dropped rather than queued.
    pub fn open(&mut self, measured: Result<GeometryRect, MeasureError>) -> bool {
        if self.state != PopupState::Closed {
            debug!(state = ?self.state, "Ignoring open request");
            return false;
        }

        let geometry = if self.config.animate_to_center {
            geometry::resolve(measured, self.viewport, self.engine.fit_factor)
        } else {
            ResolvedGeometry::fullscreen(self.viewport)
        };
        let shared_element = self.config.animate_to_center && geometry.shared_element;

        let id = self.next_session;
        self.next_session += 1;

        let mut session = PopupSession {
            id,
            geometry,
            shared_element,
            present_scale: AnimatedValue::new(1.0),
            present_x: AnimatedValue::new(0.0),
            present_y: AnimatedValue::new(0.0),
            opacity: AnimatedValue::new(0.0),
            content: TransformState::new(self.engine.min_zoom, self.engine.max_zoom),
            close_fade: None,
        };

        session
            .opacity
            .timing_to(1.0, self.engine.open_fade, Easing::EaseInOut);
        if shared_element {
            let spring = self.engine.spring;
            let (dx, dy) = geometry.center_offset;
            session.present_scale.spring_to(geometry.optimal_scale, spring);
            session.present_x.spring_to(dx, spring);
            session.present_y.spring_to(dy, spring);
        }

        self.recognizers.reset();
        self.composer.reset();
        self.session = Some(session);
        self.state = PopupState::Opening;

        debug!(
            session = id,
            shared_element,
            source = ?geometry.source_rect,
            "Popup opening"
        );
        self.emit(PopupEvent::Opened {
            session: id,
            geometry,
        });
        true
    }

    /// Start the close choreography. Returns false unless opening or open.
    pub fn close(&mut self) -> bool {
        self.begin_close(CloseReason::Requested)
    }

    fn begin_close(&mut self, reason: CloseReason) -> bool {
        if !self.state.accepts_gestures() {
            trace!(state = ?self.state, ?reason, "Ignoring close request");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let spring = self.engine.spring;
        if session.shared_element {
            session.present_scale.spring_to(1.0, spring);
            session.present_x.spring_to(0.0, spring);
            session.present_y.spring_to(0.0, spring);
            session.content.spring_to(Transform2D::IDENTITY, spring);
        }
        session.close_fade =
            Some(
                session
                    .opacity
                    .timing_to(0.0, self.engine.close_fade, Easing::EaseInOut),
            );
        let id = session.id;

        self.recognizers.reset();
        self.composer.reset();
        self.state = PopupState::Closing;

        debug!(session = id, ?reason, "Popup closing");
        self.emit(PopupEvent::Closing {
            session: id,
            reason,
        });
        true
    }

    fn finish_close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.state = PopupState::Closed;
        debug!(session = session.id, "Popup dismissed");
        self.emit(PopupEvent::Dismissed {
            session: session.id,
        });
        if let Some(callback) = self.on_dismiss.as_mut() {
            callback();
        }
    }

    /// Feed a raw pointer event through the recognizers.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<GestureOutcome> {
        if !self.gestures_enabled || !self.state.accepts_gestures() {
            return Vec::new();
        }
        self.recognizers
            .handle(event)
            .into_iter()
            .filter_map(|gesture| self.handle_gesture(gesture))
            .collect()
    }

    /// Feed an already recognized gesture phase.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> Option<GestureOutcome> {
        if !self.gestures_enabled || !self.state.accepts_gestures() {
            return None;
        }
        let session = self.session.as_mut()?;
        let ctx = session.gesture_context(self.viewport);
        let outcome = self.composer.handle(event, &mut session.content, &ctx)?;
        let id = session.id;

        self.emit(PopupEvent::Gesture {
            session: id,
            outcome,
        });
        if let GestureOutcome::Released(Dismissal::Close) = outcome {
            let reason = match event {
                GestureEvent::Pan(_) => CloseReason::DraggedAway,
                _ => CloseReason::PinchedAway,
            };
            self.begin_close(reason);
        }
        Some(outcome)
    }

    /// Compose this frame for the host.
    pub fn render<C: PopupContent>(&self, content: &C) -> PopupFrame<C::Node> {
        let overlay = self.session.as_ref().map(|session| {
            let layout = session.geometry.source_rect;
            let transform = session.composite();
            let on_screen = layout
                .scaled_about_center(transform.scale)
                .translated(transform.translate_x, transform.translate_y);
            OverlayFrame {
                node: content.render_expanded(layout.size()),
                layout,
                transform,
                on_screen,
                backdrop_opacity: session.opacity.get(),
                show_close_affordance: self.config.show_close_affordance,
            }
        });
        PopupFrame {
            collapsed: content.render_collapsed(),
            overlay,
        }
    }

    /// Advance every animation by `dt` and run lifecycle transitions that
    /// depend on them. Returns true while anything is still moving.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        session.present_scale.tick(dt);
        session.present_x.tick(dt);
        session.present_y.tick(dt);
        let finished = session.opacity.tick(dt);
        let content_moving = session.content.tick(dt);
        let presenting = session.presentation_animating();
        let id = session.id;

        match self.state {
            PopupState::Opening if !presenting => {
                self.state = PopupState::Open;
                debug!(session = id, "Popup open");
                self.emit(PopupEvent::Settled { session: id });
            }
            PopupState::Closing => {
                let close_fade = self.session.as_ref().and_then(|s| s.close_fade);
                if finished.is_some() && finished == close_fade {
                    self.finish_close();
                    return false;
                }
            }
            _ => {}
        }

        presenting || content_moving
    }
}

impl Animated for PopupController {
    fn tick(&mut self, dt: Duration) -> bool {
        PopupController::tick(self, dt)
    }
}
