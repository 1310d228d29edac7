use std::time::Duration;

use async_channel::Receiver;

use crate::animation::Animated;
use crate::config::{EngineConfig, PopupConfig};
use crate::error::MeasureError;
use crate::geometry::{GeometryRect, Viewport};
use crate::gesture::{GestureOutcome, PointerEvent};
use crate::popup::{PopupContent, PopupController, PopupEvent, PopupFrame};

/// An image bubble: thumbnail inline, pinch/pan/double-tap in the popup.
#[derive(Debug)]
pub struct ImageMessage<C> {
    content: C,
    popup: PopupController,
}

impl<C: PopupContent> ImageMessage<C> {
    pub fn new(content: C, engine: EngineConfig, config: PopupConfig, viewport: Viewport) -> Self {
        Self {
            content,
            popup: PopupController::new(engine, config, viewport).with_gestures(true),
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn popup_mut(&mut self) -> &mut PopupController {
        &mut self.popup
    }

    pub fn events(&self) -> Receiver<PopupEvent> {
        self.popup.events()
    }

    /// Thumbnail pressed.
    pub fn open(&mut self, measured: Result<GeometryRect, MeasureError>) -> bool {
        self.popup.open(measured)
    }

    pub fn close(&mut self) -> bool {
        self.popup.close()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<GestureOutcome> {
        self.popup.handle_pointer(event)
    }

    pub fn render(&self) -> PopupFrame<C::Node> {
        self.popup.render(&self.content)
    }

    pub fn tick(&mut self, dt: Duration) -> bool {
        self.popup.tick(dt)
    }
}

impl<C: PopupContent> Animated for ImageMessage<C> {
    fn tick(&mut self, dt: Duration) -> bool {
        ImageMessage::tick(self, dt)
    }
}
