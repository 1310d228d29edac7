//! Pointer-level gesture recognizers.
//!
//! Each recognizer is an independent state machine fed the same pointer
//! stream. `GestureRecognizers` keeps the set of active pointers and fans every
//! event out to all three.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::trace;

use super::{GestureEvent, Phase};
use crate::config::{EngineConfig, TapConfig};

/// Span change (px) before a two-finger contact counts as a pinch.
const PINCH_SLOP: f64 = 2.0;

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform took the touch away; ends the whole interaction.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(id: PointerId, phase: PointerPhase, x: f64, y: f64, time: Instant) -> Self {
        Self {
            id,
            phase,
            position: Point::new(x, y),
            time,
        }
    }
}

/// Active pointers keyed by id. Ordered so centroids are deterministic.
type Pointers = BTreeMap<PointerId, Point>;

fn centroid<'a>(points: impl Iterator<Item = &'a Point>) -> Option<Point> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    (n > 0).then(|| Point::new(sx / n as f64, sy / n as f64))
}

#[derive(Debug, Clone, Copy)]
struct Press {
    id: PointerId,
    start: Point,
    down_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Tap {
    at: Point,
    up_at: Instant,
}

/// Two quick taps close together.
#[derive(Debug)]
pub struct DoubleTapRecognizer {
    config: TapConfig,
    press: Option<Press>,
    last_tap: Option<Tap>,
}

impl DoubleTapRecognizer {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            press: None,
            last_tap: None,
        }
    }

    pub fn reset(&mut self) {
        self.press = None;
        self.last_tap = None;
    }

    fn handle(&mut self, event: &PointerEvent, pointers: &Pointers) -> Option<GestureEvent> {
        match event.phase {
            PointerPhase::Down => {
                if pointers.len() > 1 {
                    // Multi-touch is never a tap.
                    self.reset();
                    return None;
                }
                if let Some(tap) = self.last_tap {
                    if event.time.saturating_duration_since(tap.up_at) > self.config.max_gap {
                        self.last_tap = None;
                    }
                }
                self.press = Some(Press {
                    id: event.id,
                    start: event.position,
                    down_at: event.time,
                });
                None
            }
            PointerPhase::Move => {
                if let Some(press) = self.press {
                    if press.id == event.id
                        && press.start.distance(event.position) > self.config.slop
                    {
                        self.reset();
                    }
                }
                None
            }
            PointerPhase::Up => {
                let press = self.press.take()?;
                if press.id != event.id
                    || event.time.saturating_duration_since(press.down_at) > self.config.max_press
                    || press.start.distance(event.position) > self.config.slop
                {
                    self.last_tap = None;
                    return None;
                }

                let tap = Tap {
                    at: event.position,
                    up_at: event.time,
                };
                match self.last_tap.take() {
                    Some(first)
                        if press.down_at.saturating_duration_since(first.up_at)
                            <= self.config.max_gap
                            && first.at.distance(tap.at) <= self.config.double_tap_slop =>
                    {
                        trace!(x = tap.at.x, y = tap.at.y, "Double tap recognized");
                        Some(GestureEvent::DoubleTap {
                            x: tap.at.x,
                            y: tap.at.y,
                        })
                    }
                    _ => {
                        self.last_tap = Some(tap);
                        None
                    }
                }
            }
            PointerPhase::Cancel => {
                self.reset();
                None
            }
        }
    }
}

/// Two-finger span change.
#[derive(Debug, Default)]
pub struct PinchRecognizer {
    pair: Option<(PointerId, PointerId)>,
    initial_span: f64,
    factor: f64,
    active: bool,
}

impl PinchRecognizer {
    fn span(&self, pointers: &Pointers) -> Option<f64> {
        let (a, b) = self.pair?;
        Some(pointers.get(&a)?.distance(*pointers.get(&b)?))
    }

    fn finish(&mut self, out: &mut Vec<GestureEvent>) {
        if self.active {
            out.push(GestureEvent::Pinch(Phase::End(self.factor)));
        }
        self.pair = None;
        self.active = false;
        self.factor = 1.0;
    }

    fn handle(&mut self, event: &PointerEvent, pointers: &Pointers, out: &mut Vec<GestureEvent>) {
        match event.phase {
            PointerPhase::Down => {
                if self.pair.is_none() && pointers.len() >= 2 {
                    let mut ids = pointers.keys().copied();
                    if let (Some(a), Some(b)) = (ids.next(), ids.next()) {
                        self.pair = Some((a, b));
                        self.initial_span = self.span(pointers).unwrap_or(0.0);
                        self.factor = 1.0;
                    }
                }
            }
            PointerPhase::Move => {
                let Some(span) = self.span(pointers) else {
                    return;
                };
                if self.initial_span < 1.0 {
                    return;
                }
                if !self.active {
                    if (span - self.initial_span).abs() <= PINCH_SLOP {
                        return;
                    }
                    self.active = true;
                    out.push(GestureEvent::Pinch(Phase::Begin));
                }
                self.factor = span / self.initial_span;
                out.push(GestureEvent::Pinch(Phase::Update(self.factor)));
            }
            PointerPhase::Up => {
                if let Some((a, b)) = self.pair {
                    if event.id == a || event.id == b {
                        self.finish(out);
                    }
                }
            }
            PointerPhase::Cancel => self.finish(out),
        }
    }
}

/// Centroid drag with any number of pointers.
#[derive(Debug)]
pub struct PanRecognizer {
    slop: f64,
    anchor: Option<Point>,
    carried: (f64, f64),
    translation: (f64, f64),
    active: bool,
}

impl PanRecognizer {
    pub fn new(slop: f64) -> Self {
        Self {
            slop,
            anchor: None,
            carried: (0.0, 0.0),
            translation: (0.0, 0.0),
            active: false,
        }
    }

    fn track(&mut self, pointers: &Pointers, out: &mut Vec<GestureEvent>) {
        let (Some(anchor), Some(c)) = (self.anchor, centroid(pointers.values())) else {
            return;
        };
        self.translation = (
            self.carried.0 + c.x - anchor.x,
            self.carried.1 + c.y - anchor.y,
        );
        if !self.active {
            if self.translation.0.hypot(self.translation.1) <= self.slop {
                return;
            }
            self.active = true;
            out.push(GestureEvent::Pan(Phase::Begin));
        }
        out.push(GestureEvent::Pan(Phase::Update(self.translation)));
    }

    // Keep translation continuous when the pointer set changes.
    fn rebase(&mut self, anchor: Option<Point>) {
        self.carried = self.translation;
        self.anchor = anchor;
    }

    fn finish(&mut self, out: &mut Vec<GestureEvent>) {
        if self.active {
            out.push(GestureEvent::Pan(Phase::End(self.translation)));
        }
        self.anchor = None;
        self.carried = (0.0, 0.0);
        self.translation = (0.0, 0.0);
        self.active = false;
    }

    fn handle(&mut self, event: &PointerEvent, pointers: &Pointers, out: &mut Vec<GestureEvent>) {
        match event.phase {
            PointerPhase::Down => {
                if pointers.len() == 1 {
                    self.finish(out);
                    self.anchor = centroid(pointers.values());
                } else {
                    self.rebase(centroid(pointers.values()));
                }
            }
            PointerPhase::Move => self.track(pointers, out),
            PointerPhase::Up => {
                self.track(pointers, out);
                let remaining = centroid(
                    pointers
                        .iter()
                        .filter(|(id, _)| **id != event.id)
                        .map(|(_, p)| p),
                );
                match remaining {
                    Some(anchor) => self.rebase(Some(anchor)),
                    None => self.finish(out),
                }
            }
            PointerPhase::Cancel => self.finish(out),
        }
    }
}

/// All recognizers plus the shared pointer set.
#[derive(Debug)]
pub struct GestureRecognizers {
    pointers: Pointers,
    double_tap: DoubleTapRecognizer,
    pinch: PinchRecognizer,
    pan: PanRecognizer,
}

impl GestureRecognizers {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pointers: Pointers::new(),
            double_tap: DoubleTapRecognizer::new(config.tap),
            pinch: PinchRecognizer::default(),
            pan: PanRecognizer::new(config.pan_slop),
        }
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// Feed one pointer event; returns the gesture phases it produced, in
    /// order: double-tap, pinch, then pan.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<GestureEvent> {
        match event.phase {
            PointerPhase::Down | PointerPhase::Move | PointerPhase::Up => {
                self.pointers.insert(event.id, event.position);
            }
            PointerPhase::Cancel => {}
        }

        let mut out = Vec::new();
        if let Some(tap) = self.double_tap.handle(&event, &self.pointers) {
            out.push(tap);
        }
        self.pinch.handle(&event, &self.pointers, &mut out);
        self.pan.handle(&event, &self.pointers, &mut out);

        match event.phase {
            PointerPhase::Up => {
                self.pointers.remove(&event.id);
            }
            PointerPhase::Cancel => self.pointers.clear(),
            _ => {}
        }
        out
    }

    /// Drop all in-flight state without emitting anything.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.double_tap.reset();
        self.pinch = PinchRecognizer::default();
        self.pan = PanRecognizer::new(self.pan.slop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Script {
        recognizers: GestureRecognizers,
        t0: Instant,
    }

    impl Script {
        fn new() -> Self {
            Self {
                recognizers: GestureRecognizers::new(&EngineConfig::default()),
                t0: Instant::now(),
            }
        }

        fn send(
            &mut self,
            id: PointerId,
            phase: PointerPhase,
            x: f64,
            y: f64,
            ms: u64,
        ) -> Vec<GestureEvent> {
            let time = self.t0 + Duration::from_millis(ms);
            self.recognizers
                .handle(PointerEvent::new(id, phase, x, y, time))
        }

        fn tap(&mut self, x: f64, y: f64, ms: u64) -> Vec<GestureEvent> {
            self.send(1, PointerPhase::Down, x, y, ms);
            self.send(1, PointerPhase::Up, x, y, ms + 60)
        }
    }

    #[test]
    fn test_double_tap_recognized() {
        let mut s = Script::new();
        assert!(s.tap(100.0, 100.0, 0).is_empty());
        let events = s.tap(104.0, 98.0, 200);
        assert_eq!(events, vec![GestureEvent::DoubleTap { x: 104.0, y: 98.0 }]);
        // A third tap starts over.
        assert!(s.tap(104.0, 98.0, 400).is_empty());
    }

    #[test]
    fn test_slow_second_tap_is_single() {
        let mut s = Script::new();
        s.tap(100.0, 100.0, 0);
        assert!(s.tap(100.0, 100.0, 500).is_empty());
    }

    #[test]
    fn test_distant_second_tap_is_single() {
        let mut s = Script::new();
        s.tap(100.0, 100.0, 0);
        assert!(s.tap(200.0, 100.0, 150).is_empty());
    }

    #[test]
    fn test_long_press_is_not_tap() {
        let mut s = Script::new();
        s.tap(100.0, 100.0, 0);
        s.send(1, PointerPhase::Down, 100.0, 100.0, 150);
        assert!(s.send(1, PointerPhase::Up, 100.0, 100.0, 600).is_empty());
    }

    #[test]
    fn test_pan_begins_after_slop() {
        let mut s = Script::new();
        s.send(1, PointerPhase::Down, 100.0, 100.0, 0);
        assert!(s.send(1, PointerPhase::Move, 105.0, 100.0, 16).is_empty());
        let events = s.send(1, PointerPhase::Move, 130.0, 140.0, 32);
        assert_eq!(
            events,
            vec![
                GestureEvent::Pan(Phase::Begin),
                GestureEvent::Pan(Phase::Update((30.0, 40.0))),
            ]
        );
        let events = s.send(1, PointerPhase::Up, 130.0, 140.0, 48);
        assert_eq!(
            events,
            vec![
                GestureEvent::Pan(Phase::Update((30.0, 40.0))),
                GestureEvent::Pan(Phase::End((30.0, 40.0))),
            ]
        );
    }

    #[test]
    fn test_pinch_factor_from_span() {
        let mut s = Script::new();
        s.send(1, PointerPhase::Down, 100.0, 300.0, 0);
        s.send(2, PointerPhase::Down, 200.0, 300.0, 5);
        let events = s.send(2, PointerPhase::Move, 250.0, 300.0, 16);
        let events2 = s.send(1, PointerPhase::Move, 50.0, 300.0, 20);
        assert_eq!(events[0], GestureEvent::Pinch(Phase::Begin));
        assert_eq!(events[1], GestureEvent::Pinch(Phase::Update(1.5)));
        assert!(events2.contains(&GestureEvent::Pinch(Phase::Update(2.0))));

        let end = s.send(2, PointerPhase::Up, 250.0, 300.0, 40);
        assert!(end.contains(&GestureEvent::Pinch(Phase::End(2.0))));
    }

    #[test]
    fn test_pan_continuous_across_pointer_change() {
        let mut s = Script::new();
        s.send(1, PointerPhase::Down, 0.0, 0.0, 0);
        s.send(1, PointerPhase::Move, 50.0, 0.0, 16);
        // Second finger lands: centroid jumps, translation must not.
        let events = s.send(2, PointerPhase::Down, 150.0, 0.0, 20);
        assert!(events.is_empty());
        let events = s.send(1, PointerPhase::Move, 60.0, 0.0, 32);
        assert_eq!(
            events.last(),
            Some(&GestureEvent::Pan(Phase::Update((55.0, 0.0))))
        );
    }

    #[test]
    fn test_cancel_ends_active_gestures() {
        let mut s = Script::new();
        s.send(1, PointerPhase::Down, 0.0, 0.0, 0);
        s.send(1, PointerPhase::Move, 40.0, 0.0, 16);
        let events = s.send(1, PointerPhase::Cancel, 40.0, 0.0, 20);
        assert_eq!(events, vec![GestureEvent::Pan(Phase::End((40.0, 0.0)))]);
        assert_eq!(s.recognizers.active_pointers(), 0);
    }
}
