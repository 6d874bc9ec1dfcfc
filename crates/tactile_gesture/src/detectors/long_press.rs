//! Long press detection

use tactile_core::{GestureConfig, Timestamp, TouchEvent, TouchPhase};

use std::any::Any;

use super::downcast;
use crate::detector::{GestureDetector, Response};
use crate::fingers::{FingerTracker, FingerWindow};

/// Recognizes fingers held still for the long-press duration
///
/// The press is accepted when the deadline passes with every finger still
/// down and within the slop; lifting or moving before that rejects it.
#[derive(Debug, Clone)]
pub struct LongPressDetector {
    fingers: usize,
    duration: Timestamp,
    slop: f32,
    fires_at: Option<Timestamp>,
    fired: bool,
}

impl LongPressDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            fingers: 1,
            duration: config.long_press_duration(),
            slop: config.tap_slop,
            fires_at: None,
            fired: false,
        }
    }

    pub fn with_fingers(mut self, fingers: usize) -> Self {
        self.fingers = fingers;
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration = tactile_core::millis(ms);
        self
    }

    pub fn fired(&self) -> bool {
        self.fired
    }
}

impl GestureDetector for LongPressDetector {
    fn name(&self) -> &'static str {
        "long_press"
    }

    fn finger_window(&self) -> FingerWindow {
        FingerWindow::exact(self.fingers)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn same_gesture(&self, other: &dyn GestureDetector) -> bool {
        downcast::<Self>(other).is_some_and(|other| {
            other.fingers == self.fingers
                && other.duration == self.duration
                && other.slop == self.slop
        })
    }

    fn on_touch(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        match event.phase {
            TouchPhase::Down => {
                if fingers.count() == self.fingers {
                    self.fires_at = Some(event.time + self.duration);
                }
                Response::Continue
            }
            TouchPhase::Move => {
                if !self.fired && fingers.travel(event.id) > self.slop {
                    Response::REJECT
                } else {
                    Response::Continue
                }
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                if self.fired {
                    Response::Continue
                } else {
                    Response::REJECT
                }
            }
        }
    }

    fn deadline(&self) -> Option<Timestamp> {
        self.fires_at
    }

    fn on_deadline(&mut self, fingers: &FingerTracker, now: Timestamp) -> Response {
        self.fires_at = None;
        if fingers.count() < self.fingers {
            return Response::REJECT;
        }
        tracing::trace!("Long press held until {}", now);
        self.fired = true;
        Response::ACCEPT
    }

    fn reset(&mut self) {
        self.fires_at = None;
        self.fired = false;
    }
}
