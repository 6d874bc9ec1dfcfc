//! Tap and multi-tap detection

use tactile_core::{GestureConfig, Timestamp, TouchEvent, TouchPhase};

use std::any::Any;

use super::downcast;
use crate::detector::{GestureDetector, Response};
use crate::fingers::{FingerTracker, FingerWindow};

/// Recognizes `count` consecutive taps made with exactly `fingers` fingers
///
/// A tap fails when a finger travels beyond the slop or stays down longer
/// than the tap timeout. Between taps of a multi-tap the detector reports
/// PENDING, so recognizers registered after it wait for the outcome; the
/// next tap must start within the multi-tap interval.
#[derive(Debug, Clone)]
pub struct TapDetector {
    fingers: usize,
    count: u32,
    slop: f32,
    timeout: Timestamp,
    interval: Timestamp,

    taps: u32,
    /// Most fingers down during the current tap
    tap_peak: usize,
    pressed_at: Option<Timestamp>,
    /// Latest start of the next tap
    next_tap_by: Option<Timestamp>,
}

impl TapDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            fingers: 1,
            count: 1,
            slop: config.tap_slop,
            timeout: config.tap_timeout(),
            interval: config.multi_tap_interval(),
            taps: 0,
            tap_peak: 0,
            pressed_at: None,
            next_tap_by: None,
        }
    }

    pub fn with_fingers(mut self, fingers: usize) -> Self {
        self.fingers = fingers;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// Taps completed in the current cycle
    pub fn taps(&self) -> u32 {
        self.taps
    }

    fn on_down(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        if self.taps >= self.count {
            return Response::Ignore;
        }
        if fingers.count() == 1 {
            if self.next_tap_by.is_some_and(|deadline| event.time > deadline) {
                return Response::REJECT;
            }
            self.next_tap_by = None;
            self.pressed_at = Some(event.time);
            self.tap_peak = 0;
        }
        self.tap_peak = self.tap_peak.max(fingers.count());
        Response::Continue
    }

    fn on_up(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        if self.taps >= self.count {
            return Response::Ignore;
        }
        if fingers.travel(event.id) > self.slop {
            return Response::REJECT;
        }
        if self
            .pressed_at
            .is_some_and(|pressed| event.time.saturating_sub(pressed) > self.timeout)
        {
            return Response::REJECT;
        }
        if fingers.count() > 1 {
            // The tap completes when the last finger lifts
            return Response::Continue;
        }
        if self.tap_peak < self.fingers {
            return Response::REJECT;
        }

        self.taps += 1;
        self.pressed_at = None;
        if self.taps >= self.count {
            return Response::ACCEPT;
        }
        self.next_tap_by = Some(event.time + self.interval);
        tracing::trace!("Tap {} of {}", self.taps, self.count);
        Response::PENDING
    }
}

impl GestureDetector for TapDetector {
    fn name(&self) -> &'static str {
        if self.count > 1 {
            "multi_tap"
        } else {
            "tap"
        }
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
                && other.count == self.count
                && other.slop == self.slop
                && other.timeout == self.timeout
                && other.interval == self.interval
        })
    }

    fn on_touch(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        match event.phase {
            TouchPhase::Down => self.on_down(fingers, event),
            TouchPhase::Move => {
                if fingers.travel(event.id) > self.slop {
                    Response::REJECT
                } else {
                    Response::Continue
                }
            }
            TouchPhase::Up => self.on_up(fingers, event),
            TouchPhase::Cancel => Response::REJECT,
        }
    }

    fn deadline(&self) -> Option<Timestamp> {
        match (self.pressed_at, self.next_tap_by) {
            (Some(pressed), _) => Some(pressed + self.timeout),
            (None, next) => next,
        }
    }

    fn on_deadline(&mut self, _fingers: &FingerTracker, _now: Timestamp) -> Response {
        self.pressed_at = None;
        self.next_tap_by = None;
        Response::REJECT
    }

    fn reset(&mut self) {
        self.taps = 0;
        self.tap_peak = 0;
        self.pressed_at = None;
        self.next_tap_by = None;
    }
}
