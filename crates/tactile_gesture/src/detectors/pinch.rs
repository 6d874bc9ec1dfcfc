//! Pinch (two or more finger zoom) detection

use tactile_core::{AxisAction, AxisEvent, GestureConfig, TouchEvent, TouchPhase};

use std::any::Any;

use super::downcast;
use crate::detector::{GestureDetector, Response};
use crate::fingers::{FingerTracker, FingerWindow};

/// Scale change of an axis pinch stream that counts as a pinch
const AXIS_SCALE_SLOP: f32 = 0.05;

/// Recognizes the spread of the fingers changing by at least the pinch
/// distance, or an axis stream whose pinch scale drifts from 1.0
#[derive(Debug, Clone)]
pub struct PinchDetector {
    fingers: usize,
    distance: f32,
    /// Spread when the last required finger went down
    base_spread: Option<f32>,
    /// Accumulated scale of an axis stream
    axis_scale: f32,
    started: bool,
}

impl PinchDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            fingers: 2,
            distance: config.pinch_distance,
            base_spread: None,
            axis_scale: 1.0,
            started: false,
        }
    }

    pub fn with_fingers(mut self, fingers: usize) -> Self {
        self.fingers = fingers.max(2);
        self
    }

    /// Current scale relative to the starting spread
    pub fn scale(&self, fingers: &FingerTracker) -> f32 {
        match self.base_spread {
            Some(base) if base > 0.0 => fingers.spread() / base,
            _ => self.axis_scale,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }
}

impl GestureDetector for PinchDetector {
    fn name(&self) -> &'static str {
        "pinch"
    }

    fn finger_window(&self) -> FingerWindow {
        // Axis pinch streams arrive as a single pointer
        FingerWindow::new(1, self.fingers)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn same_gesture(&self, other: &dyn GestureDetector) -> bool {
        downcast::<Self>(other)
            .is_some_and(|other| other.fingers == self.fingers && other.distance == self.distance)
    }

    fn on_touch(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        match event.phase {
            TouchPhase::Down => {
                if fingers.count() == self.fingers {
                    self.base_spread = Some(fingers.spread());
                }
                Response::Continue
            }
            TouchPhase::Move => {
                let Some(base) = self.base_spread else {
                    return Response::Continue;
                };
                if !self.started && (fingers.spread() - base).abs() >= self.distance {
                    self.started = true;
                    return Response::ACCEPT;
                }
                Response::Continue
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                if self.started {
                    Response::Continue
                } else {
                    Response::REJECT
                }
            }
        }
    }

    fn on_axis(&mut self, _fingers: &FingerTracker, event: &AxisEvent) -> Response {
        match event.action {
            AxisAction::Begin => Response::Continue,
            AxisAction::Update => {
                self.axis_scale *= event.pinch_scale;
                if !self.started && (self.axis_scale - 1.0).abs() >= AXIS_SCALE_SLOP {
                    self.started = true;
                    return Response::ACCEPT;
                }
                Response::Continue
            }
            AxisAction::End | AxisAction::Cancel => {
                if self.started {
                    Response::Continue
                } else {
                    Response::REJECT
                }
            }
        }
    }

    fn reset(&mut self) {
        self.base_spread = None;
        self.axis_scale = 1.0;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::feed;
    use tactile_core::millis;

    #[test]
    fn test_spread_change_pinches() {
        let mut pinch = PinchDetector::new(&GestureConfig::default());
        let mut fingers = FingerTracker::new(pinch.finger_window(), 0.3);
        feed(&mut pinch, &mut fingers, TouchEvent::down(1, 0.0, 0.0, 0));
        feed(&mut pinch, &mut fingers, TouchEvent::down(2, 100.0, 0.0, millis(5)));
        assert_eq!(
            feed(&mut pinch, &mut fingers, TouchEvent::moved(2, 104.0, 0.0, millis(10))),
            Response::Continue
        );
        assert_eq!(
            feed(&mut pinch, &mut fingers, TouchEvent::moved(2, 120.0, 0.0, millis(20))),
            Response::ACCEPT
        );
        assert!((pinch.scale(&fingers) - 1.2).abs() < 0.001);
    }

    #[test]
    fn test_single_finger_never_pinches() {
        let mut pinch = PinchDetector::new(&GestureConfig::default());
        let mut fingers = FingerTracker::new(pinch.finger_window(), 0.3);
        feed(&mut pinch, &mut fingers, TouchEvent::down(1, 0.0, 0.0, 0));
        assert_eq!(
            feed(&mut pinch, &mut fingers, TouchEvent::moved(1, 50.0, 0.0, millis(10))),
            Response::Continue
        );
        assert_eq!(
            feed(&mut pinch, &mut fingers, TouchEvent::up(1, 50.0, 0.0, millis(20))),
            Response::REJECT
        );
    }

    #[test]
    fn test_axis_pinch() {
        let mut pinch = PinchDetector::new(&GestureConfig::default());
        let fingers = FingerTracker::new(pinch.finger_window(), 0.3);
        let zoom = AxisEvent::new(3, AxisAction::Update, 0.0, 0.0, millis(10)).with_pinch_scale(1.03);
        assert_eq!(pinch.on_axis(&fingers, &zoom), Response::Continue);
        assert_eq!(pinch.on_axis(&fingers, &zoom), Response::ACCEPT);
    }
}
