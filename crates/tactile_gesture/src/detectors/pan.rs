//! Pan (drag) detection

use serde::{Deserialize, Serialize};
use tactile_core::{AxisAction, AxisEvent, GestureConfig, Point, TouchEvent, TouchPhase};

use std::any::Any;

use super::downcast;
use crate::detector::{GestureDetector, Response};
use crate::fingers::{FingerTracker, FingerWindow};

/// Directions a pan may move in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    #[default]
    All,
    Horizontal,
    Vertical,
}

impl PanDirection {
    /// Travel along the allowed direction and across it
    fn split(self, offset: Point) -> (f32, f32) {
        match self {
            PanDirection::All => (offset.length(), 0.0),
            PanDirection::Horizontal => (offset.x.abs(), offset.y.abs()),
            PanDirection::Vertical => (offset.y.abs(), offset.x.abs()),
        }
    }
}

/// Recognizes the finger centroid (or a scroll stream) travelling at least
/// the pan distance in an allowed direction
#[derive(Debug, Clone)]
pub struct PanDetector {
    window: FingerWindow,
    direction: PanDirection,
    distance: f32,
    /// Accumulated scroll of an axis stream
    scrolled: Point,
    started: bool,
}

impl PanDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            window: FingerWindow::single(),
            direction: PanDirection::All,
            distance: config.pan_distance,
            scrolled: Point::ZERO,
            started: false,
        }
    }

    pub fn with_direction(mut self, direction: PanDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_fingers(mut self, min: usize, max: usize) -> Self {
        self.window = FingerWindow::new(min, max);
        self
    }

    pub fn started(&self) -> bool {
        self.started
    }

    fn judge(&mut self, offset: Point) -> Response {
        if self.started {
            return Response::Continue;
        }
        let (along, across) = self.direction.split(offset);
        if along >= self.distance && along >= across {
            self.started = true;
            return Response::ACCEPT;
        }
        if across >= self.distance {
            // Moving the wrong way
            return Response::REJECT;
        }
        Response::Continue
    }
}

impl GestureDetector for PanDetector {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn finger_window(&self) -> FingerWindow {
        self.window
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn same_gesture(&self, other: &dyn GestureDetector) -> bool {
        downcast::<Self>(other).is_some_and(|other| {
            other.window == self.window
                && other.direction == self.direction
                && other.distance == self.distance
        })
    }

    fn on_touch(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response {
        match event.phase {
            TouchPhase::Down => Response::Continue,
            TouchPhase::Move => {
                if fingers.count() < self.window.min {
                    return Response::Continue;
                }
                self.judge(fingers.centroid_offset())
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                if self.started || fingers.count() > 1 {
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
                self.scrolled = self.scrolled + event.delta();
                self.judge(self.scrolled)
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
        self.scrolled = Point::ZERO;
        self.started = false;
    }
}
