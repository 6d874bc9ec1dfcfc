//! Input events
//!
//! Touch and axis events as delivered by the platform layer. Positions are in
//! logical pixels and timestamps are monotonic device time in microseconds.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier of one finger (or axis stream) for its whole contact lifecycle
pub type TouchId = u32;

/// Device timestamp in microseconds
pub type Timestamp = u64;

/// Touch identifiers carried by disposals and notices
pub type TouchIds = SmallVec<[TouchId; 4]>;

/// Convert milliseconds to a [`Timestamp`] offset, saturating at the end of time
pub const fn millis(ms: u64) -> Timestamp {
    ms.saturating_mul(1_000)
}

/// Convert milliseconds to a [`Timestamp`], or None if it does not fit
pub const fn checked_millis(ms: u64) -> Option<Timestamp> {
    ms.checked_mul(1_000)
}

/// A position in logical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length when treated as a vector
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Distance to another point
    pub fn distance(&self, other: Point) -> f32 {
        (*self - other).length()
    }

    /// Scale both components
    pub fn scale(&self, factor: f32) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Touch phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    /// Finger touched the surface
    Down,
    /// Finger moved while in contact
    Move,
    /// Finger lifted
    Up,
    /// Contact aborted by the system
    Cancel,
}

impl TouchPhase {
    /// Whether this phase ends the contact
    pub const fn is_end(self) -> bool {
        matches!(self, TouchPhase::Up | TouchPhase::Cancel)
    }
}

/// A single touch point update
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Finger identifier
    pub id: TouchId,
    /// Position in logical pixels
    pub position: Point,
    /// Touch phase
    pub phase: TouchPhase,
    /// Device timestamp (microseconds)
    pub time: Timestamp,
    /// Touch pressure (0.0 - 1.0)
    pub pressure: f32,
}

impl TouchEvent {
    pub fn new(id: TouchId, phase: TouchPhase, x: f32, y: f32, time: Timestamp) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            phase,
            time,
            pressure: 1.0,
        }
    }

    pub fn down(id: TouchId, x: f32, y: f32, time: Timestamp) -> Self {
        Self::new(id, TouchPhase::Down, x, y, time)
    }

    pub fn moved(id: TouchId, x: f32, y: f32, time: Timestamp) -> Self {
        Self::new(id, TouchPhase::Move, x, y, time)
    }

    pub fn up(id: TouchId, x: f32, y: f32, time: Timestamp) -> Self {
        Self::new(id, TouchPhase::Up, x, y, time)
    }

    pub fn cancel(id: TouchId, time: Timestamp) -> Self {
        Self::new(id, TouchPhase::Cancel, 0.0, 0.0, time)
    }

    /// Create a touch with pressure
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    /// Same point with a different phase
    pub fn with_phase(mut self, phase: TouchPhase) -> Self {
        self.phase = phase;
        self
    }
}

/// Axis action, the continuous-input analogue of [`TouchPhase`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisAction {
    Begin,
    Update,
    End,
    Cancel,
}

impl AxisAction {
    /// Phase used for finger tracking
    pub const fn touch_phase(self) -> TouchPhase {
        match self {
            AxisAction::Begin => TouchPhase::Down,
            AxisAction::Update => TouchPhase::Move,
            AxisAction::End => TouchPhase::Up,
            AxisAction::Cancel => TouchPhase::Cancel,
        }
    }
}

/// Continuous input such as a mouse wheel, touchpad scroll or pen axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisEvent {
    /// Axis stream identifier (shares the touch identifier space)
    pub id: TouchId,
    /// Pointer position in logical pixels
    pub position: Point,
    /// Horizontal scroll delta
    pub horizontal: f32,
    /// Vertical scroll delta
    pub vertical: f32,
    /// Pinch scale relative to the previous update (1.0 = none)
    pub pinch_scale: f32,
    pub action: AxisAction,
    /// Device timestamp (microseconds)
    pub time: Timestamp,
}

impl AxisEvent {
    pub fn new(id: TouchId, action: AxisAction, x: f32, y: f32, time: Timestamp) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            horizontal: 0.0,
            vertical: 0.0,
            pinch_scale: 1.0,
            action,
            time,
        }
    }

    pub fn with_scroll(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn with_pinch_scale(mut self, scale: f32) -> Self {
        self.pinch_scale = scale;
        self
    }

    /// Scroll delta as a vector
    pub fn delta(&self) -> Point {
        Point::new(self.horizontal, self.vertical)
    }

    /// Touch view of this event, used for finger tracking
    pub fn as_touch(&self) -> TouchEvent {
        TouchEvent {
            id: self.id,
            position: self.position,
            phase: self.action.touch_phase(),
            time: self.time,
            pressure: 1.0,
        }
    }
}
