//! Leaf gesture detectors
//!
//! A [`GestureDetector`] holds the matching logic of one concrete gesture
//! (tap, long press, pan, ...). It never arbitrates: it answers each event
//! with a [`Response`] and the surface turns requested disposals into
//! arbitration through the recognizer's group or the referee.

use std::any::Any;
use std::fmt;

use tactile_core::{AxisEvent, GestureDisposal, Timestamp, TouchEvent, TouchId};

use crate::fingers::{FingerTracker, FingerWindow};

/// Answer of a detector to one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Not interested in this event or identifier
    Ignore,
    /// Consumed, still detecting
    Continue,
    /// Request an arbitration decision about this detector
    Dispose(GestureDisposal),
}

impl Response {
    pub const ACCEPT: Response = Response::Dispose(GestureDisposal::Accept);
    pub const REJECT: Response = Response::Dispose(GestureDisposal::Reject);
    pub const PENDING: Response = Response::Dispose(GestureDisposal::Pending);
}

/// Matching logic of a concrete gesture type
///
/// Finger bookkeeping happens before the detector sees an event: on DOWN the
/// finger is already in `fingers`, on UP/CANCEL it is released right after.
pub trait GestureDetector: fmt::Debug {
    /// Short name used in logs and scenario reports
    fn name(&self) -> &'static str;

    /// Allowed number of simultaneous fingers
    fn finger_window(&self) -> FingerWindow {
        FingerWindow::single()
    }

    fn on_touch(&mut self, fingers: &FingerTracker, event: &TouchEvent) -> Response;

    fn on_axis(&mut self, _fingers: &FingerTracker, _event: &AxisEvent) -> Response {
        Response::Ignore
    }

    /// Next time this detector wants to be re-evaluated without input
    fn deadline(&self) -> Option<Timestamp> {
        None
    }

    /// Called once `deadline` has passed
    fn on_deadline(&mut self, _fingers: &FingerTracker, _now: Timestamp) -> Response {
        Response::Continue
    }

    fn on_accepted(&mut self, _touch_id: TouchId) {}

    fn on_rejected(&mut self, _touch_id: TouchId) {}

    fn on_pending(&mut self, _touch_id: TouchId) {}

    fn on_flush_begin(&mut self) {}

    fn on_flush_end(&mut self) {}

    /// Forget all matching progress
    fn reset(&mut self);

    /// Concrete detector, for [`same_gesture`](Self::same_gesture) checks
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }

    /// True if `other` matches the same gesture with the same settings
    ///
    /// Reconciling a rebuilt recognizer tree keeps this detector, with its
    /// progress, in place of an equivalent `other`.
    fn same_gesture(&self, _other: &dyn GestureDetector) -> bool {
        false
    }
}
