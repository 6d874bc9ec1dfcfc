//! Recognizer nodes
//!
//! The surface arena stores one [`RecognizerNode`] per recognizer. A node is
//! either a leaf wrapping a [`GestureDetector`] or a [`GestureGroup`]. The
//! back-reference to the containing group is a plain [`RecognizerId`] looked
//! up in the arena, so groups and children never own each other.

use tactile_core::{RecognizerId, RecognizerState, StateEvent, Timestamp};

use crate::detector::GestureDetector;
use crate::fingers::FingerTracker;
use crate::group::GestureGroup;

/// What a recognizer does with its events
#[derive(Debug)]
pub enum NodeKind {
    Detector(Box<dyn GestureDetector>),
    Group(GestureGroup),
}

/// One recognizer on a touch surface
#[derive(Debug)]
pub struct RecognizerNode {
    pub(crate) state: RecognizerState,
    pub(crate) fingers: FingerTracker,
    pub(crate) group: Option<RecognizerId>,
    pub(crate) kind: NodeKind,
}

impl RecognizerNode {
    pub(crate) fn new(kind: NodeKind, fingers: FingerTracker) -> Self {
        Self {
            state: RecognizerState::Ready,
            fingers,
            group: None,
            kind,
        }
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    pub fn fingers(&self) -> &FingerTracker {
        &self.fingers
    }

    /// Containing group, if any
    pub fn group(&self) -> Option<RecognizerId> {
        self.group
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Detector(detector) => detector.name(),
            NodeKind::Group(group) => group.policy().name(),
        }
    }

    pub fn as_group(&self) -> Option<&GestureGroup> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Detector(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GestureGroup> {
        match &mut self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Detector(_) => None,
        }
    }

    /// Apply a lifecycle event; false when it does not apply
    pub(crate) fn transition(&mut self, event: StateEvent) -> bool {
        match self.state.on_event(event) {
            Some(next) => {
                tracing::trace!("{} {:?} -> {:?}", self.name(), self.state, next);
                self.state = next;
                true
            }
            None => {
                tracing::trace!("{} ignores {:?} while {:?}", self.name(), event, self.state);
                false
            }
        }
    }

    /// Time at which this node wants to be re-evaluated
    pub(crate) fn deadline(&self) -> Option<Timestamp> {
        if !self.state.is_undecided() {
            return None;
        }
        match &self.kind {
            NodeKind::Detector(detector) => detector.deadline(),
            NodeKind::Group(group) => group.deadline(),
        }
    }

    /// Back to READY without touching children
    pub(crate) fn reset_local(&mut self) {
        self.transition(StateEvent::Reset);
        self.fingers.clear();
        match &mut self.kind {
            NodeKind::Detector(detector) => detector.reset(),
            NodeKind::Group(group) => group.reset(),
        }
    }
}
