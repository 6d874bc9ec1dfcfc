//! Recognizer lifecycle
//!
//! Every recognizer, leaf or group, cycles through the same states:
//!
//! ```text
//! READY -> DETECTING -> { PENDING, ACCEPTED, REJECTED } -> READY
//! ```
//!
//! Transitions are table driven: [`RecognizerState::on_event`] returns the
//! next state, or `None` when the event does not apply to the current state.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a recognizer registered on a touch surface
    pub struct RecognizerId;
}

/// Recognizer state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerState {
    /// No identifiers tracked
    #[default]
    Ready,
    /// Tracking at least one identifier, outcome undetermined
    Detecting,
    /// Matches, but waits for competing recognizers or a deadline
    Pending,
    /// Owns the gesture until its identifiers end
    Accepted,
    /// Lost the gesture for the current cycle
    Rejected,
}

/// Events driving [`RecognizerState`] transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateEvent {
    /// First identifier tracked
    Track,
    Pend,
    Accept,
    Reject,
    Reset,
    /// Outcome withdrawn while identifiers are still held
    Reopen,
}

impl RecognizerState {
    /// Handle an event and return the new state, or None if no transition
    pub fn on_event(&self, event: StateEvent) -> Option<Self> {
        use RecognizerState::*;
        match (self, event) {
            (Ready, StateEvent::Track) => Some(Detecting),
            (Detecting, StateEvent::Pend) => Some(Pending),
            (Detecting | Pending, StateEvent::Accept) => Some(Accepted),
            // Accepted -> Rejected is the forced early-terminal path (cancel)
            (Detecting | Pending | Accepted, StateEvent::Reject) => Some(Rejected),
            (Detecting | Pending | Accepted | Rejected, StateEvent::Reset) => Some(Ready),
            (Pending | Accepted | Rejected, StateEvent::Reopen) => Some(Detecting),
            _ => None,
        }
    }

    /// Accepted or rejected for the current cycle
    pub const fn is_terminal(&self) -> bool {
        matches!(self, RecognizerState::Accepted | RecognizerState::Rejected)
    }

    /// Still competing for the gesture
    pub const fn is_undecided(&self) -> bool {
        matches!(self, RecognizerState::Detecting | RecognizerState::Pending)
    }
}

/// Arbitration decision reported by a recognizer about itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureDisposal {
    Accept,
    Reject,
    Pending,
}

impl GestureDisposal {
    /// State event this disposal resolves to once granted
    pub const fn state_event(self) -> StateEvent {
        match self {
            GestureDisposal::Accept => StateEvent::Accept,
            GestureDisposal::Reject => StateEvent::Reject,
            GestureDisposal::Pending => StateEvent::Pend,
        }
    }
}
