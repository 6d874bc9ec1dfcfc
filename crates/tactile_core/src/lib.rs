//! Tactile Core
//!
//! Shared primitives for the Tactile gesture engine:
//!
//! - **Input Events**: touch and axis events in logical coordinates
//! - **Recognizer State**: the lifecycle every recognizer cycles through
//! - **Configuration**: thresholds and timings for gesture detection
//!
//! # Example
//!
//! ```rust
//! use tactile_core::{RecognizerState, StateEvent, TouchEvent, TouchPhase};
//!
//! let down = TouchEvent::down(1, 10.0, 20.0, 0);
//! assert_eq!(down.phase, TouchPhase::Down);
//!
//! let state = RecognizerState::Ready;
//! assert_eq!(state.on_event(StateEvent::Track), Some(RecognizerState::Detecting));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod state;

pub use config::GestureConfig;
pub use error::{GestureError, Result};
pub use events::{
    checked_millis, millis, AxisAction, AxisEvent, Point, Timestamp, TouchEvent, TouchId,
    TouchIds, TouchPhase,
};
pub use state::{GestureDisposal, RecognizerId, RecognizerState, StateEvent};
