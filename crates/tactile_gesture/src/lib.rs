//! Tactile Gesture
//!
//! Gesture recognition and arbitration for touch surfaces.
//!
//! Recognizers live on a [`TouchSurface`]. Leaf recognizers wrap a
//! [`GestureDetector`] (tap, long press, pan, pinch or your own); groups
//! combine children with an exclusive, parallel or sequence policy. Each
//! touch identifier gets its candidates from hit testing, and the
//! [`GestureReferee`] makes sure exactly one of them wins.
//!
//! # Example
//!
//! ```rust
//! use tactile_core::{millis, GestureConfig, RecognizerState, TouchEvent};
//! use tactile_gesture::{LongPressDetector, NoticeKind, TapDetector, TouchSurface};
//!
//! let config = GestureConfig::default();
//! let mut surface = TouchSurface::new(config.clone());
//! let tap = surface.insert(TapDetector::new(&config)).unwrap();
//! let press = surface.insert(LongPressDetector::new(&config)).unwrap();
//! let group = surface.exclusive(&[tap, press]).unwrap();
//!
//! surface.add_candidate(1, group).unwrap();
//! surface.handle_touch(&TouchEvent::down(1, 10.0, 10.0, 0));
//! surface.handle_touch(&TouchEvent::up(1, 10.0, 10.0, millis(90)));
//!
//! let notices = surface.drain_notices();
//! assert!(notices
//!     .iter()
//!     .any(|n| n.recognizer == tap && n.kind == NoticeKind::Accepted));
//! // The cycle is over: everything is ready for the next gesture
//! assert_eq!(surface.state(tap), Some(RecognizerState::Ready));
//! ```

pub mod contest;
pub mod detector;
pub mod detectors;
pub mod fingers;
pub mod group;
pub mod recognizer;
pub mod referee;
pub mod surface;

pub use contest::{Contest, Standing, Verdict};
pub use detector::{GestureDetector, Response};
pub use detectors::{LongPressDetector, PanDetector, PanDirection, PinchDetector, TapDetector};
pub use fingers::{FingerTrack, FingerTracker, FingerWindow};
pub use group::{GestureGroup, GroupPolicy};
pub use recognizer::{NodeKind, RecognizerNode};
pub use referee::{GestureReferee, GestureScope};
pub use surface::{GestureNotice, NoticeKind, TouchSurface};
