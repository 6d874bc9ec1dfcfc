//! Built-in gesture detectors
//!
//! Each detector is configured from a [`GestureConfig`](tactile_core::GestureConfig)
//! snapshot when it is built; changing the surface configuration later does
//! not affect detectors already registered.

mod long_press;
mod pan;
mod pinch;
mod tap;

pub use long_press::LongPressDetector;
pub use pan::{PanDetector, PanDirection};
pub use pinch::PinchDetector;
pub use tap::TapDetector;

use crate::detector::GestureDetector;

/// `other` as a detector of type `T`
fn downcast<T: 'static>(other: &dyn GestureDetector) -> Option<&T> {
    other.as_any()?.downcast_ref::<T>()
}

#[cfg(test)]
pub(crate) mod testing {
    use tactile_core::{TouchEvent, TouchPhase};

    use crate::detector::{GestureDetector, Response};
    use crate::fingers::FingerTracker;

    /// Feed an event through finger bookkeeping the way the surface does
    pub(crate) fn feed<D: GestureDetector>(
        detector: &mut D,
        fingers: &mut FingerTracker,
        event: TouchEvent,
    ) -> Response {
        match event.phase {
            TouchPhase::Down => {
                fingers.press(&event);
            }
            _ => {
                fingers.update(&event);
            }
        }
        let response = detector.on_touch(fingers, &event);
        if event.phase.is_end() {
            fingers.release(event.id);
        }
        response
    }
}
