//! Input recording
//!
//! A [`TouchRecorder`] captures the raw input a platform layer feeds into a
//! touch surface, so a session can be saved as a scenario and replayed.
//! Clones share one buffer: the input thread records while another thread
//! inspects or exports.

use parking_lot::Mutex;
use std::sync::Arc;
use tactile_core::{AxisEvent, Timestamp, TouchEvent, TouchPhase};

use crate::scenario::{GestureScenario, RecognizerSpec, ScenarioStep};

/// One captured input
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedInput {
    Touch {
        event: TouchEvent,
        /// Hit-tested recognizer labels, only meaningful for DOWN
        candidates: Vec<String>,
    },
    Axis {
        event: AxisEvent,
        candidates: Vec<String>,
    },
    /// Clock tick without input
    Advance(Timestamp),
}

#[derive(Clone, Debug, Default)]
pub struct TouchRecorder {
    inputs: Arc<Mutex<Vec<RecordedInput>>>,
}

impl TouchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_touch(&self, event: &TouchEvent, candidates: &[&str]) {
        self.inputs.lock().push(RecordedInput::Touch {
            event: *event,
            candidates: candidates.iter().map(|label| label.to_string()).collect(),
        });
    }

    pub fn record_axis(&self, event: &AxisEvent, candidates: &[&str]) {
        self.inputs.lock().push(RecordedInput::Axis {
            event: *event,
            candidates: candidates.iter().map(|label| label.to_string()).collect(),
        });
    }

    pub fn record_advance(&self, now: Timestamp) {
        self.inputs.lock().push(RecordedInput::Advance(now));
    }

    pub fn len(&self) -> usize {
        self.inputs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inputs.lock().clear();
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> Vec<RecordedInput> {
        self.inputs.lock().clone()
    }

    /// Recorded input as scenario steps
    pub fn to_steps(&self) -> Vec<ScenarioStep> {
        self.inputs.lock().iter().map(to_step).collect()
    }

    /// A scenario replaying the recording against `recognizers`
    pub fn to_scenario(&self, recognizers: Vec<RecognizerSpec>) -> GestureScenario {
        GestureScenario {
            config: None,
            recognizers,
            steps: self.to_steps(),
        }
    }
}

fn to_ms(time: Timestamp) -> u64 {
    time / 1_000
}

fn to_step(input: &RecordedInput) -> ScenarioStep {
    match input {
        RecordedInput::Touch { event, candidates } => {
            let (id, x, y, at_ms) = (event.id, event.position.x, event.position.y, to_ms(event.time));
            match event.phase {
                TouchPhase::Down => ScenarioStep::Down {
                    id,
                    x,
                    y,
                    at_ms,
                    candidates: candidates.clone(),
                },
                TouchPhase::Move => ScenarioStep::Move { id, x, y, at_ms },
                TouchPhase::Up => ScenarioStep::Up { id, x, y, at_ms },
                TouchPhase::Cancel => ScenarioStep::Cancel { id, at_ms },
            }
        }
        RecordedInput::Axis { event, candidates } => ScenarioStep::Axis {
            id: event.id,
            action: event.action,
            x: event.position.x,
            y: event.position.y,
            horizontal: event.horizontal,
            vertical: event.vertical,
            pinch_scale: event.pinch_scale,
            at_ms: to_ms(event.time),
            candidates: candidates.clone(),
        },
        RecordedInput::Advance(now) => ScenarioStep::Advance { at_ms: to_ms(*now) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactile_core::{millis, AxisAction};

    #[test]
    fn test_clones_share_buffer() {
        let recorder = TouchRecorder::new();
        let platform = recorder.clone();
        let handle = std::thread::spawn(move || {
            platform.record_touch(&TouchEvent::down(1, 1.0, 2.0, millis(10)), &["tap"]);
            platform.record_touch(&TouchEvent::up(1, 1.0, 2.0, millis(60)), &[]);
        });
        handle.join().unwrap();

        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.to_steps(),
            vec![
                ScenarioStep::Down {
                    id: 1,
                    x: 1.0,
                    y: 2.0,
                    at_ms: 10,
                    candidates: vec!["tap".to_string()],
                },
                ScenarioStep::Up {
                    id: 1,
                    x: 1.0,
                    y: 2.0,
                    at_ms: 60
                },
            ]
        );

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_exported_scenario_parses_back() {
        let recorder = TouchRecorder::new();
        recorder.record_axis(
            &AxisEvent::new(4, AxisAction::Update, 0.0, 0.0, millis(5)).with_scroll(0.0, 2.0),
            &["pan"],
        );
        recorder.record_advance(millis(40));

        let json = recorder.to_scenario(Vec::new()).to_json().unwrap();
        let parsed = GestureScenario::from_json(&json).unwrap();
        assert_eq!(parsed.steps, recorder.to_steps());
    }
}
