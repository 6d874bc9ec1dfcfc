//! Tactile Scenario
//!
//! Scripted input for touch surfaces:
//!
//! - **Scenarios**: JSON files naming the recognizers to build and the
//!   touch, axis and clock steps to play, with expectations in between
//! - **Runner**: plays a scenario and produces a machine-readable report
//! - **Recorder**: captures live input so a session can be replayed
//!
//! # Example
//!
//! ```rust
//! use tactile_scenario::run_scenario;
//!
//! let outcome = run_scenario(
//!     r#"{
//!         "recognizers": [{ "kind": "tap", "label": "tap" }],
//!         "steps": [
//!             { "type": "down", "id": 1, "x": 0.0, "y": 0.0, "at_ms": 0, "candidates": ["tap"] },
//!             { "type": "up", "id": 1, "x": 0.0, "y": 0.0, "at_ms": 50 },
//!             { "type": "expect_notice", "label": "tap", "kind": "accepted" }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//! assert!(!outcome.is_failed());
//! ```

pub mod recorder;
pub mod report;
pub mod runner;
pub mod scenario;

pub use recorder::{RecordedInput, TouchRecorder};
pub use report::{NoticeRecord, ReportStatus, ScenarioReport};
pub use runner::{run_scenario, run_scenario_path, RunOutcome, ScenarioRunner};
pub use scenario::{GestureScenario, RecognizerSpec, ScenarioStep};
