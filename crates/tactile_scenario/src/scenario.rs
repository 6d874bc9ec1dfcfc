//! Scenario definition: recognizers to build and the input script to play.
//!
//! ```json
//! {
//!   "recognizers": [
//!     { "kind": "tap", "label": "tap" },
//!     { "kind": "long_press", "label": "press" },
//!     { "kind": "group", "label": "both", "policy": "exclusive", "children": ["tap", "press"] }
//!   ],
//!   "steps": [
//!     { "type": "down", "id": 1, "x": 0.0, "y": 0.0, "at_ms": 0, "candidates": ["both"] },
//!     { "type": "up", "id": 1, "x": 0.0, "y": 0.0, "at_ms": 80 },
//!     { "type": "expect_notice", "label": "tap", "kind": "accepted" }
//!   ]
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tactile_core::{AxisAction, GestureConfig, RecognizerState, TouchId};
use tactile_gesture::{GroupPolicy, NoticeKind, PanDirection};

/// Recognizer tree and input script of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GestureScenario {
    /// Detection thresholds; defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GestureConfig>,
    /// Built in order; groups may only name recognizers declared before them
    #[serde(default)]
    pub recognizers: Vec<RecognizerSpec>,
    pub steps: Vec<ScenarioStep>,
}

impl GestureScenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn one() -> usize {
    1
}

fn two() -> usize {
    2
}

fn single_tap() -> u32 {
    1
}

fn unit_scale() -> f32 {
    1.0
}

/// A recognizer to register, addressed by its label in steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognizerSpec {
    Tap {
        label: String,
        #[serde(default = "one")]
        fingers: usize,
        #[serde(default = "single_tap")]
        count: u32,
    },
    LongPress {
        label: String,
        #[serde(default = "one")]
        fingers: usize,
        /// Overrides the configured hold time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    Pan {
        label: String,
        #[serde(default)]
        direction: PanDirection,
        #[serde(default = "one")]
        min_fingers: usize,
        #[serde(default = "one")]
        max_fingers: usize,
    },
    Pinch {
        label: String,
        #[serde(default = "two")]
        fingers: usize,
    },
    Group {
        label: String,
        policy: GroupPolicy,
        children: Vec<String>,
    },
}

impl RecognizerSpec {
    pub fn label(&self) -> &str {
        match self {
            RecognizerSpec::Tap { label, .. }
            | RecognizerSpec::LongPress { label, .. }
            | RecognizerSpec::Pan { label, .. }
            | RecognizerSpec::Pinch { label, .. }
            | RecognizerSpec::Group { label, .. } => label,
        }
    }
}

/// One scripted input, clock movement or assertion.
///
/// Times are milliseconds on the device clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Finger contact; `candidates` are the hit-tested recognizers
    Down {
        id: TouchId,
        x: f32,
        y: f32,
        at_ms: u64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        candidates: Vec<String>,
    },
    Move {
        id: TouchId,
        x: f32,
        y: f32,
        at_ms: u64,
    },
    Up {
        id: TouchId,
        x: f32,
        y: f32,
        at_ms: u64,
    },
    Cancel {
        id: TouchId,
        at_ms: u64,
    },
    /// Scroll or pinch stream update
    Axis {
        id: TouchId,
        action: AxisAction,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        horizontal: f32,
        #[serde(default)]
        vertical: f32,
        #[serde(default = "unit_scale")]
        pinch_scale: f32,
        at_ms: u64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        candidates: Vec<String>,
    },
    /// Move the clock without input
    Advance {
        at_ms: u64,
    },
    FlushBegin,
    FlushEnd,
    ReplaceChildren {
        group: String,
        children: Vec<String>,
    },
    ExpectState {
        label: String,
        state: RecognizerState,
    },
    /// `label: null` expects no committed winner
    ExpectWinner {
        id: TouchId,
        label: Option<String>,
    },
    /// Some notice of `kind` was emitted for `label` so far
    ExpectNotice {
        label: String,
        kind: NoticeKind,
    },
    /// No notice of `kind` was emitted for `label` so far
    ExpectNoNotice {
        label: String,
        kind: NoticeKind,
    },
}

impl ScenarioStep {
    /// Name used in reports for assertion steps
    pub fn assertion(&self) -> Option<&'static str> {
        match self {
            ScenarioStep::ExpectState { .. } => Some("expect_state"),
            ScenarioStep::ExpectWinner { .. } => Some("expect_winner"),
            ScenarioStep::ExpectNotice { .. } => Some("expect_notice"),
            ScenarioStep::ExpectNoNotice { .. } => Some("expect_no_notice"),
            _ => None,
        }
    }
}
