//! Scenario runner that plays a script against a touch surface.

use crate::report::{NoticeRecord, ScenarioReport};
use crate::scenario::{GestureScenario, RecognizerSpec, ScenarioStep};
use anyhow::{anyhow, bail, Result};
use rustc_hash::FxHashMap;
use std::path::Path;
use tactile_core::{checked_millis, AxisEvent, RecognizerId, Timestamp, TouchEvent, TouchId};
use tactile_gesture::{
    LongPressDetector, NoticeKind, PanDetector, PinchDetector, TapDetector, TouchSurface,
};

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: ScenarioReport },
    Failed { report: ScenarioReport },
}

impl RunOutcome {
    pub fn report(&self) -> &ScenarioReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Result of one assertion step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Check {
    Pass,
    Fail(String),
}

/// Step time in milliseconds as a surface timestamp
fn at(ms: u64) -> Result<Timestamp> {
    checked_millis(ms).ok_or_else(|| anyhow!("step time {} ms is out of range", ms))
}

/// Execute scenario JSON.
pub fn run_scenario(input: &str) -> Result<RunOutcome> {
    let scenario = GestureScenario::from_json(input)?;
    ScenarioRunner::new(&scenario)?.run(&scenario.steps)
}

/// Execute a scenario file.
pub fn run_scenario_path(path: &Path) -> Result<RunOutcome> {
    let scenario = GestureScenario::from_path(path)?;
    ScenarioRunner::new(&scenario)?.run(&scenario.steps)
}

/// A touch surface built from a scenario, with recognizers addressed by label
///
/// Authoring mistakes (unknown labels, invalid groups) are errors; failed
/// expectations end the run with a failed report.
#[derive(Debug)]
pub struct ScenarioRunner {
    surface: TouchSurface,
    ids: FxHashMap<String, RecognizerId>,
    labels: FxHashMap<RecognizerId, String>,
    notices: Vec<NoticeRecord>,
}

impl ScenarioRunner {
    pub fn new(scenario: &GestureScenario) -> Result<Self> {
        let config = scenario.config.clone().unwrap_or_default();
        config.validate()?;
        let mut runner = Self {
            surface: TouchSurface::new(config),
            ids: FxHashMap::default(),
            labels: FxHashMap::default(),
            notices: Vec::new(),
        };
        for spec in &scenario.recognizers {
            runner.build(spec)?;
        }
        Ok(runner)
    }

    pub fn surface(&self) -> &TouchSurface {
        &self.surface
    }

    /// Recognizer registered under a label
    pub fn id(&self, label: &str) -> Option<RecognizerId> {
        self.ids.get(label).copied()
    }

    pub fn label(&self, id: RecognizerId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Notices collected so far
    pub fn notices(&self) -> &[NoticeRecord] {
        &self.notices
    }

    fn build(&mut self, spec: &RecognizerSpec) -> Result<RecognizerId> {
        let label = spec.label();
        if self.ids.contains_key(label) {
            bail!("duplicate recognizer label '{}'", label);
        }
        let config = self.surface.config().clone();
        let id = match spec {
            RecognizerSpec::Tap { fingers, count, .. } => self.surface.insert(
                TapDetector::new(&config)
                    .with_fingers(*fingers)
                    .with_count(*count),
            )?,
            RecognizerSpec::LongPress {
                fingers,
                duration_ms,
                ..
            } => {
                let mut detector = LongPressDetector::new(&config).with_fingers(*fingers);
                if let Some(ms) = duration_ms {
                    detector = detector.with_duration_ms(*ms);
                }
                self.surface.insert(detector)?
            }
            RecognizerSpec::Pan {
                direction,
                min_fingers,
                max_fingers,
                ..
            } => self.surface.insert(
                PanDetector::new(&config)
                    .with_direction(*direction)
                    .with_fingers(*min_fingers, *max_fingers),
            )?,
            RecognizerSpec::Pinch { fingers, .. } => self
                .surface
                .insert(PinchDetector::new(&config).with_fingers(*fingers))?,
            RecognizerSpec::Group {
                policy, children, ..
            } => {
                let children = self.lookup_all(children)?;
                self.surface.insert_group(*policy, &children)?
            }
        };
        self.ids.insert(label.to_string(), id);
        self.labels.insert(id, label.to_string());
        Ok(id)
    }

    fn lookup(&self, label: &str) -> Result<RecognizerId> {
        self.id(label)
            .ok_or_else(|| anyhow!("unknown recognizer label '{}'", label))
    }

    fn lookup_all(&self, labels: &[String]) -> Result<Vec<RecognizerId>> {
        labels.iter().map(|label| self.lookup(label)).collect()
    }

    fn add_candidates(&mut self, touch_id: TouchId, labels: &[String]) -> Result<()> {
        for id in self.lookup_all(labels)? {
            self.surface.add_candidate(touch_id, id)?;
        }
        Ok(())
    }

    /// Play steps in order, stopping at the first failed expectation
    pub fn run(&mut self, steps: &[ScenarioStep]) -> Result<RunOutcome> {
        for (index, step) in steps.iter().enumerate() {
            tracing::debug!("Scenario step {}: {:?}", index, step);
            let check = self.apply(step)?;
            self.collect(index);
            if let Check::Fail(message) = check {
                tracing::info!("Scenario failed at step {}: {}", index, message);
                let report = ScenarioReport::failed(
                    step.assertion().unwrap_or("step"),
                    index,
                    message,
                    self.elapsed_ms(),
                    self.notices.clone(),
                );
                return Ok(RunOutcome::Failed { report });
            }
        }
        let report = ScenarioReport::passed(steps.len(), self.elapsed_ms(), self.notices.clone());
        Ok(RunOutcome::Passed { report })
    }

    fn elapsed_ms(&self) -> u64 {
        self.surface.now() / 1_000
    }

    fn apply(&mut self, step: &ScenarioStep) -> Result<Check> {
        match step {
            ScenarioStep::Down {
                id,
                x,
                y,
                at_ms,
                candidates,
            } => {
                self.add_candidates(*id, candidates)?;
                self.surface
                    .handle_touch(&TouchEvent::down(*id, *x, *y, at(*at_ms)?));
            }
            ScenarioStep::Move { id, x, y, at_ms } => {
                self.surface
                    .handle_touch(&TouchEvent::moved(*id, *x, *y, at(*at_ms)?));
            }
            ScenarioStep::Up { id, x, y, at_ms } => {
                self.surface
                    .handle_touch(&TouchEvent::up(*id, *x, *y, at(*at_ms)?));
            }
            ScenarioStep::Cancel { id, at_ms } => {
                self.surface
                    .handle_touch(&TouchEvent::cancel(*id, at(*at_ms)?));
            }
            ScenarioStep::Axis {
                id,
                action,
                x,
                y,
                horizontal,
                vertical,
                pinch_scale,
                at_ms,
                candidates,
            } => {
                self.add_candidates(*id, candidates)?;
                let event = AxisEvent::new(*id, *action, *x, *y, at(*at_ms)?)
                    .with_scroll(*horizontal, *vertical)
                    .with_pinch_scale(*pinch_scale);
                self.surface.handle_axis(&event);
            }
            ScenarioStep::Advance { at_ms } => self.surface.advance_to(at(*at_ms)?),
            ScenarioStep::FlushBegin => self.surface.begin_flush(),
            ScenarioStep::FlushEnd => self.surface.end_flush(),
            ScenarioStep::ReplaceChildren { group, children } => {
                let group = self.lookup(group)?;
                let children = self.lookup_all(children)?;
                self.surface.replace_children(group, &children)?;
            }
            ScenarioStep::ExpectState { label, state } => {
                let actual = self.surface.state(self.lookup(label)?);
                if actual != Some(*state) {
                    return Ok(Check::Fail(format!(
                        "{} is {:?}, expected {:?}",
                        label, actual, state
                    )));
                }
            }
            ScenarioStep::ExpectWinner { id, label } => {
                let actual = self.surface.winner(*id).and_then(|winner| self.label(winner));
                if actual != label.as_deref() {
                    return Ok(Check::Fail(format!(
                        "touch {} is won by {:?}, expected {:?}",
                        id, actual, label
                    )));
                }
            }
            ScenarioStep::ExpectNotice { label, kind } => {
                self.lookup(label)?;
                if !self.has_notice(label, *kind) {
                    return Ok(Check::Fail(format!("{} never reported {:?}", label, kind)));
                }
            }
            ScenarioStep::ExpectNoNotice { label, kind } => {
                self.lookup(label)?;
                if self.has_notice(label, *kind) {
                    return Ok(Check::Fail(format!("{} reported {:?}", label, kind)));
                }
            }
        }
        Ok(Check::Pass)
    }

    fn has_notice(&self, label: &str, kind: NoticeKind) -> bool {
        self.notices
            .iter()
            .any(|record| record.recognizer == label && record.kind == kind)
    }

    fn collect(&mut self, step: usize) {
        for notice in self.surface.drain_notices() {
            let recognizer = self
                .label(notice.recognizer)
                .unwrap_or("<unlabeled>")
                .to_string();
            self.notices.push(NoticeRecord {
                step,
                recognizer,
                touch_ids: notice.touch_ids.to_vec(),
                kind: notice.kind,
            });
        }
    }
}
