//! Report output model for scenario runs.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};
use tactile_core::TouchId;
use tactile_gesture::NoticeKind;

/// Report status for a scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// A gesture notice with the recognizer named by its scenario label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    /// Index of the step that produced the notice
    pub step: usize,
    pub recognizer: String,
    pub touch_ids: Vec<TouchId>,
    pub kind: NoticeKind,
}

/// Machine-readable result of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub status: ReportStatus,
    pub failed_step_index: Option<usize>,
    pub assertion: Option<String>,
    pub message: Option<String>,
    pub steps_run: usize,
    /// Surface clock at the end of the run
    pub elapsed_ms: u64,
    pub notices: Vec<NoticeRecord>,
}

impl ScenarioReport {
    pub fn passed(steps_run: usize, elapsed_ms: u64, notices: Vec<NoticeRecord>) -> Self {
        Self {
            status: ReportStatus::Passed,
            failed_step_index: None,
            assertion: None,
            message: None,
            steps_run,
            elapsed_ms,
            notices,
        }
    }

    pub fn failed(
        assertion: &str,
        failed_step_index: usize,
        message: String,
        elapsed_ms: u64,
        notices: Vec<NoticeRecord>,
    ) -> Self {
        Self {
            status: ReportStatus::Failed,
            failed_step_index: Some(failed_step_index),
            assertion: Some(assertion.to_string()),
            message: Some(message),
            steps_run: failed_step_index + 1,
            elapsed_ms,
            notices,
        }
    }

    /// Notices emitted for one recognizer, in order
    pub fn notices_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a NoticeRecord> + 'a {
        self.notices.iter().filter(move |record| record.recognizer == label)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
