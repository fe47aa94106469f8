use std::{fmt, ops::Deref};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::tool_error::{FailureKind, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&ToolError> for StepFailure {
    fn from(err: &ToolError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one plan step. Built once by the executor, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub tool_name: String,
    pub status: StepStatus,
    /// Tool data when `status` is `ok`, `null` otherwise.
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
    pub attempt_count: u32,
    #[serde(default)]
    pub degraded: bool,
    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    pub fn ok(step_index: usize, tool_name: &str, output: Value, degraded: bool, attempt_count: u32) -> Self {
        Self {
            step_index,
            tool_name: tool_name.to_string(),
            status: StepStatus::Ok,
            output,
            error: None,
            attempt_count,
            degraded,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(step_index: usize, tool_name: &str, failure: StepFailure, attempt_count: u32) -> Self {
        Self {
            step_index,
            tool_name: tool_name.to_string(),
            status: StepStatus::Failed,
            output: Value::Null,
            error: Some(failure),
            attempt_count: attempt_count.max(1),
            degraded: false,
            finished_at: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StepStatus::Ok
    }
}

/// One result per plan step, in step order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLog(Vec<StepResult>);

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: StepResult) {
        self.0.push(result);
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &StepResult> {
        self.0.iter().filter(|r| r.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepResult> {
        self.0.iter().filter(|r| !r.is_ok())
    }
}

impl Deref for ExecutionLog {
    type Target = [StepResult];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<StepResult>> for ExecutionLog {
    fn from(results: Vec<StepResult>) -> Self {
        Self(results)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Partial,
    Error,
}

impl OverallStatus {
    /// All ok is success, all failed is error, anything in between is partial.
    /// An empty log has nothing to show and counts as error.
    pub fn from_log(log: &ExecutionLog) -> Self {
        let ok = log.succeeded().count();
        if ok == 0 {
            OverallStatus::Error
        } else if ok == log.len() {
            OverallStatus::Success
        } else {
            OverallStatus::Partial
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Success => write!(f, "success"),
            OverallStatus::Partial => write!(f, "partial"),
            OverallStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall_status: OverallStatus,
    pub final_answer: String,
    pub needs_retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// `false` when the answer came from the deterministic template.
    pub synthesized: bool,
}
