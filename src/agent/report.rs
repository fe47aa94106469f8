use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    agent::{
        planning::Plan,
        types::{ExecutionLog, OverallStatus, Verdict},
    },
    error::agent_error::AgentError,
};

/// Everything a caller gets back for one task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub run_id: Uuid,
    pub task: String,
    pub status: OverallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub execution_log: ExecutionLog,
    pub verdict: Verdict,
    /// Refinement rounds that were executed after the first.
    pub refinements: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TaskReport {
    /// Report for a run that never reached execution.
    pub fn from_failure(run_id: Uuid, task: &str, err: &AgentError, started_at: DateTime<Utc>) -> Self {
        let final_answer = match err {
            AgentError::EmptyTask => "No task was given.".to_string(),
            other => format!("I could not work out a plan for this task ({}).", other),
        };
        Self {
            run_id,
            task: task.to_string(),
            status: OverallStatus::Error,
            plan: None,
            execution_log: ExecutionLog::new(),
            verdict: Verdict {
                overall_status: OverallStatus::Error,
                final_answer,
                needs_retry: false,
                notes: None,
                synthesized: false,
            },
            refinements: 0,
            error: Some(err.to_string()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn final_answer(&self) -> &str {
        &self.verdict.final_answer
    }
}
