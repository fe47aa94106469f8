use crate::error::llm_error::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("task is empty")]
    EmptyTask,

    #[error("tool already registered: {0}")]
    DuplicateName(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("planning failed: {0}")]
    Planning(#[from] LlmError),
}
