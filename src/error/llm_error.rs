#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("structured output rejected: {0}")]
    SchemaViolation(String),
}
