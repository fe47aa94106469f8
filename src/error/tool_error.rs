use serde::{Deserialize, Serialize};

/// Classified failure of a single tool call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned {}: {message}", status_label(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "an unusable response".to_string(),
    }
}

impl ToolError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        ToolError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Network and upstream failures can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ToolError::Validation(_))
    }

    /// Errors that trigger a credential-less adapter's fallback path:
    /// unreachable upstream, auth rejection, rate limiting.
    pub fn warrants_fallback(&self) -> bool {
        match self {
            ToolError::Network(_) => true,
            ToolError::Upstream {
                status: Some(status),
                ..
            } => matches!(status, 401 | 403 | 429),
            _ => false,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ToolError::Validation(_) => FailureKind::Validation,
            ToolError::Network(_) => FailureKind::Network,
            ToolError::Upstream { .. } => FailureKind::Upstream,
        }
    }
}

/// Why a step ended up `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Network,
    Upstream,
    /// A referenced or depended-on step failed, so the tool was never called.
    Dependency,
}

impl FailureKind {
    pub fn is_transient(self) -> bool {
        matches!(self, FailureKind::Network | FailureKind::Upstream)
    }
}
