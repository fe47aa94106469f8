use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::agent_error::AgentError;

/// A natural-language request, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task(String);

impl Task {
    pub fn new(text: impl AsRef<str>) -> Result<Self, AgentError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(AgentError::EmptyTask);
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
