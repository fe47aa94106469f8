pub mod agent_error;
pub mod llm_error;
pub mod tool_error;

use std::io;

use thiserror::Error as ThisError;

use crate::{
    config::ConfigError,
    error::{agent_error::AgentError, llm_error::LlmError, tool_error::ToolError},
};

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serde_json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("model error: {0}")]
    ModelError(#[from] LlmError),

    #[error("tool error: {0}")]
    ToolError(#[from] ToolError),

    #[error("agent error: {0}")]
    AgentError(#[from] AgentError),
}

pub type Result<T> = core::result::Result<T, Error>;
