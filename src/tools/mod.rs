pub mod exchange;
pub mod github;
pub mod instantiate;
pub mod model;
pub mod news;
pub mod registry;
pub mod transport;
pub mod weather;

use serde::Serialize;
use serde_json::{Map, Value};

pub use exchange::ExchangeRateTool;
pub use github::GitHubTool;
pub use model::{ParamSpec, ParamType, ToolSpec};
pub use news::NewsTool;
pub use registry::ToolRegistry;
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport};
pub use weather::WeatherTool;

use crate::error::tool_error::ToolError;

/// What a successful tool call hands back to the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub data: Value,
    /// Produced by a fallback path instead of the preferred upstream.
    pub degraded: bool,
}

impl ToolOutput {
    pub fn fresh(data: Value) -> Self {
        Self {
            data,
            degraded: false,
        }
    }

    pub fn degraded(data: Value) -> Self {
        Self {
            data,
            degraded: true,
        }
    }
}

/// The closed set of adapters the registry can hold.
pub enum Tool {
    GitHub(GitHubTool),
    Weather(WeatherTool),
    News(NewsTool),
    Exchange(ExchangeRateTool),
}

impl Tool {
    pub fn spec(&self) -> &ToolSpec {
        match self {
            Tool::GitHub(tool) => tool.spec(),
            Tool::Weather(tool) => tool.spec(),
            Tool::News(tool) => tool.spec(),
            Tool::Exchange(tool) => tool.spec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    /// Validates `params` against the tool's schema, then performs the call.
    pub async fn execute(&self, params: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        match self {
            Tool::GitHub(tool) => tool.execute(params).await,
            Tool::Weather(tool) => tool.execute(params).await,
            Tool::News(tool) => tool.execute(params).await,
            Tool::Exchange(tool) => tool.execute(params).await,
        }
    }
}

impl From<GitHubTool> for Tool {
    fn from(tool: GitHubTool) -> Self {
        Tool::GitHub(tool)
    }
}

impl From<WeatherTool> for Tool {
    fn from(tool: WeatherTool) -> Self {
        Tool::Weather(tool)
    }
}

impl From<NewsTool> for Tool {
    fn from(tool: NewsTool) -> Self {
        Tool::News(tool)
    }
}

impl From<ExchangeRateTool> for Tool {
    fn from(tool: ExchangeRateTool) -> Self {
        Tool::Exchange(tool)
    }
}
