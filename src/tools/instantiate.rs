use std::sync::Arc;

use crate::{
    config::ToolCredentials,
    error::agent_error::AgentError,
    tools::{
        ExchangeRateTool, GitHubTool, NewsTool, ToolRegistry, WeatherTool,
        transport::HttpTransport,
    },
};

/// Registers the four built-in adapters, each with its own optional credential.
pub fn instantiate_tools(
    credentials: &ToolCredentials,
    transport: Arc<dyn HttpTransport>,
) -> Result<ToolRegistry, AgentError> {
    let mut registry = ToolRegistry::new();
    registry.register(GitHubTool::new(
        transport.clone(),
        credentials.github_token.clone(),
    ))?;
    registry.register(WeatherTool::new(
        transport.clone(),
        credentials.openweather_api_key.clone(),
    ))?;
    registry.register(NewsTool::new(
        transport.clone(),
        credentials.news_api_key.clone(),
    ))?;
    registry.register(ExchangeRateTool::new(
        transport,
        credentials.exchange_api_key.clone(),
    ))?;
    Ok(registry)
}
