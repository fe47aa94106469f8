use std::{collections::HashMap, sync::Arc};

use tracing::info;

use crate::{
    config::ToolCredentials,
    error::agent_error::AgentError,
    tools::{Tool, ToolSpec, instantiate::instantiate_tools, transport::HttpTransport},
};

/// Name-indexed, append-only set of tools. Filled once at startup and shared
/// read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four built-in adapters sharing one transport.
    pub fn with_default_tools(
        credentials: &ToolCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, AgentError> {
        instantiate_tools(credentials, transport)
    }

    pub fn register(&mut self, tool: impl Into<Tool>) -> Result<(), AgentError> {
        let tool = tool.into();
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateName(name));
        }
        self.index.insert(name.clone(), self.tools.len());
        self.tools.push(tool);
        info!("Registered tool: {}", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Tool, AgentError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    /// Specs in registration order.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec().clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
