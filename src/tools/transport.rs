use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{error::tool_error::ToolError, utils::string_util::truncate_for_log};

const USER_AGENT: &str = concat!("opsagent/", env!("CARGO_PKG_VERSION"));

/// A single outbound GET.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

/// Every tool adapter reaches its upstream through this trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs the GET and decodes a JSON body, classifying failures as
    /// `Network` (no response) or `Upstream` (non-2xx or undecodable body).
    async fn get_json(&self, request: HttpRequest) -> Result<Value, ToolError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, request: HttpRequest) -> Result<Value, ToolError> {
        debug!(url = %request.url, params = request.query.len(), "outbound GET");

        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::upstream(
                Some(status.as_u16()),
                truncate_for_log(body.trim(), 300),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::upstream(None, format!("undecodable body: {}", e)))
    }
}

fn classify(err: reqwest::Error) -> ToolError {
    if let Some(status) = err.status() {
        return ToolError::upstream(Some(status.as_u16()), err.to_string());
    }
    if err.is_builder() {
        return ToolError::Validation(err.to_string());
    }
    ToolError::Network(err.to_string())
}
