#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use opsagent::{
    Orchestrator,
    config::{ExecutorConfig, ToolCredentials},
    error::{llm_error::LlmError, tool_error::ToolError},
    llm::{CompletionRequest, LanguageModel},
    tools::{HttpRequest, HttpTransport, ToolRegistry},
};
use serde_json::{Value, json};

pub const GITHUB_SEARCH: &str = "https://api.github.com/search/repositories";
pub const WTTR: &str = "https://wttr.in/";
pub const EXCHANGE_OPEN: &str = "https://api.exchangerate-api.com/v4/latest/";
pub const EXCHANGE_SECONDARY: &str = "https://open.er-api.com/";

struct Route {
    prefix: String,
    responses: VecDeque<Result<Value, ToolError>>,
}

/// Answers GETs by URL prefix. Each route plays its responses in order and
/// repeats the last one once the queue is down to a single entry.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, prefix: &str, responses: Vec<Result<Value, ToolError>>) -> Self {
        self.routes.lock().unwrap().push(Route {
            prefix: prefix.to_string(),
            responses: responses.into(),
        });
        self
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_json(&self, request: HttpRequest) -> Result<Value, ToolError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.starts_with(&r.prefix)) else {
            return Err(ToolError::Network(format!("no route for {}", url)));
        };
        if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route
                .responses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ToolError::Network("route has no responses".into())))
        }
    }
}

/// Replies in FIFO order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Upstream("no scripted reply left".into())))
    }
}

pub fn fast_executor() -> ExecutorConfig {
    ExecutorConfig {
        max_attempts: 3,
        retry_delay: Duration::ZERO,
    }
}

pub fn registry(transport: &Arc<ScriptedTransport>) -> Arc<ToolRegistry> {
    let transport: Arc<dyn HttpTransport> = transport.clone();
    Arc::new(ToolRegistry::with_default_tools(&ToolCredentials::default(), transport).unwrap())
}

pub fn orchestrator(
    model: &Arc<ScriptedModel>,
    transport: &Arc<ScriptedTransport>,
    max_refinements: u32,
) -> Orchestrator<Arc<ScriptedModel>> {
    Orchestrator::new(model.clone(), registry(transport), fast_executor(), max_refinements)
}

pub fn reply(value: Value) -> Result<String, LlmError> {
    Ok(value.to_string())
}

pub fn answer(text: &str, needs_retry: bool) -> Result<String, LlmError> {
    reply(json!({ "final_answer": text, "needs_retry": needs_retry }))
}

pub fn network_error() -> Result<Value, ToolError> {
    Err(ToolError::Network("operation timed out".into()))
}

pub fn usd_rates() -> Value {
    json!({
        "base": "USD",
        "date": "2025-02-05",
        "rates": {"USD": 1.0, "EUR": 0.92, "JPY": 151.3}
    })
}

pub fn github_search() -> Value {
    let repo = |name: &str, stars: u64| {
        json!({
            "name": name,
            "full_name": format!("ai-org/{}", name),
            "description": "Machine learning toolkit",
            "stargazers_count": stars,
            "forks_count": 120,
            "language": "Python",
            "html_url": format!("https://github.com/ai-org/{}", name),
            "updated_at": "2025-02-01T00:00:00Z"
        })
    };
    json!({
        "total_count": 3,
        "items": [repo("transformers", 130000), repo("langchain", 90000), repo("autogpt", 160000)]
    })
}

pub fn tokyo_wttr() -> Value {
    json!({
        "current_condition": [{
            "temp_C": "12",
            "FeelsLikeC": "10",
            "humidity": "55",
            "pressure": "1015",
            "windspeedKmph": "9",
            "windspeedMiles": "6",
            "cloudcover": "20",
            "visibility": "10",
            "weatherDesc": [{"value": "Sunny"}]
        }],
        "nearest_area": [{"country": [{"value": "Japan"}]}]
    })
}
