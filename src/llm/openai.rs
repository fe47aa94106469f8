use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::LlmConfig,
    error::llm_error::LlmError,
    llm::model::{CompletionRequest, LanguageModel},
    utils::string_util::truncate_for_log,
};

/// Transport attempts per completion, first call included.
const TRANSPORT_ATTEMPTS: u32 = 2;
const TRANSPORT_RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleModel {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiCompatibleModel {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, Attempt> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| Attempt::Fatal(LlmError::Upstream(e.to_string())))?,
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Attempt::Transient(LlmError::Network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = LlmError::Upstream(format!(
                "HTTP {}: {}",
                status,
                truncate_for_log(text.trim(), 500)
            ));
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                Attempt::Transient(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(LlmError::Upstream(format!("undecodable response: {}", e))))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Attempt::Fatal(LlmError::Upstream("response has no content".to_string())))
    }
}

enum Attempt {
    Transient(LlmError),
    Fatal(LlmError),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

fn build_body<'a>(model: &'a str, max_tokens: u32, request: &'a CompletionRequest) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    ChatRequest {
        model,
        messages,
        temperature: request.temperature,
        max_tokens,
        response_format: request
            .json_mode
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = build_body(&self.config.model, self.config.max_tokens, &request);
        debug!(
            model = %self.config.model,
            temperature = request.temperature,
            json_mode = request.json_mode,
            prompt_len = request.prompt.len(),
            "model request prepared"
        );

        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(Attempt::Transient(err)) if attempt < TRANSPORT_ATTEMPTS => {
                    warn!(attempt, error = %err, "model call failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(TRANSPORT_RETRY_PAUSE).await;
                }
                Err(Attempt::Transient(err)) | Err(Attempt::Fatal(err)) => return Err(err),
            }
        }
    }
}
