use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::llm_error::LlmError,
    llm::{
        model::{CompletionRequest, LanguageModel},
        schema::check_schema,
    },
    utils::string_util::{extract_json_object, truncate_for_log},
};

const LOG_PREVIEW_CHARS: usize = 400;

/// Progress of one structured completion. A reply is decoded at most twice:
/// once as returned and once after a repair prompt.
enum Decode<T> {
    Raw(String),
    Parsed(T),
    RepairRequested { rejected: String, reason: String },
    Rejected(String),
}

/// Thin layer over a [`LanguageModel`] adding JSON extraction, schema
/// checking and a single repair pass.
pub struct ReasoningClient<M> {
    model: M,
}

impl<M: LanguageModel> ReasoningClient<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Free-text completion. An empty reply counts as an upstream failure.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let text = self
            .model
            .complete(request(prompt, system, temperature, false))
            .await?;
        if text.trim().is_empty() {
            return Err(LlmError::Upstream("model returned an empty reply".to_string()));
        }
        Ok(text)
    }

    /// JSON completion checked against `schema` and deserialized into `T`.
    pub async fn generate_structured<T: DeserializeOwned + Send>(
        &self,
        prompt: &str,
        system: Option<&str>,
        schema: &Value,
        temperature: f32,
    ) -> Result<T, LlmError> {
        let first = self
            .model
            .complete(request(&with_schema(prompt, schema), system, temperature, true))
            .await?;
        let mut state = Decode::Raw(first);
        let mut repaired = false;

        loop {
            state = match state {
                Decode::Raw(text) => {
                    debug!(output = %truncate_for_log(&text, LOG_PREVIEW_CHARS), "raw model output");
                    match decode::<T>(&text, schema) {
                        Ok(value) => Decode::Parsed(value),
                        Err(reason) if !repaired => Decode::RepairRequested {
                            rejected: text,
                            reason,
                        },
                        Err(reason) => Decode::Rejected(reason),
                    }
                }
                Decode::RepairRequested { rejected, reason } => {
                    warn!(%reason, "structured output rejected, requesting repair");
                    repaired = true;
                    let repair = repair_prompt(prompt, &rejected, &reason, schema);
                    let text = self
                        .model
                        .complete(request(&repair, system, temperature, true))
                        .await?;
                    Decode::Raw(text)
                }
                Decode::Parsed(value) => return Ok(value),
                Decode::Rejected(reason) => {
                    warn!(%reason, "structured output rejected after repair");
                    return Err(LlmError::SchemaViolation(reason));
                }
            };
        }
    }
}

fn request(prompt: &str, system: Option<&str>, temperature: f32, json_mode: bool) -> CompletionRequest {
    CompletionRequest {
        system: system.map(str::to_string),
        prompt: prompt.to_string(),
        temperature,
        json_mode,
    }
}

fn decode<T: DeserializeOwned>(text: &str, schema: &Value) -> Result<T, String> {
    let body = extract_json_object(text).ok_or_else(|| "no JSON object found in reply".to_string())?;
    let value: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;
    check_schema(&value, schema)?;
    serde_json::from_value(value).map_err(|e| format!("unexpected shape: {}", e))
}

fn with_schema(prompt: &str, schema: &Value) -> String {
    format!("{}\n\nReturn ONLY valid JSON.\nSchema:\n{}", prompt, schema)
}

fn repair_prompt(original: &str, rejected: &str, reason: &str, schema: &Value) -> String {
    format!(
        "{original}\n\n\
         Your previous reply could not be used.\n\
         Previous reply:\n{rejected}\n\n\
         Problem: {reason}\n\n\
         Reply again with a single JSON object that matches this schema and nothing else:\n{schema}",
        original = original,
        rejected = truncate_for_log(rejected, 4000),
        reason = reason,
        schema = schema,
    )
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    struct Scripted {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Upstream("script exhausted".into())))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        answer: String,
    }

    fn schema() -> Value {
        json!({"type": "object", "required": ["answer"], "properties": {"answer": {"type": "string"}}})
    }

    #[tokio::test]
    async fn fenced_reply_parses_first_time() {
        let client = ReasoningClient::new(Scripted::new(vec![Ok(
            "```json\n{\"answer\": \"42\"}\n```".into(),
        )]));
        let out: Answer = client
            .generate_structured("q", Some("sys"), &schema(), 0.3)
            .await
            .unwrap();
        assert_eq!(out.answer, "42");
        assert_eq!(client.model().calls(), 1);
        let seen = client.model().seen.lock().unwrap();
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].system.as_deref(), Some("sys"));
        assert!(seen[0].prompt.starts_with("q\n\nReturn ONLY valid JSON."));
        assert!(seen[0].prompt.contains(&schema().to_string()));
    }

    #[tokio::test]
    async fn one_repair_pass_quotes_rejected_output() {
        let client = ReasoningClient::new(Scripted::new(vec![
            Ok("Sure! {\"answer\": 42}".into()),
            Ok("{\"answer\": \"42\"}".into()),
        ]));
        let out: Answer = client
            .generate_structured("q", None, &schema(), 0.3)
            .await
            .unwrap();
        assert_eq!(out, Answer { answer: "42".into() });
        let seen = client.model().seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].prompt.contains("Sure! {\"answer\": 42}"));
        assert!(seen[1].prompt.contains("/answer should be string"));
    }

    #[tokio::test]
    async fn second_rejection_is_schema_violation() {
        let client = ReasoningClient::new(Scripted::new(vec![
            Ok("not json".into()),
            Ok("still not json".into()),
            Ok("{\"answer\": \"late\"}".into()),
        ]));
        let err = client
            .generate_structured::<Answer>("q", None, &schema(), 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::SchemaViolation(_)));
        assert_eq!(client.model().calls(), 2);
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let client = ReasoningClient::new(Scripted::new(vec![Err(LlmError::Network("reset".into()))]));
        let err = client
            .generate_structured::<Answer>("q", None, &schema(), 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
    }

    #[tokio::test]
    async fn empty_free_text_is_upstream_error() {
        let client = ReasoningClient::new(Scripted::new(vec![Ok("  ".into())]));
        let err = client.generate("q", None, 0.2).await.unwrap_err();
        assert!(matches!(err, LlmError::Upstream(_)));
        assert!(!client.model().seen.lock().unwrap()[0].json_mode);
    }
}
