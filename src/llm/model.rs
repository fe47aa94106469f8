use std::sync::Arc;

use async_trait::async_trait;

use crate::error::llm_error::LlmError;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the backend to constrain output to a JSON object.
    pub json_mode: bool,
}

/// A hosted model behind a single request/response call. Implementations are
/// stateless between calls apart from their credential.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }
}
