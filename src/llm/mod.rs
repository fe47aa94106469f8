pub mod client;
pub mod model;
pub mod openai;
pub mod schema;

pub use client::ReasoningClient;
pub use model::{CompletionRequest, LanguageModel};
pub use openai::OpenAiCompatibleModel;
