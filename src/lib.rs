pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod message;
pub mod prompt;
pub mod tools;
pub mod utils;

pub use agent::{Orchestrator, TaskReport};
pub use config::Config;
pub use error::{Error, Result};
pub use input::Task;
