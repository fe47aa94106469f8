//! Process-wide configuration.
//!
//! Built once at startup by [`Config::from_env`] and handed by reference to the
//! reasoning client, the tool adapters and the executor. Nothing below the
//! binary reads the environment.
//!
//! - `GEMINI_API_KEY` or `LLM_API_KEY` - Required. Credential for the model endpoint.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to Gemini's.
//! - `LLM_MODEL` - Optional. Defaults to `gemini-2.5-flash`.
//! - `LLM_TIMEOUT_SECS` - Optional. Defaults to `60`.
//! - `GITHUB_TOKEN`, `OPENWEATHER_API_KEY`, `NEWS_API_KEY`, `EXCHANGE_API_KEY` - Optional tool credentials.
//! - `TOOL_TIMEOUT_SECS` - Optional. Defaults to `10`.
//! - `RETRY_DELAY_MS` - Optional. Delay between step attempts. Defaults to `1000`.
//! - `MAX_REFINEMENTS` - Optional. Re-plan rounds on a retry verdict. Defaults to `1`.
//! - `API_HOST`, `API_PORT` - Optional. REST bind address. Defaults to `localhost:8000`.
//!
//! The binaries call [`load_env_file`] first so a `.env` file can supply any
//! of these. Variables already set in the process win over the file.

use std::{path::Path, time::Duration};

use thiserror::Error;

pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Model endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: 2048,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Optional upstream credentials. A missing key switches the matching adapter
/// to its fallback path instead of failing.
#[derive(Debug, Clone, Default)]
pub struct ToolCredentials {
    pub github_token: Option<String>,
    pub openweather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub exchange_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Attempts per step, first call included.
    pub max_attempts: u32,
    /// Constant pause between attempts.
    pub retry_delay: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub credentials: ToolCredentials,
    pub tool_timeout: Duration,
    pub executor: ExecutorConfig,
    pub max_refinements: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no model credential is set and
    /// `ConfigError::InvalidValue` for unparseable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_opt("GEMINI_API_KEY")
            .or_else(|| env_opt("LLM_API_KEY"))
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let mut llm = LlmConfig::new(api_key);
        if let Some(base_url) = env_opt("LLM_BASE_URL") {
            llm.base_url = base_url;
        }
        if let Some(model) = env_opt("LLM_MODEL") {
            llm.model = model;
        }
        llm.timeout = Duration::from_secs(env_parse("LLM_TIMEOUT_SECS", 60)?);

        let credentials = ToolCredentials {
            github_token: env_opt("GITHUB_TOKEN"),
            openweather_api_key: env_opt("OPENWEATHER_API_KEY"),
            news_api_key: env_opt("NEWS_API_KEY"),
            exchange_api_key: env_opt("EXCHANGE_API_KEY"),
        };

        let executor = ExecutorConfig {
            retry_delay: Duration::from_millis(env_parse("RETRY_DELAY_MS", 1000)?),
            ..ExecutorConfig::default()
        };

        Ok(Self {
            llm,
            credentials,
            tool_timeout: Duration::from_secs(env_parse("TOOL_TIMEOUT_SECS", 10)?),
            executor,
            max_refinements: env_parse("MAX_REFINEMENTS", 1)?,
            host: env_opt("API_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: env_parse("API_PORT", 8000)?,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(llm: LlmConfig, credentials: ToolCredentials) -> Self {
        Self {
            llm,
            credentials,
            tool_timeout: Duration::from_secs(10),
            executor: ExecutorConfig::default(),
            max_refinements: 1,
            host: "localhost".to_string(),
            port: 8000,
        }
    }
}

/// Loads `.env` from the working directory or its parents, or `path` when
/// given. A missing file is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Err(e) if !e.not_found() => Err(ConfigError::InvalidValue(".env".to_string(), e.to_string())),
        _ => Ok(()),
    }
}

/// Unset and empty variables are both treated as absent.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let mut llm = LlmConfig::new("k");
        llm.base_url = "http://localhost:11434/v1/".to_string();
        assert_eq!(llm.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn parse_value_reports_variable_name() {
        let err = parse_value::<u16>("API_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "API_PORT"));
        assert_eq!(parse_value::<u64>("RETRY_DELAY_MS", "250").unwrap(), 250);
    }

    #[test]
    fn env_file_fills_unset_variables() {
        let path = std::env::temp_dir().join(format!("opsagent-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, "OPSAGENT_TEST_DOTENV_KEY=from-file\n").unwrap();

        load_env_file(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(env_opt("OPSAGENT_TEST_DOTENV_KEY").as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let path = std::env::temp_dir().join(format!("opsagent-{}.env", uuid::Uuid::new_v4()));
        assert!(load_env_file(Some(&path)).is_ok());
    }

    #[test]
    fn executor_defaults_to_three_attempts_one_second_apart() {
        let executor = ExecutorConfig::default();
        assert_eq!(executor.max_attempts, 3);
        assert_eq!(executor.retry_delay, Duration::from_secs(1));
    }
}
