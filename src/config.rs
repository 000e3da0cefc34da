use std::env;
use std::fmt;
use std::time::Duration;

use crate::http::retry::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS, RetryMode, RetryPolicy};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_FACTS_URL: &str = "https://uselessfacts.jsph.pl/api/v2/facts/random";
pub const DEFAULT_GATEWAY_BASE_URL: &str = "http://localhost:5500";
pub const DEFAULT_GATEWAY_APP: &str = "Random-Fact";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_BACKOFF: bool = false;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("No OpenAI API key found. Set {0} in the environment or a .env file.")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub completion_model: String,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub facts_url: String,
    pub gateway_api_key: Option<String>,
    pub gateway_base_url: String,
    pub gateway_app: String,
    pub http_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("completion_model", &self.completion_model)
            .field("chat_model", &self.chat_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("facts_url", &self.facts_url)
            .field(
                "gateway_api_key",
                &self.gateway_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gateway_base_url", &self.gateway_base_url)
            .field("gateway_app", &self.gateway_app)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with(
        mut get_var: impl FnMut(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let openai_api_key =
            non_empty(get_var("OPENAI_API_KEY")).ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let retry = RetryPolicy {
            attempts: parse_u32(get_var("RETRY_ATTEMPTS").as_deref(), DEFAULT_RETRY_ATTEMPTS),
            delay: Duration::from_millis(parse_u64(
                get_var("RETRY_DELAY_MS").as_deref(),
                DEFAULT_RETRY_DELAY_MS,
            )),
            mode: if parse_bool(get_var("RETRY_BACKOFF").as_deref(), DEFAULT_RETRY_BACKOFF) {
                RetryMode::Backoff
            } else {
                RetryMode::FailFast
            },
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: non_empty(get_var("OPENAI_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            completion_model: non_empty(get_var("COMPLETION_MODEL"))
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            chat_model: non_empty(get_var("CHAT_MODEL"))
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            max_tokens: parse_positive_u32(get_var("MAX_TOKENS").as_deref(), DEFAULT_MAX_TOKENS),
            temperature: parse_temperature(get_var("TEMPERATURE").as_deref()),
            facts_url: non_empty(get_var("FACTS_URL"))
                .unwrap_or_else(|| DEFAULT_FACTS_URL.to_string()),
            gateway_api_key: non_empty(get_var("NEXUSAI_API_KEY")),
            gateway_base_url: non_empty(get_var("GATEWAY_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string()),
            gateway_app: non_empty(get_var("GATEWAY_APP"))
                .unwrap_or_else(|| DEFAULT_GATEWAY_APP.to_string()),
            http_timeout_secs: parse_positive_u64(
                get_var("HTTP_TIMEOUT_SECS").as_deref(),
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            retry,
        })
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_temperature(raw: Option<&str>) -> f32 {
    raw.and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| (0.0..=2.0).contains(value))
        .unwrap_or(DEFAULT_TEMPERATURE)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
