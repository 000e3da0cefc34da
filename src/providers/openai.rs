use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::http::error::log_call_failure;
use crate::http::{HttpExecutor, HttpResponse, RequestSpec, RetryPolicy, Transport};
use crate::model::{FunctionSpec, Message};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "no_functions")]
    functions: &'a [FunctionSpec],
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Message,
}

fn no_functions(functions: &&[FunctionSpec]) -> bool {
    functions.is_empty()
}

fn completions_url(base_url: &str) -> String {
    format!("{}/v1/completions", base_url.trim_end_matches('/'))
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

pub fn fact_prompt(fact: &str) -> String {
    format!(
        "Here is a fun fact: \"{fact}\". Can you provide a creative comment or additional information about it?"
    )
}

pub struct OpenAiClient<'a, T> {
    executor: &'a HttpExecutor<T>,
    cfg: &'a Config,
    retry: RetryPolicy,
}

impl<'a, T> OpenAiClient<'a, T>
where
    T: Transport,
{
    pub fn new(executor: &'a HttpExecutor<T>, cfg: &'a Config) -> Self {
        Self {
            executor,
            cfg,
            retry: cfg.retry,
        }
    }

    pub async fn complete(&self, fact: &str) -> Result<String> {
        let body = CompletionRequest {
            model: &self.cfg.completion_model,
            prompt: fact_prompt(fact),
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
        };
        let response = self
            .post(completions_url(&self.cfg.openai_base_url), &body)
            .await?;

        let parsed: CompletionResponse = response
            .json()
            .context("Failed to parse completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Completion response contained no choices"))?;
        debug!(
            model = %self.cfg.completion_model,
            response_len = choice.text.len(),
            "received completion"
        );
        Ok(choice.text.trim().to_string())
    }

    pub async fn chat(&self, messages: &[Message], functions: &[FunctionSpec]) -> Result<Message> {
        let body = ChatRequest {
            model: &self.cfg.chat_model,
            messages,
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
            functions,
            function_call: (!functions.is_empty()).then_some("auto"),
        };
        debug!(
            model = %self.cfg.chat_model,
            message_count = messages.len(),
            function_count = functions.len(),
            "dispatching chat request"
        );
        let response = self
            .post(chat_completions_url(&self.cfg.openai_base_url), &body)
            .await?;

        let parsed: ChatResponse = response
            .json()
            .context("Failed to parse chat completion response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow!("Chat completion response contained no choices"))
    }

    async fn post<B: Serialize>(&self, url: String, body: &B) -> Result<HttpResponse> {
        let payload = serde_json::to_value(body).context("Failed to encode model request")?;
        let spec = RequestSpec::post(&url)
            .with_bearer_token(&self.cfg.openai_api_key)
            .with_header("Content-Type", "application/json")
            .with_payload(payload);

        self.executor
            .execute(&spec, self.retry)
            .await
            .map_err(|err| {
                log_call_failure("openai", &url, &err);
                anyhow::Error::new(err).context("Error calling OpenAI API")
            })
    }
}
