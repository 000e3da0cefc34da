use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::facts::{FACT_UNAVAILABLE, FactsClient};
use crate::http::error::log_call_failure;
use crate::http::{ExecutorError, HttpExecutor, HttpResponse, RequestSpec, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayMessage {
    pub sender: String,
    pub content: String,
}

impl GatewayMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    FactUrl(String),
    FactHeaders(BTreeMap<String, String>),
}

impl GatewayReply {
    pub fn from_body(body: &Value) -> Result<Self, ExecutorError> {
        if let Some(url) = body.pointer("/messages/0/data/url").and_then(Value::as_str) {
            return Ok(Self::FactUrl(url.to_string()));
        }

        if let Some(data) = body
            .pointer("/responseMessages/0/data")
            .and_then(Value::as_object)
        {
            let headers = data
                .iter()
                .filter_map(|(name, value)| header_value(value).map(|v| (name.clone(), v)))
                .collect();
            return Ok(Self::FactHeaders(headers));
        }

        Err(ExecutorError::Decode(
            "gateway reply has neither messages[0].data.url nor responseMessages[0].data"
                .to_string(),
        ))
    }
}

fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn conversation_url(base_url: &str, app: &str) -> String {
    format!(
        "{}/api/application/{}/conversation",
        base_url.trim_end_matches('/'),
        app
    )
}

pub struct GatewayClient<'a, T> {
    executor: &'a HttpExecutor<T>,
    cfg: &'a Config,
}

impl<'a, T> GatewayClient<'a, T>
where
    T: Transport,
{
    pub fn new(executor: &'a HttpExecutor<T>, cfg: &'a Config) -> Self {
        Self { executor, cfg }
    }

    pub async fn converse(&self, app: &str, messages: &[GatewayMessage]) -> Result<GatewayReply> {
        let url = conversation_url(&self.cfg.gateway_base_url, app);
        let mut spec = RequestSpec::post(&url).with_payload(json!({ "messages": messages }));
        match self.cfg.gateway_api_key.as_deref() {
            Some(token) => spec = spec.with_bearer_token(token),
            None => warn!(app = %app, "NEXUSAI_API_KEY is not set; calling gateway without auth"),
        }

        debug!(
            url = %url,
            message_count = messages.len(),
            "sending gateway conversation"
        );
        let response: HttpResponse = self
            .executor
            .execute(&spec, self.cfg.retry)
            .await
            .map_err(|err| {
                log_call_failure("gateway", &url, &err);
                anyhow::Error::new(err)
            })
            .with_context(|| format!("Error calling gateway application '{app}'"))?;

        GatewayReply::from_body(&response.body)
            .map_err(|err| anyhow!(err))
            .with_context(|| format!("Unexpected reply from gateway application '{app}'"))
    }

    pub async fn random_fact(&self, app: &str, messages: &[GatewayMessage]) -> Result<String> {
        let reply = self.converse(app, messages).await?;
        let facts = FactsClient::new(self.executor, &self.cfg.facts_url);

        let fact = match reply {
            GatewayReply::FactUrl(url) => {
                info!(url = %url, "gateway returned fact url");
                let headers =
                    BTreeMap::from([("Accept".to_string(), "application/json".to_string())]);
                facts.fact_from(&url, headers).await
            }
            GatewayReply::FactHeaders(headers) => {
                info!(header_count = headers.len(), "gateway returned fact headers");
                facts.fact_from(facts.facts_url(), headers).await
            }
        };

        if fact == FACT_UNAVAILABLE {
            debug!(app = %app, "falling back to placeholder fact");
        }
        Ok(fact)
    }
}
