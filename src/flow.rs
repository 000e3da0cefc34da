use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::config::Config;
use crate::facts::FactsClient;
use crate::http::{HttpExecutor, Transport};
use crate::providers::gateway::{GatewayClient, GatewayMessage};
use crate::providers::openai::OpenAiClient;

const FUNCTION_CALL_PROMPT: &str = "Tell me a random fact and add a short comment about it.";
const GATEWAY_PROMPT: &str = "Give me a random fact";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Completion,
    FunctionCall,
    Gateway,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::FunctionCall => "function-call",
            Self::Gateway => "gateway",
        }
    }

    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw
            .unwrap_or("completion")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "completion" => Ok(Self::Completion),
            "function-call" | "functions" => Ok(Self::FunctionCall),
            "gateway" => Ok(Self::Gateway),
            other => {
                warn!(flow = %other, "unsupported flow requested");
                Err(anyhow!(
                    "Unsupported flow '{}'. Supported flows: completion, function-call, gateway.",
                    other
                ))
            }
        }
    }
}

pub async fn run_flow<T>(flow: Flow, executor: &HttpExecutor<T>, cfg: &Config) -> Result<String>
where
    T: Transport,
{
    info!(flow = flow.as_str(), "running flow");
    match flow {
        Flow::Completion => {
            let fact = FactsClient::new(executor, &cfg.facts_url).random_fact().await;
            let answer = OpenAiClient::new(executor, cfg).complete(&fact).await?;
            Ok(render_commentary(Some(&fact), &answer))
        }
        Flow::FunctionCall => {
            let mut agent = Agent::new(executor, cfg);
            let outcome = agent.run_turn(FUNCTION_CALL_PROMPT).await?;
            Ok(render_commentary(outcome.fact.as_deref(), &outcome.answer))
        }
        Flow::Gateway => {
            let fact = GatewayClient::new(executor, cfg)
                .random_fact(&cfg.gateway_app, &[GatewayMessage::user(GATEWAY_PROMPT)])
                .await?;
            Ok(format!("\n{fact}\n"))
        }
    }
}

fn render_commentary(fact: Option<&str>, answer: &str) -> String {
    let mut out = String::new();
    if let Some(fact) = fact {
        out.push_str(&format!("\nFact from API:\n {fact}\n\n"));
    }
    out.push_str(&format!("OpenAI's response:\n {}\n", answer.trim()));
    out
}
