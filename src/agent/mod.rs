mod functions;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::facts::FactsClient;
use crate::http::{HttpExecutor, Transport};
use crate::model::Message;
use crate::providers::openai::OpenAiClient;

pub use functions::{GET_RANDOM_FACT, available_functions};

const SYSTEM_PROMPT: &str = "You are a cheerful trivia companion. When the user asks for a fact, \
call get_random_fact and then comment on the fact it returns.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAnswer {
    pub fact: Option<String>,
    pub answer: String,
}

pub struct Agent<'a, T> {
    openai: OpenAiClient<'a, T>,
    facts: FactsClient<'a, T>,
    history: Vec<Message>,
}

impl<'a, T> Agent<'a, T>
where
    T: Transport,
{
    pub fn new(executor: &'a HttpExecutor<T>, cfg: &'a Config) -> Self {
        Self {
            openai: OpenAiClient::new(executor, cfg),
            facts: FactsClient::new(executor, &cfg.facts_url),
            history: vec![Message::system(SYSTEM_PROMPT)],
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub async fn run_turn(&mut self, user_input: &str) -> Result<AgentAnswer> {
        self.history.push(Message::user(user_input));
        let functions = available_functions();

        let first = self.openai.chat(&self.history, &functions).await?;
        let Some(call) = first.function_call.clone() else {
            debug!("model answered without nominating a function");
            let answer = first.content_str().trim().to_string();
            self.history.push(first);
            return Ok(AgentAnswer { fact: None, answer });
        };
        self.history.push(first);

        info!(function = %call.name, "model nominated function");
        let (fact, result) = match call.name.as_str() {
            GET_RANDOM_FACT => {
                let fact = self.facts.random_fact().await;
                (Some(fact.clone()), fact)
            }
            other => (None, format!("ERROR: unknown function '{other}'")),
        };
        self.history.push(Message::function(call.name, result));

        let last = self.openai.chat(&self.history, &functions).await?;
        let answer = last.content_str().trim().to_string();
        self.history.push(last);
        Ok(AgentAnswer { fact, answer })
    }
}
