use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{ExecutorError, HttpExecutor, RequestSpec, RetryPolicy, Transport};

pub const FACT_UNAVAILABLE: &str = "Could not retrieve a random fact.";

#[derive(Debug, Deserialize)]
struct FactBody {
    text: String,
}

pub struct FactsClient<'a, T> {
    executor: &'a HttpExecutor<T>,
    facts_url: String,
    retry: RetryPolicy,
}

impl<'a, T> FactsClient<'a, T>
where
    T: Transport,
{
    pub fn new(executor: &'a HttpExecutor<T>, facts_url: impl Into<String>) -> Self {
        Self {
            executor,
            facts_url: facts_url.into(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn facts_url(&self) -> &str {
        &self.facts_url
    }

    pub async fn random_fact(&self) -> String {
        let headers = BTreeMap::from([("Accept".to_string(), "application/json".to_string())]);
        self.fact_from(&self.facts_url, headers).await
    }

    /// GETs `url` with `headers` and returns its `text` field, or
    /// [`FACT_UNAVAILABLE`] on any failure.
    pub async fn fact_from(&self, url: &str, headers: BTreeMap<String, String>) -> String {
        match self.try_fact_from(url, headers).await {
            Ok(fact) => fact,
            Err(err) => {
                warn!(url = %url, error = %err, "error getting random fact");
                FACT_UNAVAILABLE.to_string()
            }
        }
    }

    async fn try_fact_from(
        &self,
        url: &str,
        headers: BTreeMap<String, String>,
    ) -> Result<String, ExecutorError> {
        let spec = RequestSpec::get(url).with_headers(headers);
        let response = self.executor.execute(&spec, self.retry).await?;
        let body: FactBody = response.json()?;
        debug!(url = %url, fact_len = body.text.len(), "received random fact");
        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{FACT_UNAVAILABLE, FactsClient};
    use crate::http::HttpExecutor;

    fn executor() -> HttpExecutor {
        HttpExecutor::new(5).expect("executor should build")
    }

    #[tokio::test]
    async fn random_fact_returns_text_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/facts/random")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","text":"Bananas are berries.","language":"en"}"#)
            .create_async()
            .await;

        let executor = executor();
        let facts = FactsClient::new(&executor, format!("{}/api/v2/facts/random", server.url()));
        let fact = facts.random_fact().await;

        mock.assert_async().await;
        assert_eq!(fact, "Bananas are berries.");
    }

    #[tokio::test]
    async fn connection_error_yields_placeholder() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);

        let executor = executor();
        let facts = FactsClient::new(&executor, format!("http://{addr}/api/v2/facts/random"));

        assert_eq!(facts.random_fact().await, FACT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn error_status_and_missing_text_yield_placeholder() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/down")
            .with_status(500)
            .create_async()
            .await;
        let shapeless = server
            .mock("GET", "/odd")
            .with_status(200)
            .with_body(r#"{"fact":"wrong field"}"#)
            .create_async()
            .await;

        let executor = executor();
        let facts = FactsClient::new(&executor, format!("{}/down", server.url()));
        assert_eq!(facts.random_fact().await, FACT_UNAVAILABLE);
        assert_eq!(
            facts
                .fact_from(&format!("{}/odd", server.url()), BTreeMap::new())
                .await,
            FACT_UNAVAILABLE
        );

        failing.assert_async().await;
        shapeless.assert_async().await;
    }

    #[tokio::test]
    async fn fact_from_forwards_supplied_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/random")
            .match_header("x-gateway-token", "abc")
            .with_status(200)
            .with_body(r#"{"text":"Octopuses have three hearts."}"#)
            .create_async()
            .await;

        let executor = executor();
        let facts = FactsClient::new(&executor, "http://unused.invalid");
        let headers = BTreeMap::from([("X-Gateway-Token".to_string(), "abc".to_string())]);
        let fact = facts
            .fact_from(&format!("{}/random", server.url()), headers)
            .await;

        mock.assert_async().await;
        assert_eq!(fact, "Octopuses have three hearts.");
    }
}
