use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use tracing::{debug, warn};

use crate::http::error::ExecutorError;
use crate::http::query::to_query_pairs;
use crate::http::request::{Method, RequestSpec};
use crate::http::response::HttpResponse;

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, ExecutorError>> + 'a>>;

pub trait Transport {
    fn send<'a>(&'a self, spec: &'a RequestSpec) -> TransportFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, ExecutorError> {
        Self::from_builder(Client::builder(), timeout_secs)
    }

    pub fn from_builder(
        builder: ClientBuilder,
        timeout_secs: u64,
    ) -> Result<Self, ExecutorError> {
        let client = builder
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(ExecutorError::ClientInit)?;
        Ok(Self::with_client(client, timeout_secs))
    }

    pub fn with_client(client: Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    fn build(&self, spec: &RequestSpec) -> Result<RequestBuilder, ExecutorError> {
        let headers = to_header_map(spec)?;
        let builder = match spec.method {
            Method::Get => {
                let pairs = to_query_pairs(&spec.payload)?;
                let builder = self.client.get(&spec.url);
                if pairs.is_empty() {
                    builder
                } else {
                    builder.query(&pairs)
                }
            }
            Method::Post => with_json_body(self.client.post(&spec.url), spec),
            Method::Delete => with_json_body(self.client.delete(&spec.url), spec),
        };
        Ok(builder.headers(headers))
    }

    async fn send_once(&self, spec: &RequestSpec) -> Result<HttpResponse, ExecutorError> {
        let request = self.build(spec)?;
        debug!(
            method = spec.method.as_str(),
            url = %spec.url,
            header_count = spec.headers.len(),
            "sending http request"
        );

        let response = request.send().await.map_err(|err| {
            warn!(
                method = spec.method.as_str(),
                url = %spec.url,
                error = %err,
                "http request failed"
            );
            ExecutorError::from_reqwest(err, &spec.url, self.timeout_secs)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ExecutorError::from_reqwest(err, &spec.url, self.timeout_secs))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!(
                method = spec.method.as_str(),
                url = %spec.url,
                status = %status,
                response_body_len = body.len(),
                "http request returned non-success status"
            );
            return Err(ExecutorError::HttpStatus {
                url: spec.url.clone(),
                status,
                headers,
                body,
            });
        }

        debug!(
            url = %spec.url,
            status = %status,
            response_len = bytes.len(),
            "received http response"
        );
        Ok(HttpResponse::new(
            status,
            headers,
            HttpResponse::body_from_bytes(&bytes),
        ))
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, spec: &'a RequestSpec) -> TransportFuture<'a> {
        Box::pin(self.send_once(spec))
    }
}

fn with_json_body(builder: RequestBuilder, spec: &RequestSpec) -> RequestBuilder {
    if spec.payload.is_null() {
        builder
    } else {
        builder.json(&spec.payload)
    }
}

fn to_header_map(spec: &RequestSpec) -> Result<HeaderMap, ExecutorError> {
    let mut headers = HeaderMap::with_capacity(spec.headers.len());
    for (name, value) in &spec.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ExecutorError::InvalidRequest(format!("invalid header name '{name}'"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            ExecutorError::InvalidRequest(format!("invalid value for header '{name}'"))
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
