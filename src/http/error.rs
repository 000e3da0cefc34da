use std::error::Error as StdError;
use std::io::ErrorKind;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("{message}")]
    Transport {
        url: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("Request to '{url}' failed with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
    #[error("Max retries exceeded: {message}")]
    MaxRetriesExceeded {
        message: String,
        #[source]
        last: Box<ExecutorError>,
    },
    #[error("Refusal detected: {message}")]
    RefusalDetected {
        message: String,
        #[source]
        source: Box<ExecutorError>,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

impl ExecutorError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str, timeout_secs: u64) -> Self {
        let message = describe_transport_error(&err, url, timeout_secs);
        Self::Transport {
            url: url.to_string(),
            message,
            source: Some(err),
        }
    }

    fn innermost(&self) -> &Self {
        match self {
            Self::MaxRetriesExceeded { last, .. } => last.innermost(),
            Self::RefusalDetected { source, .. } => source.innermost(),
            other => other,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response_parts().map(|(status, _, _)| status)
    }

    /// Status, headers and body of the failed response, looking through
    /// retry and refusal wrappers.
    pub fn response_parts(&self) -> Option<(StatusCode, &HeaderMap, &str)> {
        match self.innermost() {
            Self::HttpStatus {
                status,
                headers,
                body,
                ..
            } => Some((*status, headers, body.as_str())),
            _ => None,
        }
    }
}

pub(crate) fn log_call_failure(service: &str, url: &str, err: &ExecutorError) {
    match err.response_parts() {
        Some((status, headers, body)) => warn!(
            service,
            api_url = %url,
            status = %status,
            headers = ?headers,
            body = %body,
            "api returned an error response"
        ),
        None => warn!(service, api_url = %url, error = %err, "api request failed"),
    }
}

fn error_chain_has(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current = Some(err);
    while let Some(cause) = current {
        let kind_matches = cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io_err| io_err.kind() == kind);
        if kind_matches || cause.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = cause.source();
    }
    false
}

fn describe_transport_error(err: &reqwest::Error, url: &str, timeout_secs: u64) -> String {
    if err.is_timeout() || error_chain_has(err, ErrorKind::TimedOut, "timed out") {
        return format!(
            "Request to '{}' timed out after {}s. \
             Increase HTTP_TIMEOUT_SECS or check the endpoint's responsiveness.",
            url, timeout_secs
        );
    }

    if err.is_connect() {
        if error_chain_has(err, ErrorKind::ConnectionRefused, "connection refused") {
            return format!(
                "Connection refused by '{}'. Ensure the service is running and the URL is correct.",
                url
            );
        }

        return format!(
            "Failed to connect to '{}'. Check the URL and network connectivity.",
            url
        );
    }

    format!("Failed to call '{}': {}", url, err)
}
