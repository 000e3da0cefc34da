use tracing::{debug, warn};

use crate::http::error::ExecutorError;
use crate::http::refusal::RefusalRule;
use crate::http::request::RequestSpec;
use crate::http::response::HttpResponse;
use crate::http::retry::{RetryDecision, RetryPolicy};
use crate::http::transport::{ReqwestTransport, Transport};

#[derive(Debug, Clone)]
pub struct HttpExecutor<T = ReqwestTransport> {
    transport: T,
    refusal: RefusalRule,
}

impl HttpExecutor<ReqwestTransport> {
    pub fn new(timeout_secs: u64) -> Result<Self, ExecutorError> {
        Ok(Self::with_transport(ReqwestTransport::new(timeout_secs)?))
    }
}

impl<T> HttpExecutor<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            refusal: RefusalRule::default(),
        }
    }

    pub fn with_refusal_rule(mut self, refusal: RefusalRule) -> Self {
        self.refusal = refusal;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T> HttpExecutor<T>
where
    T: Transport,
{
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        policy: RetryPolicy,
    ) -> Result<HttpResponse, ExecutorError> {
        let mut policy = policy;

        loop {
            let err = match self.transport.send(spec).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            // Fails identically on every attempt.
            if matches!(
                err,
                ExecutorError::InvalidRequest(_) | ExecutorError::ClientInit(_)
            ) {
                return Err(err);
            }

            let message = err.to_string();
            if self.refusal.matches(&message) {
                warn!(
                    method = spec.method.as_str(),
                    url = %spec.url,
                    marker = self.refusal.marker(),
                    "refusal detected, not retrying"
                );
                return Err(ExecutorError::RefusalDetected {
                    message,
                    source: Box::new(err),
                });
            }

            match policy.decide() {
                RetryDecision::Exhausted => {
                    warn!(
                        method = spec.method.as_str(),
                        url = %spec.url,
                        error = %message,
                        "retry budget exhausted"
                    );
                    return Err(ExecutorError::MaxRetriesExceeded {
                        message,
                        last: Box::new(err),
                    });
                }
                RetryDecision::Propagate => {
                    debug!(
                        url = %spec.url,
                        attempts_remaining = policy.attempts,
                        mode = policy.mode.as_str(),
                        "propagating failure without retry"
                    );
                    return Err(err);
                }
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        method = spec.method.as_str(),
                        url = %spec.url,
                        error = %message,
                        attempts_remaining = policy.attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    policy = policy.next();
                }
            }
        }
    }
}
