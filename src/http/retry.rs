use std::time::Duration;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    FailFast,
    Backoff,
}

impl RetryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::Backoff => "backoff",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Exhausted,
    Propagate,
    RetryAfter(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            mode: RetryMode::FailFast,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            ..Self::default()
        }
    }

    pub fn backoff(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            mode: RetryMode::Backoff,
        }
    }

    pub fn decide(&self) -> RetryDecision {
        if self.attempts == 0 {
            return RetryDecision::Exhausted;
        }

        match self.mode {
            RetryMode::FailFast => RetryDecision::Propagate,
            RetryMode::Backoff => RetryDecision::RetryAfter(self.delay),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            attempts: self.attempts.saturating_sub(1),
            delay: self.delay.saturating_mul(2),
            mode: self.mode,
        }
    }
}
