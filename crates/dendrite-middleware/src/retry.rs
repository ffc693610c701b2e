//! Retry with optional exponential backoff.
//!
//! Only errors for which [`DendriteError::is_retryable`] holds are repeated;
//! everything else (including cancellation) propagates immediately. When the
//! attempts run out, the error of the last attempt is returned unchanged.
use std::{sync::Arc, time::Duration};

use dendrite_core::{
    DendriteError, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;

use crate::sleep_or_cancel;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included. Never below 1.
    pub max_attempts: u32,
    /// Pause before the second attempt. Zero retries immediately.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Immediate retries, no pause between attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Exponential backoff starting at `initial_backoff`, doubling per attempt.
    pub fn exponential(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self::new(max_attempts).with_initial_backoff(initial_backoff)
    }

    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pause before attempt `attempt + 1`, where `attempt` counts from 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_backoff.as_secs_f64() * factor).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Layer form of [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Retry {
    policy: RetryPolicy,
}

impl Retry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl Layer for Retry {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(RetryStage {
            inner,
            policy: self.policy.clone(),
        })
    }
}

struct RetryStage {
    inner: Arc<dyn Stage>,
    policy: RetryPolicy,
}

impl Stage for RetryStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            let max_attempts = self.policy.max_attempts.max(1);
            let mut attempt = 1;
            loop {
                if request.is_cancelled() {
                    return Err(DendriteError::Cancelled);
                }

                let err = match self.inner.process(request.clone()).await {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }

                let wait = err
                    .retry_after()
                    .unwrap_or_else(|| self.policy.backoff(attempt));
                tracing::warn!(
                    request_id = %request.id,
                    synapse = request.synapse,
                    attempt,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "retrying failed call"
                );
                if !wait.is_zero() {
                    sleep_or_cancel(&request.cancel, wait).await?;
                }
                attempt += 1;
            }
        })
    }
}
