use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use dendrite_core::{
    CancellationToken, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;
use tokio::time::Instant;

use crate::sleep_or_cancel;

/// A token bucket rate limiter.
///
/// Starts full at `capacity` tokens and refills at `refill_rate` tokens per
/// second. [`TokenBucket::acquire`] waits until a token is available, then
/// consumes one. A zero, negative or NaN rate never refills: once the burst
/// is spent, callers wait until they are cancelled.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        let capacity = capacity.max(1.0);
        Self {
            capacity,
            // `max` also maps NaN to zero.
            refill_rate: refill_rate.max(0.0),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take a token if one is available, otherwise report how long until one
    /// will be.
    fn try_take(&self) -> std::result::Result<(), Duration> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let secs = (1.0 - state.tokens) / self.refill_rate;
            Err(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        }
    }

    /// Wait for a token, giving up with `Cancelled` if `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            match self.try_take() {
                Ok(()) => return Ok(()),
                Err(wait) => sleep_or_cancel(cancel, wait).await?,
            }
        }
    }
}

/// Throttles calls to `requests_per_second`, allowing bursts of `burst`.
/// Pipelines built from the same layer share one bucket.
#[derive(Debug, Clone)]
pub struct RateLimit {
    bucket: Arc<TokenBucket>,
}

impl RateLimit {
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        Self {
            bucket: Arc::new(TokenBucket::new(f64::from(burst), requests_per_second)),
        }
    }
}

impl Layer for RateLimit {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(RateLimitStage {
            inner,
            bucket: Arc::clone(&self.bucket),
        })
    }
}

struct RateLimitStage {
    inner: Arc<dyn Stage>,
    bucket: Arc<TokenBucket>,
}

impl Stage for RateLimitStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            self.bucket.acquire(&request.cancel).await?;
            self.inner.process(request).await
        })
    }
}
