//! Reliability stages for the dendrite pipeline.
//!
//! Each type here implements [`Layer`](dendrite_core::pipeline::Layer) and
//! wraps the stage it is given with one more behaviour. None of them know
//! anything about providers, prompts or sessions; they only see
//! [`SynapseRequest`](dendrite_core::pipeline::SynapseRequest)s and
//! [`DendriteError`]s.
//!
//! | Layer              | Behaviour                                                     |
//! |--------------------|---------------------------------------------------------------|
//! | [`Retry`]          | re-run retryable failures, optionally with exponential backoff |
//! | [`Timeout`]        | bound the wall-clock time of everything inside it             |
//! | [`CircuitBreaker`] | stop calling after consecutive failures, probe after a pause  |
//! | [`RateLimit`]      | token bucket in front of the inner stage                      |
//! | [`Fallback`]       | run an alternate stage when the primary fails                 |
//! | [`ErrorHandler`]   | observe terminal errors before they propagate                 |
//!
//! Waiting (backoff, rate limiting) always races the request's cancellation
//! token.
use std::time::Duration;

use dendrite_core::{CancellationToken, DendriteError, Result};

pub mod circuit_breaker;
pub mod error_handler;
pub mod fallback;
pub mod rate_limit;
pub mod retry;
pub mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use error_handler::ErrorHandler;
pub use fallback::Fallback;
pub use rate_limit::{RateLimit, TokenBucket};
pub use retry::{Retry, RetryPolicy};
pub use timeout::Timeout;

/// Sleep for `duration` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DendriteError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use dendrite_core::{
        CancellationToken, DendriteError, Prompt, ProviderResponse, Result,
        error::ProviderError,
        pipeline::{Stage, SynapseRequest},
    };
    use futures_core::future::BoxFuture;

    pub fn request() -> SynapseRequest {
        SynapseRequest::new(
            "test",
            Prompt::new("task", "{}"),
            0.1,
            Vec::new(),
            CancellationToken::new(),
        )
    }

    pub fn unavailable() -> DendriteError {
        ProviderError::Status {
            status: 503,
            body: "unavailable".into(),
        }
        .into()
    }

    /// Fails with the errors produced by `fail` for the first `failures`
    /// calls, then answers `"ok"`.
    pub struct Flaky {
        failures: usize,
        fail: fn() -> DendriteError,
        pub calls: AtomicUsize,
    }

    impl Flaky {
        pub fn new(failures: usize, fail: fn() -> DendriteError) -> Arc<Self> {
            Arc::new(Self {
                failures,
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Stage for Flaky {
        fn process<'a>(
            &'a self,
            mut request: SynapseRequest,
        ) -> BoxFuture<'a, Result<SynapseRequest>> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call < self.failures {
                    return Err((self.fail)());
                }
                request.response = Some(ProviderResponse::text("ok"));
                Ok(request)
            })
        }
    }
}
