use std::{sync::Arc, time::Duration};

use dendrite_core::{
    DendriteError, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;

/// Fails with [`DendriteError::Timeout`] when the wrapped stage takes longer
/// than `duration`. The inner future is dropped, abandoning any in-flight
/// provider call.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Layer for Timeout {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(TimeoutStage {
            inner,
            duration: self.duration,
        })
    }
}

struct TimeoutStage {
    inner: Arc<dyn Stage>,
    duration: Duration,
}

impl Stage for TimeoutStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            let request_id = request.id;
            match tokio::time::timeout(self.duration, self.inner.process(request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        %request_id,
                        timeout_ms = self.duration.as_millis() as u64,
                        "call timed out"
                    );
                    Err(DendriteError::Timeout(self.duration))
                }
            }
        })
    }
}
