use std::sync::Arc;

use dendrite_core::{
    DendriteError, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;

/// Sends the original request to `alternate` when the wrapped stage fails.
///
/// Cancellation is never masked: a cancelled call stays cancelled. If the
/// alternate fails too, its error is returned.
#[derive(Clone)]
pub struct Fallback {
    alternate: Arc<dyn Stage>,
}

impl Fallback {
    pub fn new(alternate: Arc<dyn Stage>) -> Self {
        Self { alternate }
    }
}

impl Layer for Fallback {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(FallbackStage {
            primary: inner,
            alternate: Arc::clone(&self.alternate),
        })
    }
}

struct FallbackStage {
    primary: Arc<dyn Stage>,
    alternate: Arc<dyn Stage>,
}

impl Stage for FallbackStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            match self.primary.process(request.clone()).await {
                Ok(response) => Ok(response),
                Err(DendriteError::Cancelled) => Err(DendriteError::Cancelled),
                Err(err) => {
                    tracing::warn!(
                        request_id = %request.id,
                        synapse = request.synapse,
                        error = %err,
                        "primary stage failed, using fallback"
                    );
                    self.alternate.process(request).await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Flaky, request, unavailable};

    #[tokio::test]
    async fn failure_is_routed_to_alternate() {
        let primary = Flaky::new(1, unavailable);
        let alternate = Flaky::new(0, unavailable);
        let stage = Fallback::new(alternate.clone()).layer(primary.clone());

        assert!(stage.process(request()).await.is_ok());
        assert_eq!(primary.calls(), 1);
        assert_eq!(alternate.calls(), 1);
    }

    #[tokio::test]
    async fn cancellation_is_not_rerouted() {
        let primary = Flaky::new(1, || DendriteError::Cancelled);
        let alternate = Flaky::new(0, unavailable);
        let stage = Fallback::new(alternate.clone()).layer(primary);

        assert!(matches!(
            stage.process(request()).await,
            Err(DendriteError::Cancelled)
        ));
        assert_eq!(alternate.calls(), 0);
    }
}
