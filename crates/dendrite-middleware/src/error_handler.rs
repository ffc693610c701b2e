use std::sync::Arc;

use dendrite_core::{
    DendriteError, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;

type Handler = dyn Fn(&SynapseRequest, &DendriteError) + Send + Sync;

/// Invokes a callback with the failed request before the error propagates.
///
/// The callback sees the request as it entered this stage, with
/// [`SynapseRequest::error`] set to the rendered failure, plus the typed
/// error itself. It cannot swallow or replace the error.
#[derive(Clone)]
pub struct ErrorHandler {
    handler: Arc<Handler>,
}

impl ErrorHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&SynapseRequest, &DendriteError) + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Layer for ErrorHandler {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(ErrorHandlerStage {
            inner,
            handler: Arc::clone(&self.handler),
        })
    }
}

struct ErrorHandlerStage {
    inner: Arc<dyn Stage>,
    handler: Arc<Handler>,
}

impl Stage for ErrorHandlerStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            let mut failed = request.clone();
            match self.inner.process(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    failed.error = Some(err.to_string());
                    (self.handler)(&failed, &err);
                    Err(err)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use dendrite_core::error::ProviderError;

    use super::*;
    use crate::testing::{Flaky, request, unavailable};

    #[tokio::test]
    async fn handler_sees_error_and_error_is_reraised() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = ErrorHandler::new(move |request: &SynapseRequest, _: &DendriteError| {
            sink.lock().unwrap().push(request.error.clone());
        });
        let stage = handler.layer(Flaky::new(1, unavailable));

        let err = stage.process(request()).await.unwrap_err();
        assert!(matches!(
            err,
            DendriteError::Provider(ProviderError::Status { status: 503, .. })
        ));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn handler_is_silent_on_success() {
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let stage = ErrorHandler::new(move |_: &SynapseRequest, _: &DendriteError| {
            *flag.lock().unwrap() = true
        })
        .layer(Flaky::new(0, unavailable));

        assert!(stage.process(request()).await.is_ok());
        assert!(!*called.lock().unwrap());
    }

    #[tokio::test]
    async fn kept_requests_do_not_change_the_error() {
        let kept = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::clone(&kept);
        let retryable = Arc::new(Mutex::new(Vec::new()));
        let flags = Arc::clone(&retryable);
        let stage = ErrorHandler::new(move |request: &SynapseRequest, err: &DendriteError| {
            queue.lock().unwrap().push(request.clone());
            flags.lock().unwrap().push(err.is_retryable());
        })
        .layer(Flaky::new(1, unavailable));

        let err = stage.process(request()).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(
            err,
            DendriteError::Provider(ProviderError::Status { status: 503, .. })
        ));
        assert_eq!(*retryable.lock().unwrap(), [true]);
        let kept = kept.lock().unwrap();
        assert!(kept[0].error.as_deref().unwrap().contains("503"));
    }
}
