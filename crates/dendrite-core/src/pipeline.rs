//! The seam between a synapse and whatever sits in front of its provider.
//!
//! A call travels as a [`SynapseRequest`] through a chain of [`Stage`]s. The
//! innermost stage is fixed by the synapse and performs the provider round
//! trip; every other stage is added by a [`Layer`] and may inspect, repeat,
//! delay or short-circuit the call.
//!
//! ```text
//!  caller ─► layer N ─► … ─► layer 1 ─► terminal ─► Provider::call
//! ```
//!
//! Layers are applied in the order they are supplied: the first one wraps
//! the terminal stage directly, the last one becomes the outermost.
use std::{fmt, future::Future, sync::Arc};

use futures_core::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::{DendriteError, Result},
    generic::Message,
    prompt::Prompt,
    provider::ProviderResponse,
};

/// Request envelope, created per call and dropped once the call completes.
#[derive(Clone)]
pub struct SynapseRequest {
    /// Correlation id shared by every event of this call.
    pub id: Uuid,
    /// Kind tag of the issuing synapse (`"binary"`, `"ranking"`, …).
    pub synapse: &'static str,
    /// Set by the terminal stage to the name of the provider it called.
    pub provider: String,
    pub prompt: Prompt,
    pub temperature: f64,
    /// Snapshot of the session transcript sent ahead of the new user turn.
    pub history: Vec<Message>,
    pub cancel: CancellationToken,
    /// Filled by the terminal stage on success.
    pub response: Option<ProviderResponse>,
    /// Rendered terminal error, recorded by a stage before it gives up; see
    /// the error handler middleware. The typed error itself keeps
    /// propagating as `Err`.
    pub error: Option<String>,
}

impl SynapseRequest {
    pub fn new(
        synapse: &'static str,
        prompt: Prompt,
        temperature: f64,
        history: Vec<Message>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            synapse,
            provider: String::new(),
            prompt,
            temperature,
            history,
            cancel,
            response: None,
            error: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Take the provider response out of the envelope.
    pub fn into_response(self) -> Result<ProviderResponse> {
        self.response.ok_or_else(|| {
            DendriteError::Invalid("pipeline completed without a provider response".into())
        })
    }
}

impl fmt::Debug for SynapseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynapseRequest")
            .field("id", &self.id)
            .field("synapse", &self.synapse)
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("history", &self.history.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_response", &self.response.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// One processing step of the pipeline.
pub trait Stage: Send + Sync {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>>;
}

/// Wraps a stage with one more stage.
pub trait Layer: Send + Sync {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage>;
}

impl<F> Layer for F
where
    F: Fn(Arc<dyn Stage>) -> Arc<dyn Stage> + Send + Sync,
{
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        self(inner)
    }
}

/// Stage backed by an async closure.
///
/// ```rust
/// use std::sync::Arc;
/// use dendrite_core::pipeline::{stage_fn, Stage};
///
/// let passthrough: Arc<dyn Stage> = Arc::new(stage_fn(|request| async move { Ok(request) }));
/// ```
pub fn stage_fn<F, Fut>(f: F) -> StageFn<F>
where
    F: Fn(SynapseRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SynapseRequest>> + Send + 'static,
{
    StageFn(f)
}

pub struct StageFn<F>(F);

impl<F, Fut> Stage for StageFn<F>
where
    F: Fn(SynapseRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SynapseRequest>> + Send + 'static,
{
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin((self.0)(request))
    }
}

/// Fold `layers` around `terminal`, first layer innermost.
pub fn compose(terminal: Arc<dyn Stage>, layers: &[Arc<dyn Layer>]) -> Arc<dyn Stage> {
    layers
        .iter()
        .fold(terminal, |inner, layer| layer.layer(inner))
}
