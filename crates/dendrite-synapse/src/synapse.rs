//! The generic synapse: shared lifecycle of every kind.
//!
//! ```text
//!  fire* ─► merge defaults ─► build prompt ─► resolve temperature
//!        ─► pipeline (layers … terminal) ─► decode ─► validate + verify
//!        ─► session.append(user, assistant) ─► result
//! ```
//!
//! The four entry points only differ in what they accept (a bare subject or
//! a rich input) and what they return (the headline field or the whole
//! response). Their side effects are identical.
use std::{sync::Arc, time::Duration};

use dendrite_core::{
    CancellationToken, DendriteError, Message, Provider, Result, Schema, Session,
    generate_schema,
    hooks::{Event, EventSink, Hooks},
    pipeline::{Layer, Stage, SynapseRequest, compose},
};
use dendrite_middleware::{
    CircuitBreaker, ErrorHandler, Fallback, RateLimit, Retry, RetryPolicy, Timeout,
};
use dendrite_prompt::RenderedPrompt;

use crate::{
    decode,
    kind::{Merge, SynapseKind},
    temperature,
    terminal::TerminalStage,
};

pub struct Synapse<K: SynapseKind> {
    kind: K,
    pipeline: Arc<dyn Stage>,
    schema: Arc<Schema>,
    defaults: K::Input,
    temperature: Option<f64>,
    hooks: Hooks,
}

impl<K: SynapseKind> Synapse<K> {
    /// Synapse without defaults or middleware.
    pub fn new(kind: K, provider: Arc<dyn Provider>) -> Result<Self> {
        Self::builder(kind, provider).build()
    }

    pub fn builder(kind: K, provider: Arc<dyn Provider>) -> SynapseBuilder<K> {
        SynapseBuilder {
            kind,
            provider,
            defaults: K::Input::default(),
            temperature: None,
            hooks: Hooks::new(),
            layers: Vec::new(),
        }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Schema the result type is held to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn pipeline(&self) -> &Arc<dyn Stage> {
        &self.pipeline
    }

    pub fn defaults(&self) -> &K::Input {
        &self.defaults
    }

    /// Ask about a bare subject and return the headline field.
    pub async fn fire(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        subject: K::Subject,
    ) -> Result<K::Primary> {
        self.execute(cancel, session, K::input_from(subject))
            .await
            .map(K::primary)
    }

    pub async fn fire_with_response(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        subject: K::Subject,
    ) -> Result<K::Response> {
        self.execute(cancel, session, K::input_from(subject)).await
    }

    pub async fn fire_with_input(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        input: K::Input,
    ) -> Result<K::Primary> {
        self.execute(cancel, session, input).await.map(K::primary)
    }

    pub async fn fire_with_input_response(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        input: K::Input,
    ) -> Result<K::Response> {
        self.execute(cancel, session, input).await
    }

    /// The merged input the synapse would use for `input`.
    pub fn merged_input(&self, input: K::Input) -> K::Input {
        self.defaults.clone().merge(input)
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        session: &mut Session,
        input: K::Input,
    ) -> Result<K::Response> {
        let input = self.merged_input(input);
        let prompt = self.kind.build_prompt(&input, &self.schema)?;
        prompt.validate()?;

        let temperature = temperature::resolve(
            K::temperature(&input),
            self.temperature,
            K::BASELINE_TEMPERATURE,
        );

        let request = SynapseRequest::new(
            K::NAME,
            prompt,
            temperature,
            session.messages().to_vec(),
            cancel.clone(),
        );
        tracing::debug!(
            request_id = %request.id,
            synapse = K::NAME,
            temperature,
            history = request.history.len(),
            "firing synapse"
        );

        let completed = self.pipeline.process(request).await?;
        let request_id = completed.id;
        let provider = completed.provider.clone();
        let user_turn = RenderedPrompt::new(&completed.prompt).into_message();
        let response = completed.into_response()?;

        let accepted = decode::accept::<K::Response, _>(&response.content, |value| {
            self.kind.verify(value)
        });
        match accepted {
            Ok(value) => {
                session.append(user_turn, Message::assistant(response.content));
                session.set_last_usage(response.usage);
                tracing::debug!(
                    %request_id,
                    synapse = K::NAME,
                    "synapse response accepted"
                );
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    %request_id,
                    synapse = K::NAME,
                    rejection = %err.rejection(),
                    error = %err,
                    "synapse response rejected"
                );
                self.hooks.emit(Event::ResponseRejected {
                    request_id,
                    synapse: K::NAME,
                    provider,
                    rejection: err.rejection(),
                    error: err.to_string(),
                });
                Err(DendriteError::Response(err))
            }
        }
    }
}

enum PendingLayer {
    Ready(Arc<dyn Layer>),
    /// Needs the final hooks to build its terminal stage.
    FallbackProvider(Arc<dyn Provider>),
}

/// Configures and builds a [`Synapse`].
///
/// Layers wrap the pipeline in the order they are added: the first one sits
/// directly around the provider call, the last one is the outermost.
///
/// ```rust
/// use std::{sync::Arc, time::Duration};
/// use dendrite_core::provider::ScriptedProvider;
/// use dendrite_synapse::{Synapse, kinds::Binary};
///
/// let provider = Arc::new(ScriptedProvider::replies(Vec::<String>::new()));
/// let synapse = Synapse::builder(Binary::new("the email is spam"), provider)
///     .with_timeout(Duration::from_secs(10))
///     .with_retry(3)
///     .build()
///     .unwrap();
/// assert!(synapse.schema().as_str().contains("decision"));
/// ```
pub struct SynapseBuilder<K: SynapseKind> {
    kind: K,
    provider: Arc<dyn Provider>,
    defaults: K::Input,
    temperature: Option<f64>,
    hooks: Hooks,
    layers: Vec<PendingLayer>,
}

impl<K: SynapseKind> SynapseBuilder<K> {
    /// Input merged under every call's input.
    pub fn defaults(mut self, defaults: K::Input) -> Self {
        self.defaults = defaults;
        self
    }

    /// Temperature used when the call input sets none.
    ///
    /// A temperature inside [`Self::defaults`] is merged into every call's
    /// input, so it counts as call-level and wins over this one.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.hooks = self.hooks.with_sink(sink);
        self
    }

    pub fn layer(mut self, layer: impl Layer + 'static) -> Self {
        self.layers.push(PendingLayer::Ready(Arc::new(layer)));
        self
    }

    /// Up to `max_attempts` immediate attempts for retryable failures.
    pub fn with_retry(self, max_attempts: u32) -> Self {
        self.layer(Retry::new(RetryPolicy::new(max_attempts)))
    }

    /// Like [`Self::with_retry`], pausing `initial_backoff`, doubling per
    /// attempt.
    pub fn with_backoff(self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.layer(Retry::new(RetryPolicy::exponential(
            max_attempts,
            initial_backoff,
        )))
    }

    pub fn with_retry_policy(self, policy: RetryPolicy) -> Self {
        self.layer(Retry::new(policy))
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.layer(Timeout::new(timeout))
    }

    pub fn with_circuit_breaker(self, failure_threshold: u32, reset_timeout: Duration) -> Self {
        self.layer(CircuitBreaker::new(failure_threshold, reset_timeout))
    }

    pub fn with_rate_limit(self, requests_per_second: f64, burst: u32) -> Self {
        self.layer(RateLimit::new(requests_per_second, burst))
    }

    /// Send the call to `provider` when everything inside this layer failed.
    pub fn with_fallback(mut self, provider: Arc<dyn Provider>) -> Self {
        self.layers.push(PendingLayer::FallbackProvider(provider));
        self
    }

    /// Send the call through another pipeline when everything inside this
    /// layer failed, e.g. `backup.pipeline().clone()` of a second synapse.
    ///
    /// The alternate receives this synapse's request and prompt unchanged.
    pub fn with_fallback_stage(self, alternate: Arc<dyn Stage>) -> Self {
        self.layer(Fallback::new(alternate))
    }

    /// Observe failures of everything inside this layer. The error still
    /// propagates unchanged.
    pub fn with_error_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&SynapseRequest, &DendriteError) + Send + Sync + 'static,
    {
        self.layer(ErrorHandler::new(handler))
    }

    /// Generate the result schema and assemble the pipeline.
    pub fn build(self) -> Result<Synapse<K>> {
        let schema = generate_schema::<K::Response>()?;

        let terminal: Arc<dyn Stage> =
            Arc::new(TerminalStage::new(self.provider, self.hooks.clone()));
        let layers: Vec<Arc<dyn Layer>> = self
            .layers
            .into_iter()
            .map(|pending| -> Arc<dyn Layer> {
                match pending {
                    PendingLayer::Ready(layer) => layer,
                    PendingLayer::FallbackProvider(provider) => Arc::new(Fallback::new(
                        Arc::new(TerminalStage::new(provider, self.hooks.clone())),
                    )),
                }
            })
            .collect();

        Ok(Synapse {
            kind: self.kind,
            pipeline: compose(terminal, &layers),
            schema,
            defaults: self.defaults,
            temperature: self.temperature,
            hooks: self.hooks,
        })
    }
}
