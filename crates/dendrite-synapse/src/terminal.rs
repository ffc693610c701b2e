use std::{sync::Arc, time::Instant};

use dendrite_core::{
    DendriteError, Provider, Result,
    hooks::{Event, Hooks},
    pipeline::{Stage, SynapseRequest},
};
use dendrite_prompt::{RenderedPrompt, chain::PromptChain};
use futures_core::future::BoxFuture;

/// Innermost stage of every synapse pipeline: renders the request into
/// messages and performs the provider round trip.
///
/// The call races the request's cancellation token; a token that has already
/// fired means the provider is never invoked.
pub struct TerminalStage {
    provider: Arc<dyn Provider>,
    hooks: Hooks,
}

impl TerminalStage {
    pub fn new(provider: Arc<dyn Provider>, hooks: Hooks) -> Self {
        Self { provider, hooks }
    }
}

impl Stage for TerminalStage {
    fn process<'a>(
        &'a self,
        mut request: SynapseRequest,
    ) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            if request.is_cancelled() {
                return Err(DendriteError::Cancelled);
            }

            request.provider = self.provider.name().to_owned();
            let messages = PromptChain::new()
                .with(request.history.clone())
                .with(RenderedPrompt::new(&request.prompt))
                .build();

            self.hooks.emit(Event::ProviderCallStarted {
                request_id: request.id,
                synapse: request.synapse,
                provider: request.provider.clone(),
            });
            let started = Instant::now();

            let outcome = tokio::select! {
                biased;
                _ = request.cancel.cancelled() => Err(DendriteError::Cancelled),
                result = self.provider.call(messages, request.temperature) => {
                    result.map_err(DendriteError::from)
                }
            };
            let duration = started.elapsed();

            match outcome {
                Ok(response) => {
                    self.hooks.emit(Event::ProviderCallCompleted {
                        request_id: request.id,
                        synapse: request.synapse,
                        provider: request.provider.clone(),
                        usage: response.usage,
                        duration,
                        status: response.status,
                        finish_reason: response.finish_reason.clone(),
                    });
                    request.response = Some(response);
                    Ok(request)
                }
                Err(err) => {
                    self.hooks.emit(Event::ProviderCallFailed {
                        request_id: request.id,
                        synapse: request.synapse,
                        provider: request.provider.clone(),
                        duration,
                        error: err.to_string(),
                    });
                    Err(err)
                }
            }
        })
    }
}
