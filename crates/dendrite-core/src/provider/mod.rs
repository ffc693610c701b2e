//! The provider boundary.
//!
//! A provider turns a list of chat messages into a single text completion.
//! Everything about the wire format (endpoints, auth headers, model names,
//! JSON envelopes) stays behind this trait.
//!
//! The method returns a [`BoxFuture`] so the trait stays object-safe without
//! pulling in `async_trait`; synapses hold providers as `Arc<dyn Provider>`.

mod scripted;

pub use scripted::{RecordedCall, ScriptedProvider};

use futures_core::future::BoxFuture;

use crate::{
    error::ProviderError,
    generic::{Message, Usage},
};

pub trait Provider: Send + Sync {
    /// Stable identifier used in events and logs (`"openai"`, `"scripted"`).
    fn name(&self) -> &str;

    /// Perform one non-streaming round trip.
    fn call<'a>(
        &'a self,
        messages: Vec<Message>,
        temperature: f64,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>>;
}

/// Raw result of a provider call, before any decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub content: String,
    pub usage: Option<Usage>,
    pub finish_reason: Option<String>,
    /// Transport status code, when the provider speaks HTTP.
    pub status: Option<u16>,
}

impl ProviderResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}
