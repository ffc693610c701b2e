//! Observability events emitted while a synapse call runs.
//!
//! Sinks are called synchronously from the call path, so an implementation
//! must return quickly: log it, count it, or hand it to a channel. Emission
//! never changes the outcome of a call.
use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::{error::Rejection, generic::Usage};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ProviderCallStarted {
        request_id: Uuid,
        synapse: &'static str,
        provider: String,
    },
    ProviderCallCompleted {
        request_id: Uuid,
        synapse: &'static str,
        provider: String,
        usage: Option<Usage>,
        duration: Duration,
        status: Option<u16>,
        finish_reason: Option<String>,
    },
    ProviderCallFailed {
        request_id: Uuid,
        synapse: &'static str,
        provider: String,
        duration: Duration,
        error: String,
    },
    ResponseRejected {
        request_id: Uuid,
        synapse: &'static str,
        provider: String,
        rejection: Rejection,
        error: String,
    },
}

impl Event {
    pub fn request_id(&self) -> Uuid {
        match self {
            Event::ProviderCallStarted { request_id, .. }
            | Event::ProviderCallCompleted { request_id, .. }
            | Event::ProviderCallFailed { request_id, .. }
            | Event::ResponseRejected { request_id, .. } => *request_id,
        }
    }

    pub fn synapse(&self) -> &'static str {
        match self {
            Event::ProviderCallStarted { synapse, .. }
            | Event::ProviderCallCompleted { synapse, .. }
            | Event::ProviderCallFailed { synapse, .. }
            | Event::ResponseRejected { synapse, .. } => *synapse,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Event::ProviderCallStarted { provider, .. }
            | Event::ProviderCallCompleted { provider, .. }
            | Event::ProviderCallFailed { provider, .. }
            | Event::ResponseRejected { provider, .. } => provider,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Fan-out over any number of sinks. Cheap to clone.
#[derive(Clone, Default)]
pub struct Hooks {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::ProviderCallStarted {
                request_id,
                synapse,
                provider,
            } => tracing::debug!(
                %request_id,
                synapse = *synapse,
                provider = %provider,
                "provider call started"
            ),
            Event::ProviderCallCompleted {
                request_id,
                synapse,
                provider,
                usage,
                duration,
                status,
                finish_reason,
            } => tracing::debug!(
                %request_id,
                synapse = *synapse,
                provider = %provider,
                duration_ms = duration.as_millis() as u64,
                total_tokens = usage.map(|u| u.total_tokens),
                status = ?status,
                finish_reason = finish_reason.as_deref(),
                "provider call completed"
            ),
            Event::ProviderCallFailed {
                request_id,
                synapse,
                provider,
                duration,
                error,
            } => tracing::warn!(
                %request_id,
                synapse = *synapse,
                provider = %provider,
                duration_ms = duration.as_millis() as u64,
                error = %error,
                "provider call failed"
            ),
            Event::ResponseRejected {
                request_id,
                synapse,
                provider,
                rejection,
                error,
            } => tracing::warn!(
                %request_id,
                synapse = *synapse,
                provider = %provider,
                rejection = %rejection,
                error = %error,
                "response rejected"
            ),
        }
    }
}

/// Forwards events into an unbounded channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<Event>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &Event) {
        let _ = self.sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn started() -> Event {
        Event::ProviderCallStarted {
            request_id: Uuid::nil(),
            synapse: "binary",
            provider: "scripted".into(),
        }
    }

    #[test]
    fn fans_out_to_every_sink() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let hooks = Hooks::new()
            .with_sink(ChannelSink::new(tx_a))
            .with_sink(ChannelSink::new(tx_b))
            .with_sink(TracingSink);

        hooks.emit(started());

        assert_eq!(rx_a.try_recv().unwrap(), started());
        assert_eq!(rx_b.try_recv().unwrap().synapse(), "binary");
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        Hooks::new().with_sink(ChannelSink::new(tx)).emit(started());
    }
}
