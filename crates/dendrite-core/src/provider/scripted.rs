use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use futures_core::future::BoxFuture;

use super::{Provider, ProviderResponse};
use crate::{error::ProviderError, generic::Message};

/// In-memory provider that replays a fixed script of outcomes.
///
/// Every call pops the next scripted outcome and records what it was asked.
/// Once the script runs dry, calls fail with [`ProviderError::Format`].
/// Clones share the same script and call log.
#[derive(Clone)]
pub struct ScriptedProvider {
    name: String,
    delay: Option<Duration>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    script: VecDeque<Result<ProviderResponse, ProviderError>>,
    calls: Vec<RecordedCall>,
}

/// One observed call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub temperature: f64,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            name: "scripted".into(),
            delay: None,
            state: Arc::new(Mutex::new(State {
                script: script.into_iter().collect(),
                calls: Vec::new(),
            })),
        }
    }

    /// Script consisting only of successful text replies.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            replies
                .into_iter()
                .map(|reply| Ok(ProviderResponse::text(reply))),
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sleep before answering; useful to exercise timeouts and cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, outcome: Result<ProviderResponse, ProviderError>) {
        self.lock().script.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn call<'a>(
        &'a self,
        messages: Vec<Message>,
        temperature: f64,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>> {
        Box::pin(async move {
            let outcome = {
                let mut state = self.lock();
                state.calls.push(RecordedCall {
                    messages,
                    temperature,
                });
                state.script.pop_front()
            };

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            outcome.unwrap_or_else(|| {
                Err(ProviderError::Format(
                    "scripted provider exhausted its responses".into(),
                ))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_fails() {
        let provider = ScriptedProvider::replies(["one"]);

        let first = provider
            .call(vec![Message::user("hi")], 0.2)
            .await
            .unwrap();
        assert_eq!(first.content, "one");

        let err = provider.call(vec![], 0.2).await.unwrap_err();
        assert!(matches!(err, ProviderError::Format(_)));

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].messages, vec![Message::user("hi")]);
        assert_eq!(calls[0].temperature, 0.2);
    }

    #[tokio::test]
    async fn clones_share_the_script() {
        let provider = ScriptedProvider::replies(["a", "b"]);
        let clone = provider.clone();

        clone.call(vec![], 0.0).await.unwrap();
        assert_eq!(provider.remaining(), 1);
        assert_eq!(provider.call_count(), 1);
    }
}
