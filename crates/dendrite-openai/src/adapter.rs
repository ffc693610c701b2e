use std::{env, sync::Arc, time::Duration};

use dendrite_core::error::{DendriteError, ProviderError, Result};

use crate::{
    client::{DEFAULT_TIMEOUT, OpenAiClient},
    model::OpenAiModel,
};

/// [`Provider`](dendrite_core::Provider) backed by an OpenAI-compatible
/// `chat/completions` endpoint.
///
/// Holds the shared HTTP client plus the per-request settings (model, JSON
/// mode, token limit). Build one with [`OpenAiAdapterBuilder`] and share it
/// between synapses as an `Arc<dyn Provider>`.
#[derive(Debug)]
pub struct OpenAiAdapter {
    pub(crate) client: Arc<OpenAiClient>,
    pub(crate) model: OpenAiModel,
    pub(crate) json_mode: bool,
    pub(crate) max_tokens: Option<u32>,
}

impl OpenAiAdapter {
    pub fn model(&self) -> &OpenAiModel {
        &self.model
    }

    pub fn client(&self) -> &OpenAiClient {
        &self.client
    }
}

/// Builder for [`OpenAiAdapter`].
///
/// ```rust,no_run
/// use dendrite_openai::OpenAiAdapterBuilder;
///
/// let provider = OpenAiAdapterBuilder::new_from_env()
///     .with_json_mode(true)
///     .build()
///     .expect("OPENAI_API_KEY must be set");
/// ```
#[derive(Default)]
pub struct OpenAiAdapterBuilder {
    pub(crate) api_key: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) model: Option<OpenAiModel>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) json_mode: bool,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) http: Option<reqwest::Client>,
}

impl OpenAiAdapterBuilder {
    /// Empty builder. Supply an API key before [`Self::build`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    ///
    /// Never fails; a missing key only surfaces in [`Self::build`].
    pub fn new_from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            api_key: non_empty("OPENAI_API_KEY"),
            base_url: non_empty("OPENAI_BASE_URL"),
            model: non_empty("OPENAI_MODEL").map(OpenAiModel::from),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point at an OpenAI-compatible server (e.g. `http://localhost:11434/v1`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<OpenAiModel>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Per-request HTTP timeout. Ignored when a custom client is supplied.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Request `response_format: {"type": "json_object"}`.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    ///
    /// * [`DendriteError::Invalid`] if no API key was supplied.
    /// * [`DendriteError::Provider`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<OpenAiAdapter> {
        let api_key = self.api_key.ok_or(DendriteError::Invalid(
            "missing env variable: `OPENAI_API_KEY`".into(),
        ))?;

        let client = match self.http {
            Some(http) => OpenAiClient::with_http(api_key, http, self.base_url),
            None => {
                let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|err| ProviderError::Transport(Box::new(err)))?;
                OpenAiClient::with_http(api_key, http, self.base_url)
            }
        };

        Ok(OpenAiAdapter {
            client: Arc::new(client),
            model: self.model.unwrap_or_default(),
            json_mode: self.json_mode,
            max_tokens: self.max_tokens,
        })
    }
}
