//! Unified error type exposed by **`dendrite-core`**.
//!
//! Provider crates convert their internal errors into a [`ProviderError`]
//! before handing them back through the [`Provider`](crate::provider::Provider)
//! boundary. Everything the caller of a synapse can observe ends up as one of
//! the [`DendriteError`] variants below.

use std::time::Duration;

use thiserror::Error;

/// Convenient alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DendriteError>;

#[derive(Debug, Error)]
pub enum DendriteError {
    /// The result type of a synapse could not be turned into a schema.
    /// Raised at construction time; no synapse is produced.
    #[error("schema generation failed: {0}")]
    SchemaGeneration(String),

    /// A prompt was missing its task or schema. Correct builders never
    /// produce one, so this points at a bug in the caller or a kind.
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    /// Opaque failure surfaced from the provider boundary.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered, but the answer was rejected.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Bounds-checked session access went out of range.
    #[error("index {index} is out of range for a session of {len} messages")]
    IndexOutOfRange { index: usize, len: usize },

    /// The caller's cancellation token fired.
    #[error("call was cancelled")]
    Cancelled,

    /// A timeout stage gave up waiting.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// A circuit breaker is open and refused the call.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Failure while serialising a structured input for the prompt.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid: {0}")]
    Invalid(String),
}

impl DendriteError {
    /// Whether a retry stage may try the call again.
    ///
    /// Only transport-level trouble qualifies; decode and validation failures
    /// never reach the pipeline and are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            DendriteError::Provider(err) => err.is_retryable(),
            DendriteError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Delay requested by the provider before another attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DendriteError::Provider(err) => err.retry_after(),
            _ => None,
        }
    }
}

/// Errors a [`Provider`](crate::provider::Provider) reports back.
///
/// Rate limiting and non-success status codes are kept apart so middleware can
/// make an informed retry decision without knowing the wire format.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited by provider: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider transport failed: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("malformed provider response: {0}")]
    Format(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } | ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 408 || *status >= 500,
            ProviderError::Format(_) => false,
        }
    }

    /// Delay the provider asked for before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Why a provider answer was not accepted.
///
/// Both variants surface to the caller as [`DendriteError::Response`]; the
/// split only matters for observability.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is not valid JSON for the expected type: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("response failed validation: {0}")]
    Validation(#[from] ValidationError),
}

impl ResponseError {
    pub fn rejection(&self) -> Rejection {
        match self {
            ResponseError::Decode(_) => Rejection::Parse,
            ResponseError::Validation(_) => Rejection::Validation,
        }
    }
}

/// Observability tag for a rejected response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Parse,
    Validation,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Parse => write!(f, "parse"),
            Rejection::Validation => write!(f, "validation"),
        }
    }
}

/// Semantic rejection produced by a [`Validate`](crate::validate::Validate)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Rejection pinned to a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}
