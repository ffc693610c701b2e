use std::time::Duration;

use dendrite_core::error::ProviderError;
use reqwest::StatusCode;

/// Every failure the OpenAI client can hit.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("couldn't decode body: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("OpenAI rate limit hit: {body}")]
    RateLimited {
        retry_after: Option<Duration>,
        body: String,
    },

    #[error("OpenAI returned non-success status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("OpenAI format error: {0}")]
    Format(String),
}

impl From<OpenAiError> for ProviderError {
    fn from(value: OpenAiError) -> Self {
        match value {
            OpenAiError::RateLimited { retry_after, body } => ProviderError::RateLimited {
                retry_after,
                message: body,
            },
            OpenAiError::Api { status, body } => ProviderError::Status {
                status: status.as_u16(),
                body,
            },
            OpenAiError::Http(err) => ProviderError::Transport(Box::new(err)),
            OpenAiError::Serde(err) => ProviderError::Format(err.to_string()),
            OpenAiError::Format(message) => ProviderError::Format(message),
        }
    }
}

/// Map a non-success answer to the matching error.
///
/// `retry_after` is the raw `Retry-After` header; only the delta-seconds form
/// is understood.
pub(crate) fn from_status(status: StatusCode, retry_after: Option<&str>, body: String) -> OpenAiError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        OpenAiError::RateLimited {
            retry_after: retry_after
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            body,
        }
    } else {
        OpenAiError::Api { status, body }
    }
}
