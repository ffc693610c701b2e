use dendrite_core::{Message, Provider, ProviderResponse, error::ProviderError};
use futures_core::future::BoxFuture;

use crate::{
    OpenAiAdapter,
    api_v1::{ChatCompletionRequest, ChatCompletionResponse, ResponseFormat},
    error::OpenAiError,
};

impl OpenAiAdapter {
    fn request(&self, messages: Vec<Message>, temperature: f64) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new(
            self.model.as_str().to_owned(),
            messages.into_iter().map(Into::into).collect(),
        )
        .temperature(temperature);

        if self.json_mode {
            request = request.response_format(ResponseFormat::JsonObject);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }
        request
    }
}

/// Reduce a completion to the first choice's text plus metadata.
pub(crate) fn into_provider_response(
    mut response: ChatCompletionResponse,
    status: u16,
) -> Result<ProviderResponse, OpenAiError> {
    if response.choices.is_empty() {
        return Err(OpenAiError::Format("response has no choices".into()));
    }
    let choice = response.choices.swap_remove(0);

    if let Some(refusal) = choice.message.refusal {
        return Err(OpenAiError::Format(format!("model refused: {refusal}")));
    }
    let content = choice
        .message
        .content
        .ok_or_else(|| OpenAiError::Format("first choice has no content".into()))?;

    Ok(ProviderResponse {
        content,
        usage: response.usage.map(Into::into),
        finish_reason: choice.finish_reason.map(|reason| reason.as_str().to_owned()),
        status: Some(status),
    })
}

impl Provider for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    fn call<'a>(
        &'a self,
        messages: Vec<Message>,
        temperature: f64,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>> {
        Box::pin(async move {
            let request = self.request(messages, temperature);
            let (response, status) = self.client.chat_completion(&request).await?;
            Ok(into_provider_response(response, status)?)
        })
    }
}
