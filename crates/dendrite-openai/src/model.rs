use std::{borrow::Cow, fmt::Display};

pub const GPT4_O: &str = "gpt-4o";
pub const GPT4_O_MINI: &str = "gpt-4o-mini";
pub const GPT4_1: &str = "gpt-4.1";
pub const GPT4_1_MINI: &str = "gpt-4.1-mini";

/// Model sent in the `model` field of every request.
///
/// `Custom` covers fine-tunes and models served by OpenAI-compatible
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpenAiModel {
    Gpt4o,
    #[default]
    Gpt4oMini,
    Gpt41,
    Gpt41Mini,
    Custom(Cow<'static, str>),
}

impl OpenAiModel {
    pub fn as_str(&self) -> &str {
        match self {
            OpenAiModel::Gpt4o => GPT4_O,
            OpenAiModel::Gpt4oMini => GPT4_O_MINI,
            OpenAiModel::Gpt41 => GPT4_1,
            OpenAiModel::Gpt41Mini => GPT4_1_MINI,
            OpenAiModel::Custom(name) => name,
        }
    }
}

impl From<&str> for OpenAiModel {
    fn from(value: &str) -> Self {
        match value {
            GPT4_O => OpenAiModel::Gpt4o,
            GPT4_O_MINI => OpenAiModel::Gpt4oMini,
            GPT4_1 => OpenAiModel::Gpt41,
            GPT4_1_MINI => OpenAiModel::Gpt41Mini,
            other => OpenAiModel::Custom(Cow::Owned(other.to_owned())),
        }
    }
}

impl From<String> for OpenAiModel {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl Display for OpenAiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
