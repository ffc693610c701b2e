use std::collections::BTreeMap;

use dendrite_core::{
    DendriteError, Prompt, Result, Schema, Validate,
    error::ValidationError,
    validate::check_unit_interval,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CONFIDENCE, REASONING};
use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text, replace_text_opt},
    temperature,
};

/// Sentiment of a text, overall and per aspect.
///
/// `subject` describes what the text is (`"the product review"`); it is only
/// used to phrase the task.
#[derive(Debug, Clone)]
pub struct Sentiment {
    subject: String,
}

impl Sentiment {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentInput {
    pub text: String,
    pub context: Option<String>,
    /// Aspects to rate individually (e.g. "price", "support").
    pub aspects: Vec<String>,
    pub criteria: Vec<String>,
    pub temperature: Option<f64>,
}

impl SentimentInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Merge for SentimentInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            text: replace_text(self.text, overrides.text),
            context: replace_text_opt(self.context, overrides.context),
            aspects: append(self.aspects, overrides.aspects),
            criteria: append(self.criteria, overrides.criteria),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SentimentResponse {
    pub overall: Polarity,
    pub confidence: f64,
    pub scores: SentimentScores,
    /// Emotions expressed in the text, if any.
    #[serde(default)]
    pub emotions: Vec<String>,
    /// Polarity per requested aspect.
    #[serde(default)]
    pub aspects: BTreeMap<String, Polarity>,
    pub reasoning: String,
}

impl Validate for SentimentResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_unit_interval("confidence", self.confidence)?;
        check_unit_interval("scores.positive", self.scores.positive)?;
        check_unit_interval("scores.negative", self.scores.negative)?;
        check_unit_interval("scores.neutral", self.scores.neutral)
    }
}

impl SynapseKind for Sentiment {
    const NAME: &'static str = "sentiment";
    const BASELINE_TEMPERATURE: f64 = temperature::ANALYTICAL;

    type Subject = String;
    type Input = SentimentInput;
    type Response = SentimentResponse;
    type Primary = Polarity;

    fn input_from(text: String) -> SentimentInput {
        SentimentInput::new(text)
    }

    fn build_prompt(&self, input: &SentimentInput, schema: &Schema) -> Result<Prompt> {
        if input.text.trim().is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "sentiment analysis needs a text".into(),
            ));
        }

        let subject = if self.subject.trim().is_empty() {
            "the text"
        } else {
            self.subject.as_str()
        };

        let mut prompt = Prompt::new(format!("Analyze the sentiment of {subject}"), schema.as_str())
            .with_input(input.text.clone())
            .with_context(input.context.clone())
            .with_constraint("Set `overall` to one of: positive, negative, neutral, mixed.")
            .with_constraint(
                "Score `scores.positive`, `scores.negative` and `scores.neutral` between 0.0 and 1.0.",
            )
            .with_constraint("List notable emotions in `emotions`.");

        if !input.aspects.is_empty() {
            prompt = prompt.with_constraint(format!(
                "Rate each of these aspects in `aspects`, keyed by name: {}.",
                input.aspects.join(", ")
            ));
        }

        Ok(prompt
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.criteria.iter().cloned()))
    }

    fn temperature(input: &SentimentInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: SentimentResponse) -> Polarity {
        response.overall
    }
}
