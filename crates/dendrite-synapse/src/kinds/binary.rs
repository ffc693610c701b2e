use dendrite_core::{
    Examples, Prompt, Result, Schema, Validate,
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

/// Yes/no decision about a subject.
///
/// The question is phrased as the remainder of "Determine if …", e.g.
/// `Binary::new("the email is spam")`.
#[derive(Debug, Clone)]
pub struct Binary {
    question: String,
}

impl Binary {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryInput {
    pub subject: String,
    pub context: Option<String>,
    /// Extra decision criteria, appended to the defaults.
    pub criteria: Vec<String>,
    pub examples: Vec<String>,
    pub temperature: Option<f64>,
}

impl BinaryInput {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }
}

impl Merge for BinaryInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            subject: replace_text(self.subject, overrides.subject),
            context: replace_text_opt(self.context, overrides.context),
            criteria: append(self.criteria, overrides.criteria),
            examples: append(self.examples, overrides.examples),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BinaryResponse {
    /// `true` if the statement holds for the subject.
    pub decision: bool,
    pub confidence: f64,
    pub reasoning: String,
}

impl Validate for BinaryResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_unit_interval("confidence", self.confidence)
    }
}

impl SynapseKind for Binary {
    const NAME: &'static str = "binary";
    const BASELINE_TEMPERATURE: f64 = temperature::DETERMINISTIC;

    type Subject = String;
    type Input = BinaryInput;
    type Response = BinaryResponse;
    type Primary = bool;

    fn input_from(subject: String) -> BinaryInput {
        BinaryInput::new(subject)
    }

    fn build_prompt(&self, input: &BinaryInput, schema: &Schema) -> Result<Prompt> {
        Ok(Prompt::new(format!("Determine if {}", self.question), schema.as_str())
            .with_input(input.subject.clone())
            .with_context(input.context.clone())
            .with_constraint("Set `decision` to true or false.")
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.criteria.iter().cloned())
            .with_examples(Examples::List(input.examples.clone())))
    }

    fn temperature(input: &BinaryInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: BinaryResponse) -> bool {
        response.decision
    }
}
