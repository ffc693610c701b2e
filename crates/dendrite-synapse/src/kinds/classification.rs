use std::collections::BTreeMap;

use dendrite_core::{
    DendriteError, Examples, Prompt, Result, Schema, Validate,
    error::ValidationError,
    validate::{check_not_blank, check_unit_interval},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CONFIDENCE, REASONING};
use crate::{
    kind::{
        Merge, SynapseKind, append, append_labeled, replace_opt, replace_text, replace_text_opt,
    },
    temperature,
};

/// Assigns a subject to one of a fixed set of categories.
///
/// The returned `primary` (and `secondary`, when present) is checked against
/// the category list; anything else is rejected as a validation failure.
#[derive(Debug, Clone)]
pub struct Classification {
    task: String,
    categories: Vec<String>,
}

impl Classification {
    pub fn new<I, S>(task: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task: task.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    fn check_category(&self, field: &str, value: &str) -> std::result::Result<(), ValidationError> {
        if self.categories.iter().any(|c| c == value) {
            Ok(())
        } else {
            Err(ValidationError::field(
                field,
                format!("`{value}` is not one of the allowed categories"),
            ))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationInput {
    pub subject: String,
    pub context: Option<String>,
    pub criteria: Vec<String>,
    /// Example subjects per category.
    pub examples: BTreeMap<String, Vec<String>>,
    pub temperature: Option<f64>,
}

impl ClassificationInput {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }
}

impl Merge for ClassificationInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            subject: replace_text(self.subject, overrides.subject),
            context: replace_text_opt(self.context, overrides.context),
            criteria: append(self.criteria, overrides.criteria),
            examples: append_labeled(self.examples, overrides.examples),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResponse {
    /// The best matching category.
    pub primary: String,
    /// Runner-up category, if one is plausible.
    pub secondary: Option<String>,
    pub confidence: f64,
    pub reasoning: String,
}

impl Validate for ClassificationResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_not_blank("primary", &self.primary)?;
        check_unit_interval("confidence", self.confidence)
    }
}

impl SynapseKind for Classification {
    const NAME: &'static str = "classification";
    const BASELINE_TEMPERATURE: f64 = temperature::DETERMINISTIC;

    type Subject = String;
    type Input = ClassificationInput;
    type Response = ClassificationResponse;
    type Primary = String;

    fn input_from(subject: String) -> ClassificationInput {
        ClassificationInput::new(subject)
    }

    fn build_prompt(&self, input: &ClassificationInput, schema: &Schema) -> Result<Prompt> {
        if self.categories.is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "classification needs at least one category".into(),
            ));
        }

        let categories = self.categories.join(", ");
        Ok(Prompt::new(format!("Classify {}", self.task), schema.as_str())
            .with_input(input.subject.clone())
            .with_context(input.context.clone())
            .with_constraint(format!(
                "Set `primary` to exactly one of these categories: {categories}."
            ))
            .with_constraint(
                "Set `secondary` to another listed category only if it also fits; otherwise omit it.",
            )
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.criteria.iter().cloned())
            .with_examples(Examples::Labeled(input.examples.clone())))
    }

    fn temperature(input: &ClassificationInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: ClassificationResponse) -> String {
        response.primary
    }

    fn verify(&self, response: &ClassificationResponse) -> std::result::Result<(), ValidationError> {
        self.check_category("primary", &response.primary)?;
        if let Some(secondary) = &response.secondary {
            self.check_category("secondary", secondary)?;
        }
        Ok(())
    }
}
