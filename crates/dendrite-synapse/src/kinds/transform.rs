use dendrite_core::{
    DendriteError, ExamplePair, Examples, Prompt, Result, Schema, Validate,
    error::ValidationError,
    validate::{check_not_blank, check_unit_interval},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CONFIDENCE, REASONING};
use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text, replace_text_opt},
    temperature,
};

/// Text-to-text rewrite following an instruction
/// (`Transform::new("make it formal")`).
#[derive(Debug, Clone)]
pub struct Transform {
    instruction: String,
}

impl Transform {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformInput {
    pub text: String,
    pub context: Option<String>,
    pub style: Option<String>,
    /// Upper bound on the output length, in characters.
    pub max_length: Option<usize>,
    pub constraints: Vec<String>,
    pub examples: Vec<ExamplePair>,
    pub temperature: Option<f64>,
}

impl TransformInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Merge for TransformInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            text: replace_text(self.text, overrides.text),
            context: replace_text_opt(self.context, overrides.context),
            style: replace_text_opt(self.style, overrides.style),
            max_length: replace_opt(self.max_length, overrides.max_length),
            constraints: append(self.constraints, overrides.constraints),
            examples: append(self.examples, overrides.examples),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransformResponse {
    /// The transformed text.
    pub output: String,
    pub confidence: f64,
    /// Short notes on what was changed.
    #[serde(default)]
    pub changes: Vec<String>,
    pub reasoning: String,
}

impl Validate for TransformResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_not_blank("output", &self.output)?;
        check_unit_interval("confidence", self.confidence)
    }
}

impl SynapseKind for Transform {
    const NAME: &'static str = "transform";
    const BASELINE_TEMPERATURE: f64 = temperature::CREATIVE;

    type Subject = String;
    type Input = TransformInput;
    type Response = TransformResponse;
    type Primary = String;

    fn input_from(text: String) -> TransformInput {
        TransformInput::new(text)
    }

    fn build_prompt(&self, input: &TransformInput, schema: &Schema) -> Result<Prompt> {
        if input.text.trim().is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "transform needs a text".into(),
            ));
        }

        let mut prompt = Prompt::new(
            format!("Transform the text: {}", self.instruction),
            schema.as_str(),
        )
        .with_input(input.text.clone())
        .with_context(input.context.clone())
        .with_constraint("Put the transformed text in `output`.")
        .with_constraint("Summarize each kind of edit in `changes`.");

        if let Some(style) = &input.style {
            prompt = prompt.with_constraint(format!("Write in a {style} style."));
        }
        if let Some(max) = input.max_length {
            prompt = prompt.with_constraint(format!("Keep `output` within {max} characters."));
        }

        Ok(prompt
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.constraints.iter().cloned())
            .with_examples(Examples::Pairs(input.examples.clone())))
    }

    fn temperature(input: &TransformInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: TransformResponse) -> String {
        response.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_and_length_directives_follow_shape_rules() {
        let schema = Schema::generate::<TransformResponse>().unwrap();
        let input = TransformInput {
            style: Some("formal".into()),
            max_length: Some(120),
            examples: vec![ExamplePair::new("hey", "Good afternoon")],
            ..TransformInput::new("hey, send the file")
        };

        let prompt = Transform::new("make it polite")
            .build_prompt(&input, &schema)
            .unwrap();
        assert_eq!(prompt.constraints[2], "Write in a formal style.");
        assert_eq!(prompt.constraints[3], "Keep `output` within 120 characters.");
        assert!(matches!(prompt.examples, Some(Examples::Pairs(ref p)) if p.len() == 1));
    }

    #[test]
    fn blank_output_is_rejected() {
        let response = TransformResponse {
            output: " ".into(),
            confidence: 0.9,
            changes: vec![],
            reasoning: String::new(),
        };
        assert!(response.validate().is_err());
    }
}
