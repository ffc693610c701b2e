use std::marker::PhantomData;

use dendrite_core::{DendriteError, Examples, Prompt, Result, Schema, Validate};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text, replace_text_opt},
    temperature,
};

/// Fills a caller-defined record `T` from free text.
///
/// `T` is both the response and the primary result.
pub struct Extraction<T> {
    what: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Extraction<T> {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Extraction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extraction")
            .field("what", &self.what)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionInput {
    pub text: String,
    pub context: Option<String>,
    pub constraints: Vec<String>,
    pub examples: Vec<String>,
    pub temperature: Option<f64>,
}

impl ExtractionInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl Merge for ExtractionInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            text: replace_text(self.text, overrides.text),
            context: replace_text_opt(self.context, overrides.context),
            constraints: append(self.constraints, overrides.constraints),
            examples: append(self.examples, overrides.examples),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

impl<T> SynapseKind for Extraction<T>
where
    T: DeserializeOwned + JsonSchema + Validate + Send + 'static,
{
    const NAME: &'static str = "extraction";
    const BASELINE_TEMPERATURE: f64 = temperature::DETERMINISTIC;

    type Subject = String;
    type Input = ExtractionInput;
    type Response = T;
    type Primary = T;

    fn input_from(text: String) -> ExtractionInput {
        ExtractionInput::new(text)
    }

    fn build_prompt(&self, input: &ExtractionInput, schema: &Schema) -> Result<Prompt> {
        if input.text.trim().is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "extraction needs a source text".into(),
            ));
        }

        Ok(Prompt::new(format!("Extract {} from the text", self.what), schema.as_str())
            .with_input(input.text.clone())
            .with_context(input.context.clone())
            .with_constraint("Use only information stated in the text.")
            .with_constraint("Fill every required field; leave out optional fields the text does not mention.")
            .with_constraints(input.constraints.iter().cloned())
            .with_examples(Examples::List(input.examples.clone())))
    }

    fn temperature(input: &ExtractionInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: T) -> T {
        response
    }
}
