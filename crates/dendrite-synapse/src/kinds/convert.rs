use std::marker::PhantomData;

use dendrite_core::{DendriteError, ExamplePair, Examples, Prompt, Result, Schema, Validate};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};

use super::render_data;
use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text_opt},
    temperature,
};

/// Turns a value of type `I` into a value of type `O`.
///
/// The input is serialized to JSON for the prompt; the output must satisfy
/// `O`'s schema and validation.
pub struct Convert<I, O> {
    description: String,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> Convert<I, O> {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            _marker: PhantomData,
        }
    }
}

impl<I, O> std::fmt::Debug for Convert<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Convert")
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertInput<I> {
    pub data: Option<I>,
    pub context: Option<String>,
    /// Mapping rules, appended to the defaults.
    pub rules: Vec<String>,
    pub examples: Vec<ExamplePair>,
    pub temperature: Option<f64>,
}

impl<I> Default for ConvertInput<I> {
    fn default() -> Self {
        Self {
            data: None,
            context: None,
            rules: Vec::new(),
            examples: Vec::new(),
            temperature: None,
        }
    }
}

impl<I> ConvertInput<I> {
    pub fn new(data: I) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }
}

impl<I> Merge for ConvertInput<I> {
    fn merge(self, overrides: Self) -> Self {
        Self {
            data: replace_opt(self.data, overrides.data),
            context: replace_text_opt(self.context, overrides.context),
            rules: append(self.rules, overrides.rules),
            examples: append(self.examples, overrides.examples),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

impl<I, O> SynapseKind for Convert<I, O>
where
    I: Serialize + Clone + Send + Sync + 'static,
    O: DeserializeOwned + JsonSchema + Validate + Send + 'static,
{
    const NAME: &'static str = "convert";
    const BASELINE_TEMPERATURE: f64 = temperature::DETERMINISTIC;

    type Subject = I;
    type Input = ConvertInput<I>;
    type Response = O;
    type Primary = O;

    fn input_from(data: I) -> ConvertInput<I> {
        ConvertInput::new(data)
    }

    fn build_prompt(&self, input: &ConvertInput<I>, schema: &Schema) -> Result<Prompt> {
        if input.data.is_none() {
            return Err(DendriteError::InvalidPrompt(
                "conversion needs input data".into(),
            ));
        }

        Ok(Prompt::new(
            format!("Convert the input data: {}", self.description),
            schema.as_str(),
        )
        .with_input(render_data(input.data.as_ref())?)
        .with_context(input.context.clone())
        .with_constraint("Produce a value of the response schema that represents the input data.")
        .with_constraint("Do not invent values the input does not support.")
        .with_constraints(input.rules.iter().cloned())
        .with_examples(Examples::Pairs(input.examples.clone())))
    }

    fn temperature(input: &ConvertInput<I>) -> Option<f64> {
        input.temperature
    }

    fn primary(response: O) -> O {
        response
    }
}
