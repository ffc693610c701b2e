use dendrite_core::{
    DendriteError, Examples, Prompt, Result, Schema, Validate,
    error::ValidationError,
    validate::check_unit_interval,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CONFIDENCE, REASONING};
use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text_opt},
    temperature,
};

/// Orders items by a criterion, best first.
#[derive(Debug, Clone)]
pub struct Ranking {
    criterion: String,
}

impl Ranking {
    pub fn new(criterion: impl Into<String>) -> Self {
        Self {
            criterion: criterion.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingInput {
    /// Items to rank. Default items come first.
    pub items: Vec<String>,
    pub context: Option<String>,
    pub criteria: Vec<String>,
    pub examples: Vec<String>,
    /// Return only the best `n` items.
    pub top_n: Option<usize>,
    pub temperature: Option<f64>,
}

impl RankingInput {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

impl Merge for RankingInput {
    fn merge(self, overrides: Self) -> Self {
        Self {
            items: append(self.items, overrides.items),
            context: replace_text_opt(self.context, overrides.context),
            criteria: append(self.criteria, overrides.criteria),
            examples: append(self.examples, overrides.examples),
            top_n: replace_opt(self.top_n, overrides.top_n),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankingResponse {
    /// Items from best to worst, verbatim.
    pub ranked: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
}

impl Validate for RankingResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.ranked.is_empty() {
            return Err(ValidationError::field("ranked", "must contain at least one item"));
        }
        check_unit_interval("confidence", self.confidence)
    }
}

impl SynapseKind for Ranking {
    const NAME: &'static str = "ranking";
    const BASELINE_TEMPERATURE: f64 = temperature::ANALYTICAL;

    type Subject = Vec<String>;
    type Input = RankingInput;
    type Response = RankingResponse;
    type Primary = Vec<String>;

    fn input_from(items: Vec<String>) -> RankingInput {
        RankingInput::new(items)
    }

    fn build_prompt(&self, input: &RankingInput, schema: &Schema) -> Result<Prompt> {
        if input.items.is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "ranking needs at least one item".into(),
            ));
        }

        let items = input
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = Prompt::new(
            format!("Rank the items by {}", self.criterion),
            schema.as_str(),
        )
        .with_input(items)
        .with_context(input.context.clone())
        .with_constraint("List the items in `ranked` from best to worst, copying their text exactly.");

        if let Some(n) = input.top_n {
            prompt = prompt.with_constraint(format!("Include only the top {n} items."));
        }

        Ok(prompt
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.criteria.iter().cloned())
            .with_examples(Examples::List(input.examples.clone())))
    }

    fn temperature(input: &RankingInput) -> Option<f64> {
        input.temperature
    }

    fn primary(response: RankingResponse) -> Vec<String> {
        response.ranked
    }
}
