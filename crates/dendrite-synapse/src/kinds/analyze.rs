use std::marker::PhantomData;

use dendrite_core::{
    DendriteError, Prompt, Result, Schema, Validate,
    error::ValidationError,
    validate::{check_not_blank, check_unit_interval},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CONFIDENCE, REASONING, render_data};
use crate::{
    kind::{Merge, SynapseKind, append, replace_opt, replace_text_opt},
    temperature,
};

/// Prose analysis of a structured value `T`, serialized as JSON into the
/// prompt.
pub struct Analyze<T> {
    what: String,
    _marker: PhantomData<fn(T)>,
}

impl<T> Analyze<T> {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Analyze<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyze").field("what", &self.what).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeInput<T> {
    pub data: Option<T>,
    pub context: Option<String>,
    /// Aspect to concentrate on.
    pub focus: Option<String>,
    pub criteria: Vec<String>,
    pub temperature: Option<f64>,
}

impl<T> Default for AnalyzeInput<T> {
    fn default() -> Self {
        Self {
            data: None,
            context: None,
            focus: None,
            criteria: Vec::new(),
            temperature: None,
        }
    }
}

impl<T> AnalyzeInput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }
}

impl<T> Merge for AnalyzeInput<T> {
    fn merge(self, overrides: Self) -> Self {
        Self {
            data: replace_opt(self.data, overrides.data),
            context: replace_text_opt(self.context, overrides.context),
            focus: replace_text_opt(self.focus, overrides.focus),
            criteria: append(self.criteria, overrides.criteria),
            temperature: replace_opt(self.temperature, overrides.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeResponse {
    /// The analysis, in prose.
    pub analysis: String,
    pub confidence: f64,
    /// Key findings, one per entry.
    #[serde(default)]
    pub findings: Vec<String>,
    pub reasoning: String,
}

impl Validate for AnalyzeResponse {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_not_blank("analysis", &self.analysis)?;
        check_unit_interval("confidence", self.confidence)
    }
}

impl<T> SynapseKind for Analyze<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    const NAME: &'static str = "analyze";
    const BASELINE_TEMPERATURE: f64 = temperature::ANALYTICAL;

    type Subject = T;
    type Input = AnalyzeInput<T>;
    type Response = AnalyzeResponse;
    type Primary = String;

    fn input_from(data: T) -> AnalyzeInput<T> {
        AnalyzeInput::new(data)
    }

    fn build_prompt(&self, input: &AnalyzeInput<T>, schema: &Schema) -> Result<Prompt> {
        if input.data.is_none() {
            return Err(DendriteError::InvalidPrompt(
                "analysis needs data to analyze".into(),
            ));
        }

        let mut prompt = Prompt::new(format!("Analyze {}", self.what), schema.as_str())
            .with_input(render_data(input.data.as_ref())?)
            .with_context(input.context.clone())
            .with_constraint("Write the analysis in `analysis`.")
            .with_constraint("List the key findings in `findings`.");

        if let Some(focus) = &input.focus {
            prompt = prompt.with_constraint(format!("Focus on {focus}."));
        }

        Ok(prompt
            .with_constraint(CONFIDENCE)
            .with_constraint(REASONING)
            .with_constraints(input.criteria.iter().cloned()))
    }

    fn temperature(input: &AnalyzeInput<T>) -> Option<f64> {
        input.temperature
    }

    fn primary(response: AnalyzeResponse) -> String {
        response.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Quarter {
        revenue: u64,
        churn: f64,
    }

    #[test]
    fn data_is_rendered_as_json() {
        let schema = Schema::generate::<AnalyzeResponse>().unwrap();
        let input = AnalyzeInput {
            focus: Some("churn".into()),
            ..AnalyzeInput::new(Quarter {
                revenue: 120,
                churn: 0.05,
            })
        };

        let prompt = Analyze::<Quarter>::new("the quarterly numbers")
            .build_prompt(&input, &schema)
            .unwrap();
        let data: serde_json::Value = serde_json::from_str(&prompt.input).unwrap();
        assert_eq!(data["revenue"], 120);
        assert!(prompt.constraints.contains(&"Focus on churn.".to_string()));
    }

    #[test]
    fn call_data_replaces_default_data() {
        let defaults = AnalyzeInput::new(1u32);
        assert_eq!(defaults.clone().merge(AnalyzeInput::new(2)).data, Some(2));
        assert_eq!(defaults.merge(AnalyzeInput::default()).data, Some(1));
    }
}
