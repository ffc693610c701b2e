//! Structured description of *what to ask* a model.
//!
//! A [`Prompt`] is kind-agnostic: every synapse kind fills the same fields and
//! the rendering into text happens once, in `dendrite-prompt`. Keeping the
//! structure around (rather than a pre-rendered string) lets middleware and
//! observers inspect a request without re-parsing markdown.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DendriteError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Instruction derived from the synapse's bound phrase. Never empty.
    pub task: String,
    /// Serialized subject of the call. May be empty.
    pub input: String,
    pub context: Option<String>,
    /// Ordered directives: kind-specific output rules first, caller criteria
    /// after.
    pub constraints: Vec<String>,
    pub examples: Option<Examples>,
    /// Canonical schema text of the result type. Never empty.
    pub schema: String,
}

impl Prompt {
    pub fn new(task: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            schema: schema.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Attach context; blank strings are treated as "no context".
    pub fn with_context(mut self, context: Option<impl Into<String>>) -> Self {
        self.context = context.map(Into::into).filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints
            .extend(constraints.into_iter().map(Into::into));
        self
    }

    /// Attach examples; empty collections are dropped.
    pub fn with_examples(mut self, examples: Examples) -> Self {
        self.examples = (!examples.is_empty()).then_some(examples);
        self
    }

    /// Reject prompts that no correct builder would produce.
    pub fn validate(&self) -> Result<()> {
        if self.task.trim().is_empty() {
            return Err(DendriteError::InvalidPrompt("task must not be empty".into()));
        }
        if self.schema.trim().is_empty() {
            return Err(DendriteError::InvalidPrompt(
                "schema must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Few-shot material in one of the three shapes the kinds use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Examples {
    /// Plain list of illustrative subjects.
    List(Vec<String>),
    /// Examples bucketed by label (e.g. per category).
    Labeled(BTreeMap<String, Vec<String>>),
    /// Input to expected output.
    Pairs(Vec<ExamplePair>),
}

impl Examples {
    pub fn is_empty(&self) -> bool {
        match self {
            Examples::List(items) => items.is_empty(),
            Examples::Labeled(buckets) => buckets.values().all(Vec::is_empty),
            Examples::Pairs(pairs) => pairs.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub input: String,
    pub output: String,
}

impl ExamplePair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_task_and_schema() {
        assert!(Prompt::new("Classify", "{}").validate().is_ok());
        assert!(matches!(
            Prompt::new("  ", "{}").validate(),
            Err(DendriteError::InvalidPrompt(_))
        ));
        assert!(matches!(
            Prompt::new("Classify", "").validate(),
            Err(DendriteError::InvalidPrompt(_))
        ));
    }

    #[test]
    fn blank_context_and_empty_examples_are_dropped() {
        let prompt = Prompt::new("t", "s")
            .with_context(Some("   "))
            .with_examples(Examples::List(vec![]));
        assert_eq!(prompt.context, None);
        assert_eq!(prompt.examples, None);
    }

    #[test]
    fn constraints_keep_insertion_order() {
        let prompt = Prompt::new("t", "s")
            .with_constraint("first")
            .with_constraints(["second", "third"]);
        assert_eq!(prompt.constraints, vec!["first", "second", "third"]);
    }
}
