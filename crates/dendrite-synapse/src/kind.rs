//! The protocol every synapse kind implements.
//!
//! A kind only describes *what* is asked: its input record, its result type
//! and how the two turn into a [`Prompt`]. Merging defaults, resolving the
//! temperature, running the pipeline, decoding, validating and updating the
//! session are shared by all kinds and live in [`Synapse`](crate::Synapse).
use std::collections::BTreeMap;

use dendrite_core::{
    Prompt, Result, Schema, Validate, error::ValidationError,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

pub trait SynapseKind: Send + Sync + 'static {
    /// Tag used in events and logs.
    const NAME: &'static str;

    /// Temperature used when neither the call nor the synapse sets one.
    const BASELINE_TEMPERATURE: f64;

    /// What `fire` accepts: the bare subject of the question.
    type Subject;

    /// The rich per-call input, also used for synapse-wide defaults.
    type Input: Merge + Clone + Default + Send + Sync;

    /// The structured result the model must produce.
    type Response: DeserializeOwned + JsonSchema + Validate + Send + 'static;

    /// What `fire` returns: the headline field of the response.
    type Primary;

    fn input_from(subject: Self::Subject) -> Self::Input;

    /// Build the prompt for an already merged input.
    fn build_prompt(&self, input: &Self::Input, schema: &Schema) -> Result<Prompt>;

    /// Per-call temperature carried by the input, if any.
    fn temperature(input: &Self::Input) -> Option<f64>;

    fn primary(response: Self::Response) -> Self::Primary;

    /// Kind-specific acceptance check on top of [`Validate`].
    fn verify(&self, response: &Self::Response) -> std::result::Result<(), ValidationError> {
        let _ = response;
        Ok(())
    }
}

/// Field-wise combination of a default record with a per-call override.
pub trait Merge {
    /// `self` holds the defaults; `overrides` wins where it is set.
    fn merge(self, overrides: Self) -> Self;
}

/// Scalar text: the override wins unless it is blank.
pub fn replace_text(base: String, overrides: String) -> String {
    if overrides.trim().is_empty() {
        base
    } else {
        overrides
    }
}

/// Optional text: a blank override counts as unset.
pub fn replace_text_opt(base: Option<String>, overrides: Option<String>) -> Option<String> {
    match overrides {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => base,
    }
}

pub fn replace_opt<T>(base: Option<T>, overrides: Option<T>) -> Option<T> {
    overrides.or(base)
}

/// Sequences accumulate: defaults first, then the call's items.
pub fn append<T>(mut base: Vec<T>, overrides: Vec<T>) -> Vec<T> {
    base.extend(overrides);
    base
}

/// Labeled buckets accumulate per label.
pub fn append_labeled(
    mut base: BTreeMap<String, Vec<String>>,
    overrides: BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    for (label, items) in overrides {
        base.entry(label).or_default().extend(items);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_replaced_only_when_set() {
        assert_eq!(replace_text("a".into(), "".into()), "a");
        assert_eq!(replace_text("a".into(), "b".into()), "b");
        assert_eq!(
            replace_text_opt(Some("a".into()), Some("  ".into())),
            Some("a".into())
        );
        assert_eq!(replace_text_opt(None, Some("b".into())), Some("b".into()));
    }

    #[test]
    fn explicit_zero_overrides() {
        assert_eq!(replace_opt(Some(0.5), Some(0.0)), Some(0.0));
        assert_eq!(replace_opt(Some(0.5), None), Some(0.5));
    }

    #[test]
    fn labeled_buckets_append() {
        let base = BTreeMap::from([("bug".to_string(), vec!["a".to_string()])]);
        let over = BTreeMap::from([
            ("bug".to_string(), vec!["b".to_string()]),
            ("idea".to_string(), vec!["c".to_string()]),
        ]);
        let merged = append_labeled(base, over);
        assert_eq!(merged["bug"], ["a", "b"]);
        assert_eq!(merged["idea"], ["c"]);
    }
}
