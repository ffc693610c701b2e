//! Canonical markdown rendering of a [`Prompt`].
//!
//! Every synapse kind goes through the same renderer so the text a model sees
//! only differs in content, never in layout:
//!
//! ```text
//! ## Task           always
//! ## Input          when the input is non-empty
//! ## Context        when set
//! ## Constraints    when any
//! ## Examples       when any
//! ## Response Schema
//! <closing instruction>
//! ```
use dendrite_core::{
    generic::Message,
    prompt::{Examples, Prompt},
    template::IntoPrompt,
};

use crate::builder::PromptBuilder;

const CLOSING_INSTRUCTION: &str = "Respond with a single JSON object that conforms to the response schema. \
Do not include any text outside the JSON object.";

pub fn render_prompt(prompt: &Prompt) -> String {
    let mut md = PromptBuilder::new()
        .add_section_h2("Task")
        .add_line(&prompt.task)
        .add_blank_line();

    if !prompt.input.trim().is_empty() {
        md = md
            .add_section_h2("Input")
            .add_text_block(&prompt.input)
            .add_blank_line();
    }

    if let Some(context) = &prompt.context {
        md = md
            .add_section_h2("Context")
            .add_line(context)
            .add_blank_line();
    }

    if !prompt.constraints.is_empty() {
        md = md
            .add_section_h2("Constraints")
            .add_bullets(&prompt.constraints)
            .add_blank_line();
    }

    if let Some(examples) = &prompt.examples {
        md = render_examples(md.add_section_h2("Examples"), examples).add_blank_line();
    }

    md.add_section_h2("Response Schema")
        .add_text_json(&prompt.schema)
        .add_blank_line()
        .add_line(CLOSING_INSTRUCTION)
        .finalize()
}

fn render_examples(md: PromptBuilder, examples: &Examples) -> PromptBuilder {
    match examples {
        Examples::List(items) => md.add_bullets(items),
        Examples::Labeled(buckets) => buckets
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .fold(md, |md, (label, items)| {
                md.add_line_bold(label).add_bullets(items)
            }),
        Examples::Pairs(pairs) => pairs.iter().fold(md, |md, pair| {
            md.add_key_value("Input", &pair.input)
                .add_key_value("Output", &pair.output)
                .add_blank_line()
        }),
    }
}

/// A prompt rendered into the single user turn it becomes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt(String);

impl RenderedPrompt {
    pub fn new(prompt: &Prompt) -> Self {
        Self(render_prompt(prompt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_message(self) -> Message {
        Message::user(self.0)
    }
}

impl IntoPrompt for RenderedPrompt {
    fn into_prompt(self) -> Vec<Message> {
        vec![self.into_message()]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dendrite_core::prompt::ExamplePair;

    use super::*;

    #[test]
    fn minimal_prompt_has_task_and_schema_only() {
        let text = render_prompt(&Prompt::new("Determine if it rains.", "{\"type\":\"object\"}"));

        assert!(text.starts_with("## Task\nDetermine if it rains.\n"));
        assert!(!text.contains("## Input"));
        assert!(!text.contains("## Context"));
        assert!(!text.contains("## Constraints"));
        assert!(!text.contains("## Examples"));
        assert!(text.contains("## Response Schema\n```json\n{\"type\":\"object\"}\n```\n"));
        assert!(text.trim_end().ends_with(CLOSING_INSTRUCTION));
    }

    #[test]
    fn sections_appear_in_canonical_order() {
        let prompt = Prompt::new("Classify the ticket.", "{}")
            .with_input("printer on fire")
            .with_context(Some("office hardware"))
            .with_constraints(["pick one category"])
            .with_examples(Examples::List(vec!["paper jam".into()]));

        let text = render_prompt(&prompt);
        let positions: Vec<usize> = [
            "## Task",
            "## Input",
            "## Context",
            "## Constraints",
            "## Examples",
            "## Response Schema",
        ]
        .iter()
        .map(|heading| text.find(heading).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("- pick one category\n"));
        assert!(text.contains("- paper jam\n"));
    }

    #[test]
    fn labeled_and_paired_examples() {
        let mut buckets = BTreeMap::new();
        buckets.insert("bug".to_string(), vec!["crash on save".to_string()]);
        buckets.insert("empty".to_string(), vec![]);
        let labeled = render_prompt(
            &Prompt::new("t", "{}").with_examples(Examples::Labeled(buckets)),
        );
        assert!(labeled.contains("**bug**\n- crash on save\n"));
        assert!(!labeled.contains("**empty**"));

        let paired = render_prompt(&Prompt::new("t", "{}").with_examples(Examples::Pairs(vec![
            ExamplePair::new("hi", "HI"),
        ])));
        assert!(paired.contains("**Input**: hi\n**Output**: HI\n"));
    }

    #[test]
    fn rendered_prompt_becomes_one_user_message() {
        let messages = RenderedPrompt::new(&Prompt::new("t", "{}")).into_prompt();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, dendrite_core::generic::Role::User);
    }
}
