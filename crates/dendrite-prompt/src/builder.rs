//! Builder-style helper for constructing **Markdown prompts**.
//!
//! Every method consumes and returns `self`, so a prompt reads top to bottom:
//!
//! ```rust
//! use dendrite_prompt::builder::PromptBuilder;
//!
//! let md = PromptBuilder::new()
//!     .add_section_h2("Task")
//!     .add_line("Decide whether the ticket is a bug report.")
//!     .add_blank_line()
//!     .add_section_h2("Constraints")
//!     .add_bullet("Answer with a single JSON object.")
//!     .finalize();
//!
//! assert!(md.starts_with("## Task\n"));
//! assert!(md.ends_with("- Answer with a single JSON object.\n"));
//! ```
//!
//! No smart formatting happens: newlines and whitespace are emitted exactly as
//! requested.

use std::fmt::{Display, Write as _};

#[derive(Debug, Default)]
pub struct PromptBuilder {
    buffer: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level-1 (`#`) heading.
    pub fn add_section_h1(self, line: impl Display) -> Self {
        self.add_line(format_args!("# {line}"))
    }

    /// Add a level-2 (`##`) heading.
    pub fn add_section_h2(self, line: impl Display) -> Self {
        self.add_line(format_args!("## {line}"))
    }

    /// Add a plain line of text and a trailing newline.
    pub fn add_line(mut self, line: impl Display) -> Self {
        // Writing into a `String` cannot fail.
        let _ = writeln!(self.buffer, "{line}");
        self
    }

    /// Add a bold line (`**text**`).
    pub fn add_line_bold(self, line: impl Display) -> Self {
        self.add_line(format_args!("**{line}**"))
    }

    /// `**Key**: Value`
    pub fn add_key_value(self, key: impl Display, value: impl Display) -> Self {
        self.add_line(format_args!("**{key}**: {value}"))
    }

    /// Add a `- item` bullet.
    pub fn add_bullet(self, item: impl Display) -> Self {
        self.add_line(format_args!("- {item}"))
    }

    /// Add one bullet per item.
    pub fn add_bullets<I>(self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        items.into_iter().fold(self, Self::add_bullet)
    }

    /// Embed a code block fenced as `json`.
    pub fn add_text_json(self, content: impl Display) -> Self {
        self.add_line("```json").add_line(content).add_line("```")
    }

    /// Embed a plain fenced block.
    pub fn add_text_block(self, content: impl Display) -> Self {
        self.add_line("```").add_line(content).add_line("```")
    }

    pub fn add_blank_line(mut self) -> Self {
        self.buffer.push('\n');
        self
    }

    /// Insert a "---" delimiter.
    pub fn add_delimiter(self) -> Self {
        self.add_line("---")
    }

    pub fn finalize(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exactly_what_was_requested() {
        let md = PromptBuilder::new()
            .add_section_h1("Title")
            .add_key_value("Priority", "High")
            .add_bullets(["a", "b"])
            .add_delimiter()
            .add_text_json("{}")
            .finalize();

        assert_eq!(
            md,
            "# Title\n**Priority**: High\n- a\n- b\n---\n```json\n{}\n```\n"
        );
    }
}
