//! Concatenates values implementing
//! [`IntoPrompt`](dendrite_core::template::IntoPrompt) into one message list.
//!
//! ```text
//! ┌────────────────┐    IntoPrompt     ┌────────────────┐
//! │ system persona │ ─────────────────►│ Vec<Message>   │
//! ├────────────────┤                   ├────────────────┤
//! │ session history│ ─────────────────►│ Vec<Message>   │
//! ├────────────────┤                   ├────────────────┤
//! │ rendered prompt│ ─────────────────►│ Vec<Message>   │
//! └────────────────┘                   └────────────────┘
//!            ▲                                     │
//!            └────────── PromptChain::build() ◄────┘
//! ```
//!
//! ```rust
//! use dendrite_core::generic::Message;
//! use dendrite_prompt::chain::PromptChain;
//!
//! let history = vec![Message::user("earlier"), Message::assistant("{}")];
//! let messages = PromptChain::new()
//!     .with(history)
//!     .with(Message::user("now"))
//!     .build();
//!
//! assert_eq!(messages.len(), 3);
//! ```
use dendrite_core::{generic::Message, template::IntoPrompt};

#[derive(Debug, Default)]
pub struct PromptChain(Vec<Message>);

impl PromptChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the messages produced by `with` to the chain.
    pub fn with(mut self, with: impl IntoPrompt) -> Self {
        self.0.append(&mut with.into_prompt());
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.0
    }
}
