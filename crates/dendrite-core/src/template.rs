//! Conversion of arbitrary values into chat messages.
//!
//! Anything that can describe itself as a list of [`Message`]s implements
//! [`IntoPrompt`]; `dendrite-prompt`'s `PromptChain` concatenates such values
//! into the final message list handed to a provider.
//!
//! ```rust
//! use dendrite_core::generic::Message;
//! use dendrite_core::template::IntoPrompt;
//!
//! struct Persona;
//!
//! impl IntoPrompt for Persona {
//!     fn into_prompt(self) -> Vec<Message> {
//!         vec![Message::system("You answer in JSON only.")]
//!     }
//! }
//!
//! assert_eq!(Persona.into_prompt().len(), 1);
//! ```
use crate::generic::Message;

/// Converts a value into a series of chat messages.
pub trait IntoPrompt {
    /// Consume `self` and return **all** messages in the desired order.
    fn into_prompt(self) -> Vec<Message>;
}

impl IntoPrompt for Message {
    fn into_prompt(self) -> Vec<Message> {
        vec![self]
    }
}

/// A transcript (for example a session snapshot) passes through unchanged.
impl IntoPrompt for Vec<Message> {
    fn into_prompt(self) -> Vec<Message> {
        self
    }
}

impl IntoPrompt for &[Message] {
    fn into_prompt(self) -> Vec<Message> {
        self.to_vec()
    }
}
