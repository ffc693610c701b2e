//! Conversation transcript shared across synapse calls.
//!
//! A [`Session`] is owned by the caller and lent to each call as
//! `&mut Session`. Synapse calls only ever touch it through [`Session::append`]
//! and [`Session::set_last_usage`], and only after the response has been
//! decoded and validated; a failed call leaves the transcript exactly as it
//! was.
//!
//! The remaining primitives exist for callers that curate their own history
//! (dropping stale turns, injecting a system message, …). All index-based
//! operations are bounds-checked and leave the transcript untouched on error.
//!
//! ```rust
//! use dendrite_core::{generic::Message, session::Session};
//!
//! let mut session = Session::new();
//! session.append(Message::user("Is water wet?"), Message::assistant(r#"{"decision":true}"#));
//! assert_eq!(session.len(), 2);
//!
//! session.prune(1);
//! assert!(session.is_empty());
//! ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{DendriteError, Result},
    generic::{Message, Usage},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_usage: Option<Usage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            last_usage: None,
        }
    }

    /// Start from an existing transcript.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::new()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record one completed exchange. Both turns land together.
    pub fn append(&mut self, user: Message, assistant: Message) {
        self.messages.reserve(2);
        self.messages.push(user);
        self.messages.push(assistant);
    }

    /// Usage reported for the most recent successful call.
    pub fn last_usage(&self) -> Option<Usage> {
        self.last_usage
    }

    pub fn set_last_usage(&mut self, usage: Option<Usage>) {
        self.last_usage = usage;
    }

    pub fn at(&self, index: usize) -> Result<&Message> {
        self.messages.get(index).ok_or(DendriteError::IndexOutOfRange {
            index,
            len: self.messages.len(),
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<Message> {
        self.check_index(index)?;
        Ok(self.messages.remove(index))
    }

    /// Swap the message at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, message: Message) -> Result<Message> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.messages[index], message))
    }

    /// Insert before `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, message: Message) -> Result<()> {
        if index > self.messages.len() {
            return Err(DendriteError::IndexOutOfRange {
                index,
                len: self.messages.len(),
            });
        }
        self.messages.insert(index, message);
        Ok(())
    }

    /// Keep the first `keep_first` and last `keep_last` messages and drop the
    /// middle. Does nothing if the two ranges already cover the transcript.
    pub fn truncate(&mut self, keep_first: usize, keep_last: usize) {
        let len = self.messages.len();
        if keep_first.saturating_add(keep_last) >= len {
            return;
        }
        self.messages.drain(keep_first..len - keep_last);
    }

    /// Drop the last `pairs` exchanges (at most `2 * pairs` trailing messages).
    pub fn prune(&mut self, pairs: usize) {
        let drop = pairs.saturating_mul(2).min(self.messages.len());
        self.messages.truncate(self.messages.len() - drop);
    }

    /// Empty the transcript and forget the last usage record.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_usage = None;
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.messages.len() {
            Ok(())
        } else {
            Err(DendriteError::IndexOutOfRange {
                index,
                len: self.messages.len(),
            })
        }
    }
}
