//! Typed synapses: single-purpose, structured interactions with a language
//! model.
//!
//! A [`Synapse`] pairs a [`SynapseKind`] (what is asked and what shape the
//! answer has) with a provider wrapped in middleware layers. Every call
//! renders a prompt that embeds the JSON Schema of the result type, sends the
//! session history plus that prompt, and only hands back an answer that
//! decodes and validates. The session grows by exactly one user/assistant
//! pair per accepted answer and is left untouched otherwise.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dendrite_core::{CancellationToken, Session, provider::ScriptedProvider};
//! use dendrite_synapse::{Synapse, kinds::Binary};
//!
//! # async fn run() -> dendrite_core::Result<()> {
//! let provider = Arc::new(ScriptedProvider::replies([
//!     r#"{"decision": true, "confidence": 0.92, "reasoning": "prize claim"}"#,
//! ]));
//! let spam = Synapse::new(Binary::new("the email is spam"), provider)?;
//!
//! let mut session = Session::new();
//! let verdict = spam
//!     .fire(&CancellationToken::new(), &mut session, "You won a cruise!".into())
//!     .await?;
//! assert!(verdict);
//! assert_eq!(session.len(), 2);
//! # Ok(())
//! # }
//! ```
pub mod decode;
pub mod kind;
pub mod kinds;
pub mod synapse;
pub mod temperature;
pub mod terminal;

pub use kind::{Merge, SynapseKind};
pub use synapse::{Synapse, SynapseBuilder};
