//! Provider-agnostic building blocks of the dendrite SDK.
//!
//! | Module        | What it provides                                                    |
//! |---------------|---------------------------------------------------------------------|
//! | [`schema`]    | deterministic, constrained JSON Schema for result types             |
//! | [`prompt`]    | the structured [`Prompt`](prompt::Prompt) every synapse builds       |
//! | [`provider`]  | the [`Provider`](provider::Provider) boundary and a scripted double |
//! | [`session`]   | the conversation transcript and its manipulation primitives         |
//! | [`pipeline`]  | request envelope, [`Stage`](pipeline::Stage) and [`Layer`](pipeline::Layer) |
//! | [`hooks`]     | observability events and sinks                                      |
//!
//! Nothing in here talks to the network; concrete providers live in their
//! own crates (`dendrite-openai`).
pub mod error;
pub mod generic;
pub mod hooks;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod session;
pub mod template;
pub mod validate;

pub use error::{DendriteError, Result};
pub use generic::{Message, Role, Usage};
pub use prompt::{ExamplePair, Examples, Prompt};
pub use provider::{Provider, ProviderResponse};
pub use schema::{generate_schema, Schema};
pub use session::Session;
pub use validate::Validate;

/// Re-exported so callers can name the token type without a direct
/// `tokio-util` dependency.
pub use tokio_util::sync::CancellationToken;
