//! OpenAI-compatible provider for dendrite synapses.
//!
//! [`OpenAiAdapter`] implements [`dendrite_core::Provider`] over the
//! `chat/completions` endpoint. Any server speaking that wire format works;
//! point [`OpenAiAdapterBuilder::with_base_url`] (or `OPENAI_BASE_URL`) at
//! it.
mod adapter;
pub mod api_v1;
mod client;
pub mod error;
mod model;
mod provider_impl;

pub use adapter::{OpenAiAdapter, OpenAiAdapterBuilder};
pub use client::OpenAiClient;
pub use error::OpenAiError;
pub use model::OpenAiModel;
