//! # `dendrite`: the umbrella crate
//!
//! One import for the whole workspace:
//!
//! | Crate                     | What it provides                                                        |
//! |---------------------------|-------------------------------------------------------------------------|
//! | **`dendrite-core`**       | schemas, prompts, sessions, the `Provider` boundary, pipeline and hooks |
//! | **`dendrite-prompt`**     | markdown prompt rendering and message chaining                          |
//! | **`dendrite-middleware`** | retry, timeout, circuit breaker, rate limit, fallback, error handler    |
//! | **`dendrite-synapse`**    | the generic `Synapse` and its eight built-in kinds                      |
//! | **`dendrite-openai`**     | OpenAI-compatible `Provider` *(optional, `openai` feature)*             |
//!
//! ```toml
//! [dependencies]
//! dendrite = { version = "0.1", features = ["openai"] }
//! ```
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dendrite::{
//!     CancellationToken, Session,
//!     openai::OpenAiAdapterBuilder,
//!     synapse::{Synapse, kinds::Classification},
//! };
//!
//! #[tokio::main]
//! async fn main() -> dendrite::Result<()> {
//!     let provider = Arc::new(OpenAiAdapterBuilder::new_from_env().build()?);
//!     let triage = Synapse::builder(
//!         Classification::new("the support ticket", ["bug", "feature", "question"]),
//!         provider,
//!     )
//!     .with_retry(3)
//!     .build()?;
//!
//!     let mut session = Session::new();
//!     let label = triage
//!         .fire(&CancellationToken::new(), &mut session, "The app crashes on save".into())
//!         .await?;
//!     println!("{label}");
//!     Ok(())
//! }
//! ```
#![doc(html_root_url = "https://docs.rs/dendrite/latest")]

pub use dendrite_core::*;
pub use dendrite_middleware as middleware;
pub use dendrite_prompt as render;
pub use dendrite_synapse as synapse;

#[cfg(feature = "openai")]
pub use dendrite_openai as openai;
