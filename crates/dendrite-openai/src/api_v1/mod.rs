//! Wire types of the `/chat/completions` endpoint.
mod chat_completion;
mod common;

pub use chat_completion::*;
pub use common::Usage;
