pub mod builder;
pub mod chain;
pub mod render;

pub use render::{render_prompt, RenderedPrompt};
