//! The built-in synapse kinds.
//!
//! | Kind               | Asks for                                   | `fire` returns  |
//! |--------------------|--------------------------------------------|-----------------|
//! | [`Binary`]         | a yes/no decision                          | `bool`          |
//! | [`Classification`] | one label out of a fixed set               | `String`        |
//! | [`Ranking`]        | an ordering of items by a criterion        | `Vec<String>`   |
//! | [`Sentiment`]      | polarity, scores and emotions of a text    | [`Polarity`]    |
//! | [`Extraction`]     | a caller-defined record filled from text   | `T`             |
//! | [`Transform`]      | rewritten text                             | `String`        |
//! | [`Analyze`]        | prose analysis of structured data          | `String`        |
//! | [`Convert`]        | one structured type turned into another    | `O`             |
mod analyze;
mod binary;
mod classification;
mod convert;
mod extraction;
mod ranking;
mod sentiment;
mod transform;

pub use analyze::{Analyze, AnalyzeInput, AnalyzeResponse};
pub use binary::{Binary, BinaryInput, BinaryResponse};
pub use classification::{Classification, ClassificationInput, ClassificationResponse};
pub use convert::{Convert, ConvertInput};
pub use extraction::{Extraction, ExtractionInput};
pub use ranking::{Ranking, RankingInput, RankingResponse};
pub use sentiment::{Polarity, Sentiment, SentimentInput, SentimentResponse, SentimentScores};
pub use transform::{Transform, TransformInput, TransformResponse};

const CONFIDENCE: &str = "Report `confidence` as a number between 0.0 and 1.0.";
const REASONING: &str = "Explain the answer briefly in `reasoning`.";

/// Serialize structured call data for the prompt's input section.
fn render_data<T: serde::Serialize>(data: Option<&T>) -> dendrite_core::Result<String> {
    match data {
        Some(data) => Ok(serde_json::to_string_pretty(data)?),
        None => Ok(String::new()),
    }
}
