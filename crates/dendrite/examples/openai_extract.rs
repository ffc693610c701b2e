//! # Structured extraction
//!
//! Pulls a typed record out of free text and checks the mood of the same
//! message.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run -p dendrite --example openai_extract
//! ```
use std::sync::Arc;

use dendrite::{
    CancellationToken, Provider, Session, Validate,
    error::ValidationError,
    openai::OpenAiAdapterBuilder,
    synapse::{
        Synapse,
        kinds::{Extraction, Sentiment},
    },
    validate::check_not_blank,
};
use schemars::JsonSchema;
use serde::Deserialize;

const EMAIL: &str = "Hi, this is Dana Whitfield from Northwind. Our order #4471 \
arrived with two cracked panels. Please call me at +1 555 0100 or write to \
dana@northwind.example. Honestly pretty disappointed this time.";

/// Who wrote in and about which order.
#[derive(Debug, Deserialize, JsonSchema)]
struct Complaint {
    customer: String,
    company: Option<String>,
    order_number: Option<String>,
    #[serde(default)]
    contact: Vec<String>,
    /// One sentence describing the problem.
    issue: String,
}

impl Validate for Complaint {
    fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("customer", &self.customer)?;
        check_not_blank("issue", &self.issue)
    }
}

#[tokio::main]
async fn main() -> dendrite::Result<()> {
    let provider: Arc<dyn Provider> = Arc::new(OpenAiAdapterBuilder::new_from_env().build()?);
    let cancel = CancellationToken::new();
    let mut session = Session::new();

    let extract = Synapse::builder(
        Extraction::<Complaint>::new("the customer complaint"),
        Arc::clone(&provider),
    )
    .with_retry(2)
    .build()?;
    println!("schema:\n{}\n", extract.schema());

    let complaint = extract.fire(&cancel, &mut session, EMAIL.into()).await?;
    println!("{complaint:#?}");

    let mood = Synapse::new(Sentiment::new("the customer email"), provider)?
        .fire(&cancel, &mut session, EMAIL.into())
        .await?;
    println!("mood: {mood:?}");

    Ok(())
}
