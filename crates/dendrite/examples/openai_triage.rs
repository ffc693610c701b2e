//! # Ticket triage
//!
//! Classifies a handful of support tickets, then asks a yes/no follow-up in
//! the same session so the model sees its earlier answers.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run -p dendrite --example openai_triage
//! ```
use std::{sync::Arc, time::Duration};

use dendrite::{
    CancellationToken, Message, Provider, Session,
    hooks::TracingSink,
    openai::OpenAiAdapterBuilder,
    synapse::{
        Synapse,
        kinds::{Binary, BinaryInput, Classification, ClassificationInput},
    },
};

const TICKETS: &[&str] = &[
    "Saving a draft throws 'null reference' and the text is gone.",
    "Could you add a dark mode?",
    "How do I export my data as CSV?",
];

#[tokio::main]
async fn main() -> dendrite::Result<()> {
    let provider: Arc<dyn Provider> = Arc::new(
        OpenAiAdapterBuilder::new_from_env()
            .with_json_mode(true)
            .build()?,
    );

    let triage = Synapse::builder(
        Classification::new("the support ticket", ["bug", "feature", "question"]),
        Arc::clone(&provider),
    )
    .defaults(ClassificationInput {
        context: Some("Tickets come from a note-taking app.".into()),
        ..Default::default()
    })
    .sink(TracingSink)
    .with_timeout(Duration::from_secs(30))
    .with_backoff(3, Duration::from_millis(500))
    .build()?;

    let urgent = Synapse::builder(Binary::new("any of the tickets needs a hotfix"), provider)
        .with_retry(2)
        .build()?;

    let cancel = CancellationToken::new();
    let mut session = Session::with_messages(vec![Message::system(
        "You are a support lead. Answer only with the requested JSON.",
    )]);

    for ticket in TICKETS {
        let response = triage
            .fire_with_input_response(&cancel, &mut session, ClassificationInput::new(*ticket))
            .await?;
        println!(
            "{:<9} ({:.2})  {ticket}",
            response.primary, response.confidence
        );
    }

    let hotfix = urgent
        .fire_with_input(
            &cancel,
            &mut session,
            BinaryInput {
                criteria: vec!["Data loss always needs a hotfix.".into()],
                ..BinaryInput::new("the tickets classified above")
            },
        )
        .await?;
    println!("hotfix needed: {hotfix}");
    println!("session holds {} messages", session.len());

    Ok(())
}
