use std::sync::Arc;

use dendrite_core::{
    CancellationToken, DendriteError, Message, ProviderResponse, Session, Usage,
    error::ProviderError, generic::Role, provider::ScriptedProvider,
};
use dendrite_synapse::{
    Synapse,
    kinds::{Binary, BinaryInput, Ranking},
};

const YES: &str = r#"{"decision": true, "confidence": 0.9, "reasoning": "claims a prize"}"#;

fn unavailable() -> ProviderError {
    ProviderError::Status {
        status: 503,
        body: "overloaded".into(),
    }
}

fn seeded_session() -> Session {
    Session::with_messages(vec![
        Message::system("You screen inbound mail."),
        Message::user("earlier question"),
        Message::assistant("earlier answer"),
    ])
}

#[tokio::test]
async fn accepted_answer_appends_one_exchange() {
    let provider = Arc::new(ScriptedProvider::new([Ok(
        ProviderResponse::text(YES).with_usage(Usage::new(120, 30)),
    )]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider.clone()).unwrap();
    let mut session = seeded_session();

    let verdict = synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap();

    assert!(verdict);
    assert_eq!(session.len(), 5);
    assert_eq!(session.at(3).unwrap().role, Role::User);
    assert!(session.at(3).unwrap().content.contains("Determine if the email is spam"));
    assert_eq!(*session.at(4).unwrap(), Message::assistant(YES));
    assert_eq!(session.last_usage(), Some(Usage::new(120, 30)));
}

#[tokio::test]
async fn provider_sees_history_then_the_rendered_prompt() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider.clone()).unwrap();
    let mut session = seeded_session();

    synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let sent = &calls[0].messages;
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[..3], seeded_session().messages()[..]);
    assert_eq!(sent[3].role, Role::User);
    assert!(sent[3].content.contains("## Response Schema"));
    assert_eq!(sent[3], *session.at(3).unwrap());
}

#[tokio::test]
async fn provider_failure_leaves_session_untouched() {
    let provider = Arc::new(ScriptedProvider::new([Err(unavailable())]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider).unwrap();
    let mut session = seeded_session();
    let before = session.clone();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Provider(ProviderError::Status { status: 503, .. })));
    assert_eq!(session, before);
}

#[tokio::test]
async fn undecodable_answer_leaves_session_untouched() {
    let provider = Arc::new(ScriptedProvider::replies(["Sure! It is spam."]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider).unwrap();
    let mut session = seeded_session();
    let before = session.clone();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Response(_)));
    assert_eq!(session, before);
}

#[tokio::test]
async fn invalid_answer_leaves_session_untouched() {
    let provider = Arc::new(ScriptedProvider::replies([
        r#"{"decision": true, "confidence": 1.7, "reasoning": "sure"}"#,
    ]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider).unwrap();
    let mut session = Session::new();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("confidence"));
    assert!(session.is_empty());
    assert_eq!(session.last_usage(), None);
}

#[tokio::test]
async fn exhausted_retries_leave_session_untouched() {
    let provider = Arc::new(ScriptedProvider::new([Err(unavailable()), Err(unavailable())]));
    let synapse = Synapse::builder(Binary::new("the email is spam"), provider.clone())
        .with_retry(2)
        .build()
        .unwrap();
    let mut session = seeded_session();
    let before = session.clone();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Provider(_)));
    assert_eq!(provider.call_count(), 2);
    assert_eq!(session, before);
}

#[tokio::test]
async fn retry_recovers_and_records_a_single_exchange() {
    let provider = Arc::new(ScriptedProvider::new([
        Err(unavailable()),
        Ok(ProviderResponse::text(YES)),
    ]));
    let synapse = Synapse::builder(Binary::new("the email is spam"), provider.clone())
        .with_retry(3)
        .build()
        .unwrap();
    let mut session = Session::new();

    let response = synapse
        .fire_with_response(&CancellationToken::new(), &mut session, "You won!".into())
        .await
        .unwrap();

    assert!(response.decision);
    assert_eq!(provider.call_count(), 2);
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn invalid_prompt_never_reaches_the_provider() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let ranking = Synapse::new(Ranking::new("relevance"), provider.clone()).unwrap();
    let mut session = Session::new();

    let err = ranking
        .fire(&CancellationToken::new(), &mut session, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::InvalidPrompt(_)));
    assert_eq!(provider.call_count(), 0);
    assert!(session.is_empty());
}

#[tokio::test]
async fn rich_input_and_bare_subject_share_side_effects() {
    let provider = Arc::new(ScriptedProvider::replies([YES, YES]));
    let synapse = Synapse::new(Binary::new("the email is spam"), provider.clone()).unwrap();
    let cancel = CancellationToken::new();
    let mut session = Session::new();

    let full = synapse
        .fire_with_input_response(&cancel, &mut session, BinaryInput::new("You won!"))
        .await
        .unwrap();
    assert_eq!(full.confidence, 0.9);

    let verdict = synapse
        .fire_with_input(&cancel, &mut session, BinaryInput::new("Meeting at 3"))
        .await
        .unwrap();
    assert!(verdict);
    assert_eq!(session.len(), 4);
    assert_eq!(provider.calls()[1].messages.len(), 3);
}
