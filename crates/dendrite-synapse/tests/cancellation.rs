use std::{sync::Arc, time::Duration};

use dendrite_core::{CancellationToken, DendriteError, Session, provider::ScriptedProvider};
use dendrite_synapse::{Synapse, kinds::Binary};

const YES: &str = r#"{"decision": true, "confidence": 0.8, "reasoning": "ok"}"#;

#[tokio::test]
async fn cancelled_token_skips_the_provider() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let synapse = Synapse::new(Binary::new("the ticket is urgent"), provider.clone()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut session = Session::new();

    let err = synapse
        .fire(&cancel, &mut session, "x".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Cancelled));
    assert_eq!(provider.call_count(), 0);
    assert!(session.is_empty());
}

#[tokio::test]
async fn cancelling_mid_call_aborts_without_recording() {
    let provider = Arc::new(ScriptedProvider::replies([YES]).with_delay(Duration::from_secs(30)));
    let synapse = Synapse::new(Binary::new("the ticket is urgent"), provider.clone()).unwrap();
    let cancel = CancellationToken::new();
    let mut session = Session::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = synapse
        .fire(&cancel, &mut session, "x".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Cancelled));
    assert_eq!(provider.call_count(), 1);
    assert!(session.is_empty());
}

#[tokio::test]
async fn cancellation_is_not_retried() {
    let provider = Arc::new(ScriptedProvider::replies([YES, YES]).with_delay(Duration::from_secs(30)));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider.clone())
        .with_retry(3)
        .build()
        .unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = synapse
        .fire(&cancel, &mut Session::new(), "x".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Cancelled));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn timeout_layer_gives_up_on_slow_providers() {
    let provider = Arc::new(ScriptedProvider::replies([YES]).with_delay(Duration::from_secs(30)));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider)
        .with_timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    let mut session = Session::new();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "x".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Timeout(_)));
    assert!(session.is_empty());
}
