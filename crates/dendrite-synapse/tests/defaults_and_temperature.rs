use std::sync::Arc;

use dendrite_core::{CancellationToken, Session, provider::ScriptedProvider};
use dendrite_synapse::{
    Synapse,
    kinds::{Binary, BinaryInput, Transform, TransformInput},
    temperature,
};

const YES: &str = r#"{"decision": true, "confidence": 0.8, "reasoning": "ok"}"#;

#[tokio::test]
async fn call_context_wins_and_criteria_accumulate() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider.clone())
        .defaults(BinaryInput {
            context: Some("context A".into()),
            criteria: vec!["c1".into()],
            ..Default::default()
        })
        .build()
        .unwrap();

    let input = BinaryInput {
        context: Some("context B".into()),
        criteria: vec!["c2".into()],
        ..BinaryInput::new("Production is down")
    };
    let merged = synapse.merged_input(input.clone());
    assert_eq!(merged.context.as_deref(), Some("context B"));
    assert_eq!(merged.criteria, ["c1", "c2"]);

    synapse
        .fire_with_input(&CancellationToken::new(), &mut Session::new(), input)
        .await
        .unwrap();

    let prompt = &provider.calls()[0].messages[0].content;
    assert!(prompt.contains("context B"));
    assert!(!prompt.contains("context A"));
    let c1 = prompt.find("- c1").unwrap();
    let c2 = prompt.find("- c2").unwrap();
    assert!(c1 < c2);
}

#[tokio::test]
async fn blank_call_context_keeps_the_default() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider)
        .defaults(BinaryInput {
            context: Some("support queue".into()),
            ..Default::default()
        })
        .build()
        .unwrap();

    let merged = synapse.merged_input(BinaryInput {
        context: Some("   ".into()),
        ..BinaryInput::new("x")
    });
    assert_eq!(merged.context.as_deref(), Some("support queue"));
}

#[tokio::test]
async fn baseline_temperature_applies_when_nothing_is_set() {
    let provider = Arc::new(ScriptedProvider::replies([
        r#"{"output": "Dear team,", "confidence": 0.7, "reasoning": "formal"}"#,
    ]));
    let synapse = Synapse::new(Transform::new("make it formal"), provider.clone()).unwrap();

    synapse
        .fire(&CancellationToken::new(), &mut Session::new(), "hey all".into())
        .await
        .unwrap();

    assert_eq!(provider.calls()[0].temperature, temperature::CREATIVE);
}

#[tokio::test]
async fn configured_temperature_beats_baseline() {
    let provider = Arc::new(ScriptedProvider::replies([YES]));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider.clone())
        .temperature(0.5)
        .build()
        .unwrap();

    synapse
        .fire(&CancellationToken::new(), &mut Session::new(), "x".into())
        .await
        .unwrap();

    assert_eq!(provider.calls()[0].temperature, 0.5);
}

#[tokio::test]
async fn call_temperature_beats_configured_even_at_zero() {
    let provider = Arc::new(ScriptedProvider::replies([YES, YES]));
    let synapse = Synapse::builder(Binary::new("the ticket is urgent"), provider.clone())
        .temperature(0.5)
        .defaults(BinaryInput {
            temperature: Some(0.4),
            ..Default::default()
        })
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    let mut session = Session::new();

    synapse
        .fire_with_input(
            &cancel,
            &mut session,
            BinaryInput {
                temperature: Some(0.0),
                ..BinaryInput::new("x")
            },
        )
        .await
        .unwrap();
    // Defaults carry a temperature too; it counts as a call-level value.
    synapse
        .fire(&cancel, &mut session, "y".into())
        .await
        .unwrap();

    let calls = provider.calls();
    assert_eq!(calls[0].temperature, 0.0);
    assert_eq!(calls[1].temperature, 0.4);
}

#[tokio::test]
async fn style_default_is_kept_for_transform_calls() {
    let provider = Arc::new(ScriptedProvider::replies([
        r#"{"output": "Good day.", "confidence": 0.9, "reasoning": "polite"}"#,
    ]));
    let synapse = Synapse::builder(Transform::new("make it polite"), provider.clone())
        .defaults(TransformInput {
            style: Some("formal".into()),
            ..Default::default()
        })
        .build()
        .unwrap();

    let output = synapse
        .fire(&CancellationToken::new(), &mut Session::new(), "hi".into())
        .await
        .unwrap();

    assert_eq!(output, "Good day.");
    assert!(provider.calls()[0].messages[0]
        .content
        .contains("Write in a formal style."));
}
