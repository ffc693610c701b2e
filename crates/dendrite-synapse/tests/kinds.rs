use std::{collections::BTreeMap, sync::Arc};

use dendrite_core::{
    CancellationToken, DendriteError, Session, Validate,
    error::ValidationError,
    provider::ScriptedProvider,
    validate::check_not_blank,
};
use dendrite_synapse::{
    Synapse,
    kinds::{
        Analyze, AnalyzeInput, Classification, ClassificationInput, Convert, ConvertInput,
        Extraction, Polarity, Ranking, RankingInput, Sentiment, SentimentInput,
    },
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn scripted(reply: &str) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::replies([reply.to_owned()]))
}

#[tokio::test]
async fn classification_returns_the_primary_label() {
    let provider = scripted(
        r#"```json
{"primary": "bug", "secondary": "question", "confidence": 0.85, "reasoning": "stack trace"}
```"#,
    );
    let synapse = Synapse::new(
        Classification::new("the support ticket", ["bug", "feature", "question"]),
        provider.clone(),
    )
    .unwrap();

    let input = ClassificationInput {
        examples: BTreeMap::from([("bug".to_string(), vec!["App crashes on start".to_string()])]),
        ..ClassificationInput::new("Null pointer when saving")
    };
    let label = synapse
        .fire_with_input(&CancellationToken::new(), &mut Session::new(), input)
        .await
        .unwrap();

    assert_eq!(label, "bug");
    let sent = &provider.calls()[0].messages[0].content;
    assert!(sent.contains("**bug**"));
    assert!(sent.contains("- App crashes on start"));
}

#[tokio::test]
async fn classification_outside_the_category_set_is_rejected() {
    let provider = scripted(r#"{"primary": "praise", "confidence": 0.9, "reasoning": "nice"}"#);
    let synapse = Synapse::new(
        Classification::new("the support ticket", ["bug", "feature"]),
        provider,
    )
    .unwrap();
    let mut session = Session::new();

    let err = synapse
        .fire(&CancellationToken::new(), &mut session, "Love it".into())
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::Response(_)));
    assert!(err.to_string().contains("praise"));
    assert!(session.is_empty());
}

#[tokio::test]
async fn ranking_returns_the_ordering() {
    let provider = scripted(
        r#"{"ranked": ["rust", "zig", "go"], "confidence": 0.6, "reasoning": "ownership"}"#,
    );
    let synapse = Synapse::builder(Ranking::new("memory safety"), provider.clone())
        .defaults(RankingInput {
            criteria: vec!["Ignore ecosystem size".into()],
            ..Default::default()
        })
        .build()
        .unwrap();

    let ranked = synapse
        .fire(
            &CancellationToken::new(),
            &mut Session::new(),
            vec!["go".into(), "rust".into(), "zig".into()],
        )
        .await
        .unwrap();

    assert_eq!(ranked, ["rust", "zig", "go"]);
    assert!(provider.calls()[0].messages[0].content.contains("1. go\n2. rust\n3. zig"));
}

#[tokio::test]
async fn sentiment_returns_polarity_and_aspects() {
    let provider = scripted(
        r#"{
            "overall": "mixed",
            "confidence": 0.7,
            "scores": {"positive": 0.5, "negative": 0.4, "neutral": 0.1},
            "emotions": ["frustration"],
            "aspects": {"price": "positive", "support": "negative"},
            "reasoning": "cheap but unresponsive"
        }"#,
    );
    let synapse = Synapse::new(Sentiment::new("the review"), provider).unwrap();
    let cancel = CancellationToken::new();

    let response = synapse
        .fire_with_input_response(
            &cancel,
            &mut Session::new(),
            SentimentInput {
                aspects: vec!["price".into(), "support".into()],
                ..SentimentInput::new("Cheap, but support never answered.")
            },
        )
        .await
        .unwrap();

    assert_eq!(response.overall, Polarity::Mixed);
    assert_eq!(response.aspects["support"], Polarity::Negative);
    assert_eq!(response.emotions, ["frustration"]);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Contact {
    name: String,
    email: Option<String>,
    #[serde(default)]
    phones: Vec<String>,
}

impl Validate for Contact {
    fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("name", &self.name)
    }
}

#[tokio::test]
async fn extraction_fills_the_caller_type() {
    let provider = scripted(r#"{"name": "Ada Lovelace", "email": "ada@example.org"}"#);
    let synapse = Synapse::new(Extraction::<Contact>::new("the contact details"), provider.clone())
        .unwrap();

    let contact = synapse
        .fire(
            &CancellationToken::new(),
            &mut Session::new(),
            "Reach Ada Lovelace at ada@example.org".into(),
        )
        .await
        .unwrap();

    assert_eq!(
        contact,
        Contact {
            name: "Ada Lovelace".into(),
            email: Some("ada@example.org".into()),
            phones: vec![],
        }
    );
    let sent = &provider.calls()[0].messages[0].content;
    assert!(sent.contains("\"phones\""));
}

#[tokio::test]
async fn extraction_runs_the_caller_validation() {
    let provider = scripted(r#"{"name": "  "}"#);
    let synapse = Synapse::new(Extraction::<Contact>::new("the contact"), provider).unwrap();

    let err = synapse
        .fire(&CancellationToken::new(), &mut Session::new(), "nobody".into())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("name"));
}

#[derive(Debug, Clone, Serialize)]
struct Metrics {
    latency_ms: Vec<u32>,
    errors: u32,
}

#[tokio::test]
async fn analyze_serializes_the_data() {
    let provider = scripted(
        r#"{"analysis": "Latency is creeping up.", "confidence": 0.6,
            "findings": ["p99 doubled"], "reasoning": "trend"}"#,
    );
    let synapse = Synapse::new(Analyze::<Metrics>::new("the service metrics"), provider.clone())
        .unwrap();

    let analysis = synapse
        .fire_with_input(
            &CancellationToken::new(),
            &mut Session::new(),
            AnalyzeInput {
                focus: Some("latency".into()),
                ..AnalyzeInput::new(Metrics {
                    latency_ms: vec![80, 95, 160],
                    errors: 2,
                })
            },
        )
        .await
        .unwrap();

    assert_eq!(analysis, "Latency is creeping up.");
    assert!(provider.calls()[0].messages[0].content.contains("\"latency_ms\""));
}

#[derive(Debug, Clone, Serialize)]
struct LegacyUser {
    full_name: String,
    mail: String,
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
struct User {
    first_name: String,
    last_name: String,
    email: String,
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("email", &self.email)
    }
}

#[tokio::test]
async fn convert_maps_one_type_onto_another() {
    let provider = scripted(
        r#"{"first_name": "Grace", "last_name": "Hopper", "email": "grace@example.org"}"#,
    );
    let synapse = Synapse::builder(
        Convert::<LegacyUser, User>::new("legacy users to the new user record"),
        provider,
    )
    .defaults(ConvertInput {
        rules: vec!["Split full_name on the last space.".into()],
        ..Default::default()
    })
    .build()
    .unwrap();

    let user = synapse
        .fire(
            &CancellationToken::new(),
            &mut Session::new(),
            LegacyUser {
                full_name: "Grace Hopper".into(),
                mail: "grace@example.org".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(user.last_name, "Hopper");
}

#[tokio::test]
async fn convert_without_data_is_an_invalid_prompt() {
    let provider = scripted("{}");
    let synapse = Synapse::new(Convert::<LegacyUser, User>::new("users"), provider.clone()).unwrap();

    let err = synapse
        .fire_with_input(
            &CancellationToken::new(),
            &mut Session::new(),
            ConvertInput::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DendriteError::InvalidPrompt(_)));
    assert_eq!(provider.call_count(), 0);
}
