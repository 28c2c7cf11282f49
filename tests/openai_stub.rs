// tests/openai_stub.rs
//
// BackendSummarizer over OpenAiProvider, pointed at a local chat-completions stub.
// Covered:
// - request shape (model, sampling bounds, system + user messages, bearer auth)
// - success → trimmed backend text
// - 500 / empty content / malformed body → exact template fallback

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use market_sentiment_analyst::config::AiConfig;
use market_sentiment_analyst::summary::{
    fallback_analysis, AnalysisSource, BackendSummarizer, OpenAiProvider, Summarizer,
};
use market_sentiment_analyst::Feed;

const FIXTURE: &str = include_str!("fixtures/feed_sample.json");

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
}

#[derive(Clone)]
struct Stub {
    reply: StatusCode,
    reply_body: &'static str,
    captured: Captured,
}

async fn completions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    *stub.captured.body.lock().unwrap() = Some(body);
    *stub.captured.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (stub.reply, stub.reply_body).into_response()
}

async fn spawn_stub(reply: StatusCode, reply_body: &'static str) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(Stub {
            reply,
            reply_body,
            captured: captured.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v1"), captured)
}

fn summarizer_for(base_url: String) -> BackendSummarizer<OpenAiProvider> {
    let cfg = AiConfig {
        api_key: Some("sk-test-123".into()),
        base_url,
        request_timeout_secs: 5,
        ..AiConfig::default()
    };
    BackendSummarizer::new(OpenAiProvider::new(&cfg).unwrap(), cfg)
}

fn feed() -> Feed {
    Feed::from_json_slice(FIXTURE.as_bytes()).unwrap()
}

#[tokio::test]
async fn successful_completion_is_used_and_request_is_bounded() {
    let (base, captured) = spawn_stub(
        StatusCode::OK,
        concat!(
            r#"{"choices":[{"message":{"role":"assistant","#,
            r#""content":"  Sentiment leans positive at 63% with moderate confidence.\n"}}]}"#
        ),
    )
    .await;

    let out = summarizer_for(base).summarize(&feed(), false).await;
    assert_eq!(out.source, AnalysisSource::Backend);
    assert_eq!(
        out.text,
        "Sentiment leans positive at 63% with moderate confidence."
    );

    let body = captured.body.lock().unwrap().clone().expect("stub saw a request");
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert_eq!(body["max_tokens"], json!(220));
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0]["role"], json!("system"));
    assert_eq!(msgs[1]["role"], json!("user"));
    let user = msgs[1]["content"].as_str().unwrap();
    assert!(user.contains("\nstale: false\nJSON:\n"));
    assert!(user.contains("Spot ETF sees record inflows"));

    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Bearer sk-test-123")
    );
}

#[tokio::test]
async fn server_error_falls_back_to_template() {
    let (base, _) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#).await;
    let f = feed();
    let out = summarizer_for(base).summarize(&f, false).await;
    assert_eq!(out.source, AnalysisSource::Template);
    assert_eq!(out.text, fallback_analysis(&f));
}

#[tokio::test]
async fn empty_content_falls_back_to_template() {
    let (base, _) = spawn_stub(
        StatusCode::OK,
        r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#,
    )
    .await;
    let f = feed();
    let out = summarizer_for(base).summarize(&f, false).await;
    assert_eq!(out.source, AnalysisSource::Template);
    assert_eq!(out.text, fallback_analysis(&f));
}

#[tokio::test]
async fn malformed_body_falls_back_to_template() {
    for body in [r#"{"choices":[]}"#, r#"{"unexpected":true}"#, "not json"] {
        let (base, _) = spawn_stub(StatusCode::OK, body).await;
        let f = feed();
        let out = summarizer_for(base).summarize(&f, false).await;
        assert_eq!(out.source, AnalysisSource::Template, "body: {body}");
        assert_eq!(out.text, fallback_analysis(&f));
    }
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_template() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let f = feed();
    let out = summarizer_for(format!("http://127.0.0.1:{port}/v1"))
        .summarize(&f, true)
        .await;
    assert_eq!(out.source, AnalysisSource::Template);
    assert_eq!(out.text, fallback_analysis(&f));
}
