//! Turns over real HTTP against a local stub server.

use alien_core::testing::StubServer;
use alien_core::{
    EngineConfig, NarrativeEngine, Phase, Session, StoryId, TraitSet, FALLBACK_NARRATIVE,
};
use std::time::Duration;

fn engine_for(server: &StubServer) -> NarrativeEngine {
    let traits = TraitSet::new(6, 6, 6).unwrap();
    let session = Session::initialize(traits, StoryId::PrisonEscape, "Ripley", "gsk_test").unwrap();
    let config = EngineConfig::default()
        .with_base_url(server.base_url())
        .with_timeout(Duration::from_secs(5))
        .with_seed(4);
    NarrativeEngine::from_config(session, &config)
}

#[tokio::test]
async fn test_successful_completion_over_http() {
    let server = StubServer::respond(
        "200 OK",
        r#"{"id":"chatcmpl-1","model":"llama3-8b-8192","choices":[{"index":0,"message":{"role":"assistant","content":"Water drips from the ceiling."},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":6}}"#,
    )
    .await
    .unwrap();
    let engine = engine_for(&server);

    let outcome = engine.submit("look around").await.unwrap();
    assert!(!outcome.degraded);
    assert_eq!(outcome.narrative, "Water drips from the ceiling.");

    let recorded = server.recorded().await.unwrap();
    assert_eq!(
        recorded.request_line(),
        "POST /v1/chat/completions HTTP/1.1"
    );
    assert_eq!(recorded.header("authorization"), Some("Bearer gsk_test"));

    let body = recorded.json().unwrap();
    assert_eq!(body["model"], "llama3-8b-8192");
    assert_eq!(body["temperature"], 1.0);
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["top_p"], 1.0);
    assert_eq!(body["stream"], false);
    assert!(body["stop"].is_null());

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages.last().unwrap()["role"], "user");
    assert_eq!(messages.last().unwrap()["content"], "look around");
}

#[tokio::test]
async fn test_non_success_status_degrades() {
    let server = StubServer::respond(
        "401 Unauthorized",
        r#"{"error":{"message":"Invalid API Key"}}"#,
    )
    .await
    .unwrap();
    let engine = engine_for(&server);

    let outcome = engine.submit("look around").await.unwrap();
    assert!(outcome.degraded);
    assert_eq!(outcome.narrative, FALLBACK_NARRATIVE);
    assert_eq!(outcome.snapshot.messages.len(), 3);
    assert_eq!(outcome.snapshot.gauge("danger").unwrap().value, 1);
    assert_eq!(engine.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_malformed_body_degrades() {
    let server = StubServer::respond("200 OK", "not json").await.unwrap();
    let engine = engine_for(&server);

    let outcome = engine.submit("look around").await.unwrap();
    assert!(outcome.degraded);
    assert_eq!(outcome.narrative, FALLBACK_NARRATIVE);
}

#[tokio::test]
async fn test_missing_choices_degrades() {
    let server = StubServer::respond("200 OK", r#"{"id":"x","model":"m","choices":[]}"#)
        .await
        .unwrap();
    let engine = engine_for(&server);

    let outcome = engine.submit("look around").await.unwrap();
    assert!(outcome.degraded);
}
