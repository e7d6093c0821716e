//! Integration tests that call the real Groq API.
//!
//! These tests require GROQ_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p alien-core --test api_integration -- --ignored`
//!
//! These are marked #[ignore] by default to avoid:
//! - API usage in CI
//! - Test failures when no API key is available
//! - Slow test runs

use alien_core::{EngineConfig, NarrativeEngine, Phase, Session, StoryId, TraitSet};

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

fn api_key() -> Option<String> {
    std::env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty())
}

#[tokio::test]
#[ignore] // Run with: cargo test -p alien-core --test api_integration -- --ignored
async fn test_live_turn() {
    setup();
    let Some(key) = api_key() else {
        eprintln!("Skipping test: GROQ_API_KEY not set");
        return;
    };

    let traits = TraitSet::new(6, 6, 6).unwrap();
    let session = Session::initialize(traits, StoryId::PrisonEscape, "Ripley", key).unwrap();
    let config = EngineConfig::from_env().expect("valid environment");
    let engine = NarrativeEngine::from_config(session, &config);

    let outcome = engine.submit("I look around my cell").await.unwrap();

    println!("GAMEMASTER: {}", outcome.narrative);
    assert!(!outcome.degraded, "live call should not fall back");
    assert!(!outcome.narrative.is_empty());
    assert_eq!(outcome.snapshot.messages.len(), 3);
    assert_eq!(engine.phase(), Phase::Idle);
}

#[tokio::test]
#[ignore]
async fn test_live_invalid_key_degrades() {
    setup();
    if api_key().is_none() {
        eprintln!("Skipping test: GROQ_API_KEY not set");
        return;
    }

    let traits = TraitSet::default();
    let session =
        Session::initialize(traits, StoryId::SpaceAdventure, "Kane", "gsk_invalid").unwrap();
    let engine = NarrativeEngine::from_config(session, &EngineConfig::default());

    let outcome = engine.submit("check the comms").await.unwrap();
    assert!(outcome.degraded);
}
