//! End-to-end turn tests against a scripted provider.
//!
//! These cover the turn contract without any network access:
//! - A normal turn grows the log by exactly two lines
//! - Provider failures degrade to the fallback narrative
//! - Only one turn may be in flight per session
//! - Cancelling a turn leaves the session idle and consistent

use alien_core::testing::MockProvider;
use alien_core::{
    MetricsPolicy, NarrativeEngine, Phase, Sender, Session, SessionConfig, SessionError, StoryId,
    TraitSet, FALLBACK_NARRATIVE,
};
use groq::Role;

fn prison_session() -> Session {
    let traits = TraitSet::new(6, 6, 6).unwrap();
    Session::initialize(traits, StoryId::PrisonEscape, "Ripley", "k").unwrap()
}

#[tokio::test]
async fn test_look_around_adds_two_lines() {
    let provider = MockProvider::new().reply("Moss covers the walls. A guard yawns.");
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 1);

    let before = engine.snapshot();
    let outcome = engine.submit("look around").await.unwrap();
    let after = outcome.snapshot;

    assert_eq!(after.messages.len(), before.messages.len() + 2);
    let new_lines = &after.messages[before.messages.len()..];
    assert_eq!(new_lines[0].sender, Sender::Player);
    assert_eq!(new_lines[0].content, "look around");
    assert_eq!(new_lines[1].sender, Sender::Narrator);
    assert_eq!(new_lines[1].content, "Moss covers the walls. A guard yawns.");

    let danger_before = before.gauge("danger").unwrap().value;
    let danger_after = after.gauge("danger").unwrap().value;
    assert!(danger_after >= danger_before);
    assert_eq!(after.phase, Phase::Idle);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_request_shape() {
    let provider = MockProvider::new().reply("ok").reply("ok");
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 1);

    engine.submit("look around").await.unwrap();
    engine.submit("whistle").await.unwrap();

    let request = provider.last_request().unwrap();
    let roles: Vec<_> = request.messages.iter().map(|m| m.role).collect();
    // system, welcome, look around, reply, whistle
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User
        ]
    );
    assert!(request.messages[0]
        .content
        .starts_with("A Prison Escape. You wake up in a cold, damp cell."));
    assert!(request.messages[0]
        .content
        .ends_with("Incorporate elements of agility into the narrative."));
    assert_eq!(request.messages[4].content, "whistle");
    assert_eq!(
        request
            .messages
            .iter()
            .filter(|m| m.content == "whistle")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_provider_failure_still_completes_turn() {
    let provider = MockProvider::new().fail(groq::Error::Api {
        status: 500,
        message: "internal".into(),
    });
    let engine = NarrativeEngine::with_seed(prison_session(), provider, 3);

    let outcome = engine.submit("shout for help").await.unwrap();

    assert!(outcome.degraded);
    assert_eq!(outcome.narrative, FALLBACK_NARRATIVE);
    assert_eq!(outcome.snapshot.messages.len(), 3);
    assert_eq!(
        outcome.snapshot.messages.last().unwrap().content,
        FALLBACK_NARRATIVE
    );
    assert_eq!(outcome.snapshot.gauge("danger").unwrap().value, 1);
    assert_eq!(outcome.snapshot.phase, Phase::Idle);
}

#[tokio::test]
async fn test_second_turn_rejected_while_in_flight() {
    let provider = MockProvider::held().reply("The lock clicks.");
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 5);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.submit("pick the lock").await }
    });
    provider.started().await;

    let second = engine.submit("run").await;
    assert_eq!(second.unwrap_err(), SessionError::ConcurrentTurnRejected);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::AwaitingCompletion);
    let players = snapshot
        .messages
        .iter()
        .filter(|m| m.sender == Sender::Player)
        .count();
    assert_eq!(players, 1);
    assert_eq!(provider.calls(), 1);

    provider.release();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.narrative, "The lock clicks.");
    assert_eq!(engine.phase(), Phase::Idle);

    provider.release();
    engine.submit("run").await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_cancel_leaves_session_idle() {
    let provider = MockProvider::held().reply("never delivered");
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 8);

    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.submit("dig").await }
    });
    provider.started().await;

    assert!(engine.cancel());
    let result = task.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::TurnCancelled);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages.last().unwrap().sender, Sender::Player);
    assert_eq!(snapshot.gauge("stress").unwrap().value, 50);
    assert_eq!(snapshot.gauge("danger").unwrap().value, 0);
}

#[tokio::test]
async fn test_cancel_after_reply_ready_still_cancels() {
    let provider = MockProvider::held().reply("arrived too late");
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 8);

    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.submit("climb").await }
    });
    provider.started().await;

    // Reply is unblocked before the cancel, with no yield in between
    provider.release();
    assert!(engine.cancel());
    let result = task.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::TurnCancelled);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.messages.len(), 2);
    assert!(snapshot
        .messages
        .iter()
        .all(|m| m.content != "arrived too late"));
    assert_eq!(snapshot.gauge("stress").unwrap().value, 50);
    assert!(!engine.cancel());
}

#[tokio::test]
async fn test_dropped_turn_future_abandons_turn() {
    let provider = MockProvider::held();
    let engine = NarrativeEngine::with_seed(prison_session(), provider.clone(), 8);

    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.submit("wait").await }
    });
    provider.started().await;
    task.abort();
    let _ = task.await;

    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.snapshot().messages.len(), 2);
}

#[tokio::test]
async fn test_turn_requires_credential() {
    let traits = TraitSet::new(6, 6, 6).unwrap();
    let session = Session::new(
        SessionConfig::new(StoryId::PlaneCrash, "Brett", traits)
            .with_metrics(MetricsPolicy::health()),
    )
    .unwrap();
    let provider = MockProvider::new().reply("You hear a river.");
    let engine = NarrativeEngine::with_seed(session, provider.clone(), 2);

    assert!(matches!(
        engine.submit("listen").await,
        Err(SessionError::InvalidConfiguration(_))
    ));
    assert_eq!(engine.phase(), Phase::AwaitingCredential);
    assert!(engine.snapshot().messages.is_empty());

    engine.supply_credential("gsk_key").unwrap();
    let outcome = engine.submit("listen").await.unwrap();
    assert_eq!(outcome.snapshot.gauge("health").unwrap().max, 100);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_many_turns_keep_metrics_bounded() {
    let provider = MockProvider::new();
    let engine = NarrativeEngine::with_seed(prison_session(), provider, 11);
    let mut previous_len = engine.snapshot().messages.len();

    for i in 0..25 {
        let outcome = engine.submit(&format!("step {i}")).await.unwrap();
        let snapshot = outcome.snapshot;
        assert_eq!(snapshot.messages.len(), previous_len + 2);
        previous_len = snapshot.messages.len();

        let stress = snapshot.gauge("stress").unwrap().value;
        let danger = snapshot.gauge("danger").unwrap().value;
        assert!((0..=100).contains(&stress));
        assert_eq!(danger, (i + 1).min(10));
    }
}
