//! The turn controller.
//!
//! [`NarrativeEngine`] wraps one [`Session`] and runs turns against a
//! [`CompletionProvider`]. It is cheap to clone and safe to share between
//! tasks. At most one turn is in flight at a time; a second
//! [`NarrativeEngine::submit`] while one is pending fails immediately with
//! [`SessionError::ConcurrentTurnRejected`] and leaves the log untouched.
//!
//! Every state change is published as a [`SessionSnapshot`] on a watch
//! channel, so a renderer can [`subscribe`](NarrativeEngine::subscribe) and
//! redraw without polling.
//!
//! # Cancellation
//!
//! A pending turn ends early if [`NarrativeEngine::cancel`] is called or
//! the `submit` future is dropped. Either way the session goes back to
//! [`Phase::Idle`] with the player line kept, no narrator line, and the
//! metrics unchanged.

use crate::completion::{CompletionClient, CompletionProvider, GroqProvider};
use crate::config::EngineConfig;
use crate::render::SessionSnapshot;
use crate::session::{ConfigError, PendingTurn, Phase, Session, SessionError, SessionId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};
use tracing::Instrument;

/// What a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn: u64,
    pub narrative: String,
    /// The provider failed and `narrative` is the fallback line.
    pub degraded: bool,
    pub snapshot: SessionSnapshot,
}

struct EngineState {
    session: Session,
    rng: StdRng,
    cancel: Option<oneshot::Sender<()>>,
}

struct Inner<P> {
    state: Mutex<EngineState>,
    client: CompletionClient<P>,
    updates: watch::Sender<SessionSnapshot>,
}

/// Runs turns for one session.
pub struct NarrativeEngine<P = GroqProvider> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for NarrativeEngine<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl NarrativeEngine<GroqProvider> {
    /// An engine talking to Groq with the given settings.
    ///
    /// `config.metrics` is not read here; the session already has its
    /// gauges. Build it with [`EngineConfig::session_config`] to apply them.
    pub fn from_config(session: Session, config: &EngineConfig) -> Self {
        let provider = GroqProvider::new()
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(session, provider, rng)
    }
}

impl<P: CompletionProvider> NarrativeEngine<P> {
    pub fn new(session: Session, provider: P) -> Self {
        Self::with_rng(session, provider, StdRng::from_entropy())
    }

    /// An engine whose metric rolls are reproducible.
    pub fn with_seed(session: Session, provider: P, seed: u64) -> Self {
        Self::with_rng(session, provider, StdRng::seed_from_u64(seed))
    }

    fn with_rng(session: Session, provider: P, rng: StdRng) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::from_session(&session));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState {
                    session,
                    rng,
                    cancel: None,
                }),
                client: CompletionClient::new(provider),
                updates,
            }),
        }
    }

    /// Supply the session credential. Allowed once.
    pub fn supply_credential(&self, key: impl Into<String>) -> Result<(), ConfigError> {
        let mut state = self.inner.lock();
        state.session.supply_credential(key)?;
        self.inner.publish(&state.session);
        Ok(())
    }

    /// Run one turn for `input`.
    ///
    /// The player line is published before the provider is called. The
    /// provider's failures never surface here; they become the fallback
    /// narrative with `degraded` set.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, SessionError> {
        let (pending, session_id, cancelled) = {
            let mut state = self.inner.lock();
            let pending = state.session.begin_turn(input)?;
            let (tx, rx) = oneshot::channel();
            state.cancel = Some(tx);
            self.inner.publish(&state.session);
            (pending, state.session.id(), rx)
        };

        let span = tracing::info_span!("turn", session = %session_id, turn = pending.turn);
        self.run_turn(pending, cancelled).instrument(span).await
    }

    async fn run_turn(
        &self,
        pending: PendingTurn,
        cancelled: oneshot::Receiver<()>,
    ) -> Result<TurnOutcome, SessionError> {
        let mut guard = TurnGuard {
            state: &self.inner.state,
            updates: &self.inner.updates,
            turn: pending.turn,
            armed: true,
        };

        let completion = tokio::select! {
            completion = self.inner.client.complete(pending.request, &pending.credential) => completion,
            _ = cancelled => {
                tracing::info!("turn cancelled");
                return Err(SessionError::TurnCancelled);
            }
        };

        let mut state = self.inner.lock();
        // A cancel that lands after the reply arrived still wins
        if state.cancel.take().is_none() {
            drop(state);
            tracing::info!("turn cancelled after completion");
            return Err(SessionError::TurnCancelled);
        }
        guard.armed = false;

        let EngineState { session, rng, .. } = &mut *state;
        session.finish_turn(completion.text.clone(), rng)?;
        let snapshot = SessionSnapshot::from_session(session);
        self.inner.updates.send_replace(snapshot.clone());

        tracing::info!(
            degraded = completion.degraded,
            messages = snapshot.messages.len(),
            "turn complete"
        );

        Ok(TurnOutcome {
            turn: pending.turn,
            narrative: completion.text,
            degraded: completion.degraded,
            snapshot,
        })
    }

    /// Abort the turn in flight, if any. Returns whether there was one.
    ///
    /// When this returns `true` the turn ends with
    /// [`SessionError::TurnCancelled`], even if the provider had already
    /// replied.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.lock();
        match state.cancel.take() {
            Some(tx) => {
                tx.send(()).ok();
                true
            }
            None => false,
        }
    }

    /// Adjust a metric outside the turn cycle.
    pub fn update_metric(&self, name: &str, delta: i32) -> Option<i32> {
        let mut state = self.inner.lock();
        let value = state.session.update_metric(name, delta);
        self.inner.publish(&state.session);
        value
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_session(&self.inner.lock().session)
    }

    /// Read the session under the engine lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.inner.lock().session)
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().session.phase()
    }

    pub fn session_id(&self) -> SessionId {
        self.inner.lock().session.id()
    }

    pub fn provider(&self) -> &P {
        self.inner.client.provider()
    }
}

impl<P> Inner<P> {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.updates
            .send_replace(SessionSnapshot::from_session(session));
    }
}

/// Puts the session back to idle if a turn ends without a narrator line.
struct TurnGuard<'a> {
    state: &'a Mutex<EngineState>,
    updates: &'a watch::Sender<SessionSnapshot>,
    turn: u64,
    armed: bool,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.cancel = None;
        let session = &mut state.session;
        if session.phase() == Phase::AwaitingCompletion
            && session.turns() == self.turn
            && session.abandon_turn().is_ok()
        {
            self.updates
                .send_replace(SessionSnapshot::from_session(session));
        }
    }
}
