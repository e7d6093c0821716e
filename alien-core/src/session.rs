//! Session state and the turn state machine.
//!
//! A [`Session`] owns everything about one player's run: the validated
//! traits, the resolved story, the live metrics, the message log and the
//! credential. It starts in [`Phase::AwaitingCredential`]; supplying a
//! credential moves it to [`Phase::Idle`] for the rest of its life, and
//! each turn moves it through [`Phase::AwaitingCompletion`] and back.
//!
//! The session itself never touches the network. [`Session::begin_turn`]
//! hands back a [`PendingTurn`] carrying the assembled request, and the
//! caller reports the outcome with [`Session::finish_turn`] or
//! [`Session::abandon_turn`].

use crate::character::TraitSet;
use crate::context;
use crate::message::{Message, MessageLog, Sender};
use crate::metrics::{Metrics, MetricsPolicy};
use crate::theme::{self, StoryId, ThemeConfig};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Bootstrap inputs that violate their constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be between 1 and 10, got {value}")]
    TraitOutOfRange { name: &'static str, value: i64 },

    #[error("Player name must not be empty")]
    EmptyPlayerName,

    #[error("No credential supplied - set GROQ_API_KEY or enter a key")]
    MissingCredential,

    #[error("Credential already supplied for this session")]
    CredentialAlreadySupplied,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Errors from session and turn operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("A turn is already awaiting completion")]
    ConcurrentTurnRejected,

    #[error("Player input is empty")]
    EmptyInput,

    #[error("No turn is awaiting completion")]
    NoTurnInFlight,

    #[error("Turn cancelled before the narrator answered")]
    TurnCancelled,
}

/// Opaque provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, rejecting blank input.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Correlation id for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Created, but no credential yet. No turns possible.
    AwaitingCredential,
    /// Ready for player input.
    Idle,
    /// A completion request is in flight.
    AwaitingCompletion,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::AwaitingCredential => "awaiting credential",
            Phase::Idle => "idle",
            Phase::AwaitingCompletion => "awaiting completion",
        };
        f.write_str(s)
    }
}

/// Configuration for creating a new session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub story: StoryId,
    pub player_name: String,
    pub traits: TraitSet,
    pub metrics: MetricsPolicy,
}

impl SessionConfig {
    pub fn new(story: StoryId, player_name: impl Into<String>, traits: TraitSet) -> Self {
        Self {
            story,
            player_name: player_name.into(),
            traits,
            metrics: MetricsPolicy::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsPolicy) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Everything needed to run the remote half of a turn.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub turn: u64,
    pub request: groq::Request,
    pub credential: Credential,
}

/// One player's run through a story.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    traits: TraitSet,
    theme: ThemeConfig,
    player_name: String,
    metrics: Metrics,
    log: MessageLog,
    credential: Option<Credential>,
    phase: Phase,
    turns: u64,
}

impl Session {
    /// Create a session awaiting its credential.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let player_name = config.player_name.trim().to_string();
        if player_name.is_empty() {
            return Err(ConfigError::EmptyPlayerName);
        }
        config.metrics.validate()?;

        let session = Self {
            id: SessionId::new(),
            traits: config.traits,
            theme: theme::resolve(config.story),
            player_name,
            metrics: Metrics::from_policy(&config.metrics),
            log: MessageLog::new(),
            credential: None,
            phase: Phase::AwaitingCredential,
            turns: 0,
        };

        tracing::info!(
            session = %session.id,
            story = %session.theme.story,
            player = %session.player_name,
            traits = %session.traits,
            "session created"
        );
        Ok(session)
    }

    /// Create a session and supply its credential in one step.
    pub fn initialize(
        traits: TraitSet,
        story: StoryId,
        player_name: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let mut session = Self::new(SessionConfig::new(story, player_name, traits))?;
        session.supply_credential(credential)?;
        Ok(session)
    }

    /// Supply the credential. Allowed exactly once; appends the welcome line.
    pub fn supply_credential(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        if self.credential.is_some() {
            return Err(ConfigError::CredentialAlreadySupplied);
        }
        let credential = Credential::new(key)?;

        self.credential = Some(credential);
        self.phase = Phase::Idle;
        let welcome = self.welcome_message();
        self.log.push(Message::narrator(welcome));

        tracing::info!(session = %self.id, "credential accepted");
        Ok(())
    }

    /// The first narrator line of a session.
    pub fn welcome_message(&self) -> String {
        format!(
            "Welcome, {}, to \"{}\"! You have {}. {}",
            self.player_name, self.theme.title, self.traits, self.theme.initial_prompt
        )
    }

    /// Append a message to the log. Fails before the credential is supplied.
    pub fn append_message(
        &mut self,
        sender: Sender,
        content: impl Into<String>,
    ) -> Result<(), SessionError> {
        if self.phase == Phase::AwaitingCredential {
            return Err(ConfigError::MissingCredential.into());
        }
        self.log.push(Message::new(sender, content));
        Ok(())
    }

    /// Adjust a metric, saturating at its bounds.
    ///
    /// Returns the new value, or `None` for a name the policy doesn't declare.
    pub fn update_metric(&mut self, name: &str, delta: i32) -> Option<i32> {
        let value = self.metrics.update(name, delta);
        if value.is_none() {
            tracing::warn!(session = %self.id, metric = name, "unknown metric ignored");
        }
        value
    }

    /// Start a turn: record the player line and assemble the request.
    ///
    /// The player line is visible in the log before the completion resolves.
    pub fn begin_turn(&mut self, input: &str) -> Result<PendingTurn, SessionError> {
        let credential = match (self.phase, &self.credential) {
            (Phase::AwaitingCredential, _) | (_, None) => {
                return Err(ConfigError::MissingCredential.into())
            }
            (Phase::AwaitingCompletion, _) => {
                tracing::warn!(session = %self.id, "turn rejected: another is in flight");
                return Err(SessionError::ConcurrentTurnRejected);
            }
            (Phase::Idle, Some(credential)) => credential.clone(),
        };

        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.log.push(Message::player(input));
        let request = context::build(self, input);
        self.phase = Phase::AwaitingCompletion;
        self.turns += 1;

        Ok(PendingTurn {
            turn: self.turns,
            request,
            credential,
        })
    }

    /// Finish the in-flight turn with the narrator's text and apply the
    /// metrics policy.
    pub fn finish_turn<R: Rng + ?Sized>(
        &mut self,
        text: impl Into<String>,
        rng: &mut R,
    ) -> Result<(), SessionError> {
        if self.phase != Phase::AwaitingCompletion {
            return Err(SessionError::NoTurnInFlight);
        }
        self.log.push(Message::narrator(text));
        self.metrics.advance(rng);
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Drop the in-flight turn without a narrator line or metric change.
    pub fn abandon_turn(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::AwaitingCompletion {
            return Err(SessionError::NoTurnInFlight);
        }
        self.phase = Phase::Idle;
        tracing::info!(session = %self.id, turn = self.turns, "turn abandoned");
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn traits(&self) -> &TraitSet {
        &self.traits
    }

    pub fn story(&self) -> StoryId {
        self.theme.story
    }

    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of turns begun so far.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}
