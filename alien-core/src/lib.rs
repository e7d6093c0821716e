//! Narrative session engine for the Alien Planet Console.
//!
//! This crate provides:
//! - Story catalogue and theme resolution
//! - Session state with bounded metrics and an append-only message log
//! - Context assembly for an OpenAI-compatible chat-completion provider
//! - A fail-soft completion client and a single-flight turn controller
//! - Snapshots for renderers to draw from
//!
//! # Quick Start
//!
//! ```ignore
//! use alien_core::{EngineConfig, NarrativeEngine, Session, StoryId, TraitSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_env()?;
//!     let traits = TraitSet::new(6, 6, 6)?;
//!     let session = Session::new(config.session_config(StoryId::PrisonEscape, "Ripley", traits))?;
//!
//!     let engine = NarrativeEngine::from_config(session, &config);
//!     engine.supply_credential(std::env::var("GROQ_API_KEY")?)?;
//!
//!     let outcome = engine.submit("I look around").await?;
//!     println!("{}", outcome.narrative);
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod completion;
pub mod config;
pub mod context;
pub mod engine;
pub mod message;
pub mod metrics;
pub mod render;
pub mod session;
pub mod testing;
pub mod theme;

// Primary public API
pub use character::{Trait, TraitSet};
pub use completion::{
    Completion, CompletionClient, CompletionProvider, GroqProvider, FALLBACK_NARRATIVE,
};
pub use config::EngineConfig;
pub use engine::{NarrativeEngine, TurnOutcome};
pub use message::{Message, MessageLog, Sender};
pub use metrics::{GaugeSpec, GaugeStyle, Metrics, MetricsPolicy, UpdateRule};
pub use render::{GaugeReading, SessionSnapshot};
pub use session::{
    ConfigError, Credential, Phase, Session, SessionConfig, SessionError, SessionId,
};
pub use testing::{MockProvider, StubServer};
pub use theme::{resolve, StoryId, ThemeConfig};
