//! Engine configuration.

use crate::character::TraitSet;
use crate::metrics::MetricsPolicy;
use crate::session::{ConfigError, SessionConfig};
use crate::theme::StoryId;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for the completion provider and the metrics policy.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Model identifier sent with every request.
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,

    /// Total timeout for one completion request.
    pub timeout: Duration,

    /// Gauges tracked by new sessions.
    ///
    /// Sessions are built before the engine, so this only takes effect
    /// through [`EngineConfig::session_config`] (or by passing it to
    /// [`SessionConfig::with_metrics`] yourself).
    pub metrics: MetricsPolicy,

    /// Seed for metric rolls. Random when unset.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: groq::DEFAULT_MODEL.to_string(),
            base_url: groq::API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            metrics: MetricsPolicy::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment.
    ///
    /// Recognises `GROQ_MODEL`, `GROQ_BASE_URL`, `GROQ_TIMEOUT_SECS`,
    /// `ALIEN_METRICS` and `ALIEN_SEED`. Unset or blank variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(model) = get("GROQ_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = get("GROQ_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = get("GROQ_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                ConfigError::InvalidSetting(format!("GROQ_TIMEOUT_SECS must be a whole number, got {secs:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(name) = get("ALIEN_METRICS") {
            config.metrics = parse_metrics(&name)?;
        }
        if let Some(seed) = get("ALIEN_SEED") {
            config.seed = Some(seed.parse::<u64>().map_err(|_| {
                ConfigError::InvalidSetting(format!("ALIEN_SEED must be a whole number, got {seed:?}"))
            })?);
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsPolicy) -> Self {
        self.metrics = metrics;
        self
    }

    /// A session config carrying this config's metrics policy.
    pub fn session_config(
        &self,
        story: StoryId,
        player_name: impl Into<String>,
        traits: TraitSet,
    ) -> SessionConfig {
        SessionConfig::new(story, player_name, traits).with_metrics(self.metrics.clone())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Parse a metrics preset name.
pub fn parse_metrics(name: &str) -> Result<MetricsPolicy, ConfigError> {
    MetricsPolicy::preset(name).ok_or_else(|| {
        ConfigError::InvalidSetting(format!(
            "unknown metrics preset {name:?} (expected \"stress\" or \"health\")"
        ))
    })
}
