//! Engine configuration.
//!
//! Loaded from TOML (every field optional) and/or `QUIZ_*` environment
//! variables layered over the defaults.

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::quiz_engine::errors::ConfigError;

/// What happens to the visible bank when a regeneration is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationPolicy {
    /// Drop the bank as soon as generation starts; a failure leaves nothing.
    #[default]
    ClearOnStart,
    /// Keep showing the previous bank until a new one replaces it.
    PreserveOnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api_base_url: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub default_question_count: usize,
    pub max_question_count: usize,
    pub regeneration_policy: RegenerationPolicy,
    pub persist_learning_plans: bool,
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            api_base_url: None,
            auth_token: None,
            request_timeout_secs: 30,
            default_question_count: 5,
            max_question_count: 20,
            regeneration_policy: RegenerationPolicy::ClearOnStart,
            persist_learning_plans: true,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overridden by any `QUIZ_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in practice).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QUIZ_API_BASE_URL") {
            self.api_base_url = Some(url);
        }
        if let Some(token) = lookup("QUIZ_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }
        if let Some(v) = lookup("QUIZ_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_field("request_timeout_secs", &v)?;
        }
        if let Some(v) = lookup("QUIZ_QUESTION_COUNT") {
            self.default_question_count = parse_field("default_question_count", &v)?;
        }
        if let Some(v) = lookup("QUIZ_RNG_SEED") {
            self.rng_seed = Some(parse_field("rng_seed", &v)?);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        if self.max_question_count == 0 {
            return Err(invalid("max_question_count", "must be greater than zero"));
        }
        if self.default_question_count == 0 || self.default_question_count > self.max_question_count {
            return Err(invalid(
                "default_question_count",
                format!("must be between 1 and {}", self.max_question_count),
            ));
        }
        if let Some(url) = &self.api_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("api_base_url", format!("'{url}' is not an http(s) URL")));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Requested count, or the default, clamped into `1..=max_question_count`.
    pub fn question_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_question_count)
            .clamp(1, self.max_question_count)
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(field, format!("'{raw}' is not a valid number")))
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, message: message.into() }
}
