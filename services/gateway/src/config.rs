//! services/gateway/src/config.rs
//!
//! Defines the gateway's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;

use learning_engine_core::{LessonConfig, Reward};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the mastery-engine backend, without a trailing slash.
    pub backend_url: String,
    pub log_level: Level,
    pub backend_timeout: Duration,
    pub allowed_origin: String,
    pub lesson: LessonConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Backend ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("BACKEND_URL".to_string()))?
            .trim()
            .trim_end_matches('/')
            .to_string();

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let backend_timeout =
            Duration::from_secs(parse_number(&lookup, "BACKEND_TIMEOUT_SECS", 10)?);
        let allowed_origin = lookup("ALLOWED_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Lesson Tuning ---
        let defaults = LessonConfig::default();
        let lesson = LessonConfig {
            max_hearts: parse_number(&lookup, "MAX_HEARTS", defaults.max_hearts)?,
            milestone_every: parse_number(&lookup, "STREAK_MILESTONE", defaults.milestone_every)?,
            reward: Reward {
                xp: parse_number(&lookup, "REWARD_XP", defaults.reward.xp)?,
                coins: parse_number(&lookup, "REWARD_COINS", defaults.reward.coins)?,
            },
        };
        if lesson.milestone_every == 0 {
            return Err(ConfigError::InvalidValue(
                "STREAK_MILESTONE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            backend_url,
            log_level,
            backend_timeout,
            allowed_origin,
            lesson,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
