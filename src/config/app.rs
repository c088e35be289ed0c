//! Main application configuration
//!
//! This module defines the primary configuration structures for the zugol
//! ladder, including file and environment variable loading and validation.

use crate::config::ladder::LadderSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub ladder: LadderSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "zugol".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Ladder settings
        if let Some(freeze) = parse_env("FREEZE_PERIOD_GAMES")? {
            self.ladder.freeze_period_games = freeze;
        }
        if let Some(change) = parse_env("RATING_CHANGE_PER_GAME")? {
            self.ladder.rating_change_per_game = change;
        }
        if let Some(policy) = parse_env("KOMI_POLICY")? {
            self.ladder.komi_policy = policy;
        }
        if let Some(max_handicap) = parse_env("MAX_HANDICAP")? {
            self.ladder.max_handicap = max_handicap;
        }
        if let Some(retries) = parse_env("MAX_SAVE_RETRIES")? {
            self.ladder.max_save_retries = retries;
        }
        if let Some(limit) = parse_env("RECENT_GAMES_LIMIT")? {
            self.ladder.recent_games_limit = limit;
        }
        if let Some(length) = parse_env("MAX_NOTES_LENGTH")? {
            self.ladder.max_notes_length = length;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    // Validate ladder settings
    config.ladder.validate()?;

    Ok(())
}
