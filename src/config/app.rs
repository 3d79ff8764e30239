//! Main application configuration
//!
//! Defines the primary configuration structures for the match orchestration
//! service, including file and environment variable loading with validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub match_rules: MatchSettings,
    pub audio: AudioSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Match lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Rounds played before the match is over
    pub round_count: u32,
    /// Signups needed for a full lobby
    pub lobby_capacity: usize,
    /// Display names for the two teams
    pub team_names: [String; 2],
}

/// Audio announcement settings. Empty tokens leave the audio plugin
/// disabled without failing startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AudioSettings {
    pub team_1_token: String,
    pub team_2_token: String,
    /// Voice worker executable spawned per team
    pub worker_binary: PathBuf,
    pub lobby_channel: u64,
    pub team_1_channel: u64,
    pub team_2_channel: u64,
    /// Cue name to sound file mapping; unknown cues are skipped
    pub sounds: HashMap<String, PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ready-room".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            round_count: 2,
            lobby_capacity: 12,
            team_names: ["Team 1".to_string(), "Team 2".to_string()],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to
    /// defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(rounds) = env::var("ROUND_COUNT") {
            config.match_rules.round_count = rounds
                .parse()
                .map_err(|_| anyhow!("Invalid ROUND_COUNT value: {}", rounds))?;
        }
        if let Ok(capacity) = env::var("LOBBY_CAPACITY") {
            config.match_rules.lobby_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_CAPACITY value: {}", capacity))?;
        }
        if let Ok(token) = env::var("TEAM_1_TOKEN") {
            config.audio.team_1_token = token;
        }
        if let Ok(token) = env::var("TEAM_2_TOKEN") {
            config.audio.team_2_token = token;
        }
        if let Ok(binary) = env::var("AUDIO_WORKER_BINARY") {
            config.audio.worker_binary = PathBuf::from(binary);
        }
        if let Ok(channel) = env::var("LOBBY_CHANNEL") {
            config.audio.lobby_channel = channel
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_CHANNEL value: {}", channel))?;
        }
        if let Ok(channel) = env::var("TEAM_1_CHANNEL") {
            config.audio.team_1_channel = channel
                .parse()
                .map_err(|_| anyhow!("Invalid TEAM_1_CHANNEL value: {}", channel))?;
        }
        if let Ok(channel) = env::var("TEAM_2_CHANNEL") {
            config.audio.team_2_channel = channel
                .parse()
                .map_err(|_| anyhow!("Invalid TEAM_2_CHANNEL value: {}", channel))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Whether audio announcements are configured at all
    pub fn audio_enabled(&self) -> bool {
        !self.audio.team_1_token.is_empty() && !self.audio.team_2_token.is_empty()
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.match_rules.round_count == 0 {
        return Err(anyhow!("Round count must be greater than 0"));
    }
    // Two captains plus at least one draftable player each
    if config.match_rules.lobby_capacity < 4 {
        return Err(anyhow!("Lobby capacity must be at least 4"));
    }
    if config.match_rules.lobby_capacity % 2 != 0 {
        return Err(anyhow!("Lobby capacity must be even"));
    }

    if config.audio_enabled() && config.audio.worker_binary.as_os_str().is_empty() {
        return Err(anyhow!("Audio worker binary must be set when tokens are configured"));
    }

    Ok(())
}
