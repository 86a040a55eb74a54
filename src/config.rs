//! Application-level configuration loading: generation backend, voting and session limits.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::state::mode::GameMode;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/arena.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CHAT_ARENA_CONFIG_PATH";
/// Environment variable that overrides the generation backend URL.
const OLLAMA_URL_ENV: &str = "OLLAMA_BASE_URL";

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const PREFERRED_MODELS: [&str; 4] = ["llama3.2:3b", "phi3:mini", "llama3.1", "mistral"];
const MAX_FAN_OUT: usize = 4;
const MAX_ROUNDS_LIMIT: u32 = 50;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub voting: VotingConfig,
    pub sessions: SessionsConfig,
    /// Per-mode default `max_rounds` overrides.
    pub max_rounds: IndexMap<GameMode, u32>,
}

/// Sampling parameters forwarded to the generation backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Text generation backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Models tried in order against the backend catalogue.
    pub preferred_models: Vec<String>,
    /// Used when none of the preferred models is installed.
    pub default_model: String,
    /// Options for persona chat.
    pub chat: SamplingOptions,
    /// Options for game content (attacks, lyrics, spirals).
    pub creative: SamplingOptions,
    /// Deadline of a single backend call.
    pub timeout: Duration,
    /// Concurrent calls issued while generating one round.
    pub fan_out: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingConfig {
    /// Ballots needed before a round closes.
    pub close_threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionsConfig {
    /// Upper bound for one locked read-modify-write cycle.
    pub operation_timeout: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded arena config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(url) = env::var(OLLAMA_URL_ENV).ok().filter(|url| !url.is_empty()) {
            config.generation.base_url = url;
        }

        config
    }

    /// Parse a JSON document, filling gaps with defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Default `max_rounds` for `mode`, honouring overrides.
    pub fn default_max_rounds(&self, mode: GameMode) -> u32 {
        self.max_rounds
            .get(&mode)
            .copied()
            .unwrap_or(mode.profile().default_max_rounds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    generation: RawGeneration,
    voting: RawVoting,
    sessions: RawSessions,
    modes: IndexMap<GameMode, RawModeOverride>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGeneration {
    base_url: Option<String>,
    preferred_models: Option<Vec<String>>,
    default_model: Option<String>,
    chat: RawSampling,
    creative: RawSampling,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    timeout_ms: Option<Duration>,
    fan_out: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSampling {
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVoting {
    close_threshold: Option<u32>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSessions {
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    operation_timeout_ms: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawModeOverride {
    max_rounds: Option<u32>,
}

impl RawSampling {
    fn resolve(self, defaults: SamplingOptions) -> SamplingOptions {
        SamplingOptions {
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let generation = value.generation;
        let preferred_models = generation
            .preferred_models
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| PREFERRED_MODELS.iter().map(|m| (*m).to_owned()).collect());
        let default_model = generation
            .default_model
            .unwrap_or_else(|| PREFERRED_MODELS[0].to_owned());

        Self {
            generation: GenerationConfig {
                base_url: generation
                    .base_url
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_owned()),
                preferred_models,
                default_model,
                chat: generation.chat.resolve(SamplingOptions {
                    temperature: 0.7,
                    top_p: 0.9,
                    max_tokens: 500,
                }),
                creative: generation.creative.resolve(SamplingOptions {
                    temperature: 0.9,
                    top_p: 0.95,
                    max_tokens: 300,
                }),
                timeout: generation.timeout_ms.unwrap_or(Duration::from_secs(20)),
                fan_out: generation.fan_out.unwrap_or(MAX_FAN_OUT).clamp(1, MAX_FAN_OUT),
            },
            voting: VotingConfig {
                close_threshold: value.voting.close_threshold.unwrap_or(3).max(1),
            },
            sessions: SessionsConfig {
                operation_timeout: value
                    .sessions
                    .operation_timeout_ms
                    .unwrap_or(Duration::from_secs(60)),
            },
            max_rounds: value
                .modes
                .into_iter()
                .filter_map(|(mode, raw)| {
                    raw.max_rounds
                        .map(|rounds| (mode, rounds.clamp(1, MAX_ROUNDS_LIMIT)))
                })
                .collect(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.generation.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.generation.preferred_models[0], "llama3.2:3b");
        assert_eq!(config.generation.chat.max_tokens, 500);
        assert_eq!(config.generation.creative.temperature, 0.9);
        assert_eq!(config.generation.fan_out, 4);
        assert_eq!(config.voting.close_threshold, 3);
        assert_eq!(config.sessions.operation_timeout, Duration::from_secs(60));
        assert_eq!(config.default_max_rounds(GameMode::Tsunami), 12);
    }

    #[test]
    fn partial_documents_keep_remaining_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "generation": { "timeout_ms": 1500, "fan_out": 9, "chat": { "temperature": 0.2 } },
                "voting": { "close_threshold": 0 },
                "modes": { "gladiator": { "max_rounds": 7 }, "karaoke": { "max_rounds": 500 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.generation.timeout, Duration::from_millis(1500));
        assert_eq!(config.generation.fan_out, 4);
        assert_eq!(config.generation.chat.temperature, 0.2);
        assert_eq!(config.generation.chat.top_p, 0.9);
        assert_eq!(config.voting.close_threshold, 1);
        assert_eq!(config.default_max_rounds(GameMode::Gladiator), 7);
        assert_eq!(config.default_max_rounds(GameMode::Karaoke), 50);
        assert_eq!(config.default_max_rounds(GameMode::UfoConspiracy), 12);
    }

    #[test]
    fn unknown_modes_are_rejected() {
        assert!(AppConfig::from_json(r#"{ "modes": { "bingo": {} } }"#).is_err());
    }
}
