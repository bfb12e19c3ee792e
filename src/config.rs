//! Startup configuration: node roster, round timings and the audio cue.

use std::{
    collections::HashSet,
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationSecondsWithFrac, serde_as};
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::state::RoundTimings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "UNISON_BACK_CONFIG_PATH";
const DEFAULT_AUDIO_PATH: &str = "/home/pi/Rick.mp3";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config `{path}`")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON or has unexpected keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The values are inconsistent (e.g. threshold above the roster size).
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Which backend plays the success cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// Spawn `audio_player` on `audio_path`.
    #[default]
    Command,
    /// In-process playback; requires the `rodio-cue` feature.
    Rodio,
    /// No audio; successes only flash.
    None,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    nodes: Vec<String>,
    threshold: usize,
    timings: RoundTimings,
    audio_backend: AudioBackend,
    audio_path: PathBuf,
    audio_player: Vec<String>,
}

impl AppConfig {
    /// Load the configuration from disk, using built-in defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let config = Self::from_json(&contents)?;
                info!(
                    path = %path.display(),
                    nodes = config.nodes.len(),
                    threshold = config.threshold,
                    "loaded config"
                );
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Parse and validate a JSON document. Missing keys take their defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        raw.validate()?;
        Ok(raw.into())
    }

    /// Node identifiers in configured order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Presses required for a successful round.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Window, flash and audio durations.
    pub fn timings(&self) -> RoundTimings {
        self.timings
    }

    /// Selected audio backend.
    pub fn audio_backend(&self) -> AudioBackend {
        self.audio_backend
    }

    /// Success cue file.
    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    /// Player program and arguments for the command backend.
    pub fn audio_player(&self) -> &[String] {
        &self.audio_player
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
#[validate(schema(function = "validate_roster"))]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[validate(length(min = 1, message = "at least one node must be configured"))]
    nodes: Vec<String>,
    #[validate(range(min = 1, message = "threshold must be at least 1"))]
    threshold: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[validate(custom(function = "positive_duration"))]
    window_secs: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[validate(custom(function = "positive_duration"))]
    flash_secs: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[validate(custom(function = "positive_duration"))]
    audio_poll_secs: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[validate(custom(function = "positive_duration"))]
    audio_max_wait_secs: Duration,
    audio_backend: AudioBackend,
    audio_path: PathBuf,
    audio_player: Vec<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        let timings = RoundTimings::default();
        Self {
            nodes: (1..=4).map(|n| format!("pico{n}")).collect(),
            threshold: 4,
            window_secs: timings.window,
            flash_secs: timings.flash,
            audio_poll_secs: timings.audio_poll,
            audio_max_wait_secs: timings.audio_max_wait,
            audio_backend: AudioBackend::default(),
            audio_path: PathBuf::from(DEFAULT_AUDIO_PATH),
            audio_player: vec!["mpg123".into(), "-q".into()],
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            nodes: value.nodes,
            threshold: value.threshold,
            timings: RoundTimings {
                window: value.window_secs,
                flash: value.flash_secs,
                audio_poll: value.audio_poll_secs,
                audio_max_wait: value.audio_max_wait_secs,
            },
            audio_backend: value.audio_backend,
            audio_path: value.audio_path,
            audio_player: value.audio_player,
        }
    }
}

fn validate_roster(raw: &RawConfig) -> Result<(), ValidationError> {
    if raw.threshold > raw.nodes.len() {
        let mut err = ValidationError::new("threshold_exceeds_roster");
        err.message = Some(
            format!(
                "threshold {} exceeds the {} configured nodes",
                raw.threshold,
                raw.nodes.len()
            )
            .into(),
        );
        return Err(err);
    }

    let mut seen = HashSet::new();
    for id in &raw.nodes {
        if id.trim().is_empty() {
            let mut err = ValidationError::new("blank_node_id");
            err.message = Some("node identifiers must not be blank".into());
            return Err(err);
        }
        if !seen.insert(id.as_str()) {
            let mut err = ValidationError::new("duplicate_node_id");
            err.message = Some(format!("node `{id}` is listed twice").into());
            return Err(err);
        }
    }

    if raw.audio_backend == AudioBackend::Command && raw.audio_player.is_empty() {
        let mut err = ValidationError::new("audio_player_missing");
        err.message = Some("audio_player must name a program for the command backend".into());
        return Err(err);
    }

    Ok(())
}

fn positive_duration(value: &Duration) -> Result<(), ValidationError> {
    if value.is_zero() {
        let mut err = ValidationError::new("duration_not_positive");
        err.message = Some("durations must be strictly positive".into());
        return Err(err);
    }
    Ok(())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
