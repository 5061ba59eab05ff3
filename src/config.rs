//! Application-level configuration loading, including the phase timings.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::engine::PhaseTimings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BOARD_BACK_CONFIG_PATH";
/// Default directory holding board JSON files.
const DEFAULT_BOARDS_DIR: &str = "boards";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Durations of the timed game phases.
    pub timings: PhaseTimings,
    /// Directory holding board JSON files.
    pub boards_dir: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        boards_dir = %config.boards_dir.display(),
                        "loaded configuration"
                    );
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
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timings: PhaseTimings::default(),
            boards_dir: PathBuf::from(DEFAULT_BOARDS_DIR),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    timings: RawTimings,
    boards_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the timed-phase durations; absent fields keep defaults.
struct RawTimings {
    reveal_delay_ms: Option<u64>,
    buzz_window_ms: Option<u64>,
    answer_window_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = PhaseTimings::default();
        Self {
            timings: PhaseTimings {
                reveal_delay_ms: value.timings.reveal_delay_ms.unwrap_or(defaults.reveal_delay_ms),
                buzz_window_ms: value.timings.buzz_window_ms.unwrap_or(defaults.buzz_window_ms),
                answer_window_ms: value
                    .timings
                    .answer_window_ms
                    .unwrap_or(defaults.answer_window_ms),
            },
            boards_dir: value
                .boards_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARDS_DIR)),
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
