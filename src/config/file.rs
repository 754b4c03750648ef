//! TOML configuration file loading
//!
//! Supports `~/.config/voice-router/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RouterConfigFile {
    /// Path to the command catalogue
    pub catalogue: Option<String>,

    /// Directory for persisted state and the speech cache
    pub data_dir: Option<String>,

    /// Push-to-talk key name (e.g. "F9")
    pub ptt_key: Option<String>,

    /// Microphone listen windows
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// Fixed delays
    #[serde(default)]
    pub pacing: PacingFileConfig,

    /// Speech engines
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Weather lookup
    #[serde(default)]
    pub weather: WeatherFileConfig,

    /// External launcher commands
    #[serde(default)]
    pub launcher: LauncherFileConfig,

    /// File search roots and move destinations
    #[serde(default)]
    pub files: FilesFileConfig,
}

/// Listen window configuration, in seconds
#[derive(Debug, Default, Deserialize)]
pub struct ListenFileConfig {
    pub timeout_secs: Option<f64>,
    pub phrase_limit_secs: Option<f64>,
    pub confirm_timeout_secs: Option<f64>,
    pub confirm_phrase_limit_secs: Option<f64>,
}

/// Pacing configuration, in seconds
#[derive(Debug, Default, Deserialize)]
pub struct PacingFileConfig {
    pub macro_step_delay_secs: Option<f64>,
    pub shutdown_delay_secs: Option<f64>,
}

/// Speech engine configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Path to the piper executable
    pub piper_path: Option<String>,

    /// Path to the piper voice model
    pub voice_model: Option<String>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub openweather: Option<String>,
}

/// Weather configuration
#[derive(Debug, Default, Deserialize)]
pub struct WeatherFileConfig {
    pub city: Option<String>,
}

/// Launcher command lines (program followed by arguments)
#[derive(Debug, Default, Deserialize)]
pub struct LauncherFileConfig {
    pub opener: Option<Vec<String>>,
    pub app_close: Option<Vec<String>>,
    pub clipboard: Option<Vec<String>>,
}

/// File handler configuration
#[derive(Debug, Default, Deserialize)]
pub struct FilesFileConfig {
    pub search_roots: Option<Vec<String>>,
    pub destinations: Option<BTreeMap<String, String>>,
}

/// Load the TOML config file from an explicit path or the standard path
///
/// Returns `RouterConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(explicit: Option<&Path>) -> RouterConfigFile {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(config_file_path) else {
        return RouterConfigFile::default();
    };

    if !path.exists() {
        return RouterConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                RouterConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            RouterConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-router/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Return the config directory: `~/.config/voice-router`
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-router"))
}
