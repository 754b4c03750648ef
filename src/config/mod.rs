//! Configuration management for the voice router
//!
//! Settings are layered: environment variables override the TOML file, which
//! overrides built-in defaults. Command-line paths override everything.

pub mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Voice router configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the command catalogue
    pub catalogue_path: PathBuf,

    /// Directory holding persisted state and the speech cache
    pub data_dir: PathBuf,

    /// Push-to-talk key name
    pub ptt_key: String,

    /// Microphone listen windows
    pub listen: ListenConfig,

    /// Fixed delays between steps
    pub pacing: PacingConfig,

    /// Speech engines
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// City used for weather lookups
    pub weather_city: Option<String>,

    /// External launcher commands
    pub launcher: LauncherConfig,

    /// File search roots and move destinations
    pub files: FilesConfig,
}

/// Listen windows for normal commands and confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    /// Maximum wait for speech to start
    pub timeout: Duration,

    /// Maximum length of a single utterance
    pub phrase_limit: Duration,

    /// Maximum wait for a confirmation to start
    pub confirm_timeout: Duration,

    /// Maximum length of a confirmation
    pub confirm_phrase_limit: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(8),
            confirm_timeout: Duration::from_secs(4),
            confirm_phrase_limit: Duration::from_secs(3),
        }
    }
}

/// Fixed delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Pause after each executed macro step
    pub macro_step_delay: Duration,

    /// Pause after the farewell before exiting
    pub shutdown_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            macro_step_delay: Duration::from_secs(1),
            shutdown_delay: Duration::from_secs(2),
        }
    }
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper transcription API
    #[default]
    Whisper,
    /// Deepgram listen API
    Deepgram,
}

impl SttProvider {
    /// Parse a provider name
    ///
    /// # Errors
    ///
    /// Returns error for an unknown provider name
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Speech engine configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Path to the piper executable
    pub piper_path: PathBuf,

    /// Path to the piper voice model
    pub voice_model: PathBuf,

    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model identifier
    pub stt_model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            piper_path: PathBuf::from("piper"),
            voice_model: PathBuf::from("en_US-lessac-medium.onnx"),
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper)
    pub openai: Option<String>,

    /// `Deepgram` API key
    pub deepgram: Option<String>,

    /// `OpenWeather` API key
    pub openweather: Option<String>,
}

/// External commands used to launch, close and read things
///
/// Each is a program followed by fixed arguments; the target is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Opens a URL or file with the desktop default handler
    pub opener: Vec<String>,

    /// Terminates an application by name
    pub app_close: Vec<String>,

    /// Prints the clipboard contents to stdout
    pub clipboard: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let argv = |parts: &[&str]| parts.iter().map(ToString::to_string).collect();

        if cfg!(target_os = "macos") {
            Self {
                opener: argv(&["open"]),
                app_close: argv(&["pkill", "-f"]),
                clipboard: argv(&["pbpaste"]),
            }
        } else if cfg!(target_os = "windows") {
            Self {
                opener: argv(&["explorer"]),
                app_close: argv(&["taskkill", "/F", "/IM"]),
                clipboard: argv(&["powershell", "-NoProfile", "-Command", "Get-Clipboard"]),
            }
        } else {
            Self {
                opener: argv(&["xdg-open"]),
                app_close: argv(&["pkill", "-f"]),
                clipboard: argv(&["xclip", "-selection", "clipboard", "-o"]),
            }
        }
    }
}

/// File search and move configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesConfig {
    /// Directories searched recursively by `file.search`
    pub search_roots: Vec<PathBuf>,

    /// Named destinations for `file.move`, keyed by lowercase spoken name
    pub destinations: BTreeMap<String, PathBuf>,
}

impl FilesConfig {
    /// Documents, desktop and downloads of the current user
    fn user_defaults() -> Self {
        let Some(dirs) = directories::UserDirs::new() else {
            return Self::default();
        };

        let named = [
            ("documents", dirs.document_dir()),
            ("desktop", dirs.desktop_dir()),
            ("downloads", dirs.download_dir()),
        ];

        let mut files = Self::default();
        for (name, dir) in named {
            if let Some(dir) = dir {
                files.search_roots.push(dir.to_path_buf());
                files.destinations.insert(name.to_string(), dir.to_path_buf());
            }
        }
        files
    }
}

/// Paths supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file
    pub config_file: Option<PathBuf>,

    /// Explicit catalogue file
    pub catalogue: Option<PathBuf>,

    /// Explicit data directory
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Built-in defaults rooted at `data_dir`
    ///
    /// The catalogue defaults to `catalogue.json` inside the data directory.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            catalogue_path: data_dir.join("catalogue.json"),
            data_dir,
            ptt_key: "F9".to_string(),
            listen: ListenConfig::default(),
            pacing: PacingConfig::default(),
            voice: VoiceConfig::default(),
            api_keys: ApiKeys::default(),
            weather_city: None,
            launcher: LauncherConfig::default(),
            files: FilesConfig::default(),
        }
    }

    /// Load configuration from the environment, the TOML file and defaults
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created or a setting is invalid
    pub fn load(options: &LoadOptions) -> Result<Self> {
        let fc = file::load_config_file(options.config_file.as_deref());

        // Data directory (~/.local/share/voice-router on Linux)
        let data_dir = options
            .data_dir
            .clone()
            .or_else(|| std::env::var("VOICE_ROUTER_DATA_DIR").ok().map(PathBuf::from))
            .or_else(|| fc.data_dir.as_deref().map(expand_home))
            .unwrap_or_else(|| {
                directories::BaseDirs::new().map_or_else(
                    || PathBuf::from(".voice-router"),
                    |d| d.data_dir().join("voice-router"),
                )
            });
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            Error::Config(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        let mut config = Self::with_data_dir(&data_dir);

        // Catalogue (cli > env > toml > config dir)
        config.catalogue_path = options
            .catalogue
            .clone()
            .or_else(|| std::env::var("VOICE_ROUTER_CATALOGUE").ok().map(PathBuf::from))
            .or_else(|| fc.catalogue.as_deref().map(expand_home))
            .or_else(|| file::config_dir().map(|d| d.join("catalogue.json")))
            .unwrap_or(config.catalogue_path);

        if let Some(key) = std::env::var("VOICE_ROUTER_PTT_KEY").ok().or(fc.ptt_key) {
            config.ptt_key = key;
        }

        let listen = fc.listen;
        let defaults = config.listen;
        config.listen = ListenConfig {
            timeout: seconds(listen.timeout_secs, "listen.timeout_secs")?
                .unwrap_or(defaults.timeout),
            phrase_limit: seconds(listen.phrase_limit_secs, "listen.phrase_limit_secs")?
                .unwrap_or(defaults.phrase_limit),
            confirm_timeout: seconds(listen.confirm_timeout_secs, "listen.confirm_timeout_secs")?
                .unwrap_or(defaults.confirm_timeout),
            confirm_phrase_limit: seconds(
                listen.confirm_phrase_limit_secs,
                "listen.confirm_phrase_limit_secs",
            )?
            .unwrap_or(defaults.confirm_phrase_limit),
        };

        let pacing = fc.pacing;
        config.pacing = PacingConfig {
            macro_step_delay: seconds(pacing.macro_step_delay_secs, "pacing.macro_step_delay_secs")?
                .unwrap_or(config.pacing.macro_step_delay),
            shutdown_delay: seconds(pacing.shutdown_delay_secs, "pacing.shutdown_delay_secs")?
                .unwrap_or(config.pacing.shutdown_delay),
        };

        // Speech engines (env > toml > default)
        let voice = fc.voice;
        if let Some(path) = std::env::var("VOICE_ROUTER_PIPER").ok().or(voice.piper_path) {
            config.voice.piper_path = expand_home(&path);
        }
        if let Some(model) = std::env::var("VOICE_ROUTER_VOICE_MODEL")
            .ok()
            .or(voice.voice_model)
        {
            config.voice.voice_model = expand_home(&model);
        }
        if let Some(provider) = std::env::var("VOICE_ROUTER_STT_PROVIDER")
            .ok()
            .or(voice.stt_provider)
        {
            config.voice.stt_provider = SttProvider::parse(&provider)?;
        }
        if let Some(model) = std::env::var("VOICE_ROUTER_STT_MODEL").ok().or(voice.stt_model) {
            config.voice.stt_model = model;
        }

        config.api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            deepgram: std::env::var("DEEPGRAM_API_KEY").ok().or(fc.api_keys.deepgram),
            openweather: std::env::var("OPENWEATHER_API_KEY")
                .ok()
                .or(fc.api_keys.openweather),
        };
        config.weather_city = std::env::var("WEATHER_CITY").ok().or(fc.weather.city);

        let launcher = fc.launcher;
        config.launcher = LauncherConfig {
            opener: non_empty(launcher.opener, "launcher.opener")?
                .unwrap_or(config.launcher.opener),
            app_close: non_empty(launcher.app_close, "launcher.app_close")?
                .unwrap_or(config.launcher.app_close),
            clipboard: non_empty(launcher.clipboard, "launcher.clipboard")?
                .unwrap_or(config.launcher.clipboard),
        };

        let defaults = FilesConfig::user_defaults();
        config.files = FilesConfig {
            search_roots: fc.files.search_roots.map_or(defaults.search_roots, |roots| {
                roots.iter().map(|r| expand_home(r)).collect()
            }),
            destinations: fc.files.destinations.map_or(defaults.destinations, |dests| {
                dests
                    .into_iter()
                    .map(|(name, path)| (name.trim().to_lowercase(), expand_home(&path)))
                    .collect()
            }),
        };

        Ok(config)
    }

    /// Persisted key/value memory
    #[must_use]
    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join("memory.json")
    }

    /// Persisted watchdog hashes
    #[must_use]
    pub fn watchdog_path(&self) -> PathBuf {
        self.data_dir.join("watchdog.json")
    }

    /// Append-only clipboard archive
    #[must_use]
    pub fn clipboard_log_path(&self) -> PathBuf {
        self.data_dir.join("clipboard_log.txt")
    }

    /// Synthesized phrase cache
    #[must_use]
    pub fn tts_cache_dir(&self) -> PathBuf {
        self.data_dir.join("tts_cache")
    }
}

/// Convert an optional number of seconds into a duration
fn seconds(value: Option<f64>, field: &str) -> Result<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_err(|e| Error::Config(format!("{field}: invalid duration {secs}: {e}")))
        })
        .transpose()
}

/// Reject an explicitly empty command line
fn non_empty(argv: Option<Vec<String>>, field: &str) -> Result<Option<Vec<String>>> {
    match argv {
        Some(argv) if argv.is_empty() => {
            Err(Error::Config(format!("{field} must name a program")))
        }
        other => Ok(other),
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(rest);
    }
    Path::new(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_paths_live_in_data_dir() {
        let config = Config::with_data_dir("/tmp/vr");
        assert_eq!(config.memory_path(), PathBuf::from("/tmp/vr/memory.json"));
        assert_eq!(config.watchdog_path(), PathBuf::from("/tmp/vr/watchdog.json"));
        assert_eq!(
            config.clipboard_log_path(),
            PathBuf::from("/tmp/vr/clipboard_log.txt")
        );
        assert_eq!(config.tts_cache_dir(), PathBuf::from("/tmp/vr/tts_cache"));
    }

    #[test]
    fn test_default_listen_windows() {
        let listen = ListenConfig::default();
        assert_eq!(listen.timeout, Duration::from_secs(5));
        assert_eq!(listen.phrase_limit, Duration::from_secs(8));
        assert_eq!(listen.confirm_timeout, Duration::from_secs(4));
        assert_eq!(listen.confirm_phrase_limit, Duration::from_secs(3));
    }

    #[test]
    fn test_stt_provider_parse() {
        assert_eq!(SttProvider::parse("Whisper").unwrap(), SttProvider::Whisper);
        assert_eq!(SttProvider::parse("deepgram").unwrap(), SttProvider::Deepgram);
        assert!(SttProvider::parse("sphinx").is_err());
    }

    #[test]
    fn test_seconds_rejects_negative() {
        assert!(seconds(Some(-1.0), "x").is_err());
        assert_eq!(seconds(Some(1.5), "x").unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(seconds(None, "x").unwrap(), None);
    }

    #[test]
    fn test_empty_launcher_rejected() {
        assert!(non_empty(Some(Vec::new()), "launcher.opener").is_err());
        assert!(non_empty(None, "launcher.opener").unwrap().is_none());
    }

    #[test]
    fn test_load_with_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "[pacing]\nmacro_step_delay_secs = 0.25\n\n[weather]\ncity = \"Lisbon\"\n",
        )
        .unwrap();

        let options = LoadOptions {
            config_file: Some(config_file),
            catalogue: Some(dir.path().join("commands.json")),
            data_dir: Some(dir.path().join("state")),
        };
        let config = Config::load(&options).unwrap();

        assert_eq!(config.catalogue_path, dir.path().join("commands.json"));
        assert_eq!(config.data_dir, dir.path().join("state"));
        assert!(config.data_dir.is_dir());
        assert_eq!(config.pacing.macro_step_delay, Duration::from_millis(250));
        assert_eq!(config.pacing.shutdown_delay, Duration::from_secs(2));
    }
}
