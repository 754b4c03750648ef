//! Error types for the voice router

use thiserror::Error;

/// Result type alias for voice router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice router
///
/// Expected negative outcomes (no speech, no match, declined confirmation)
/// are modelled as ordinary values elsewhere and never reach this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Command catalogue missing or malformed
    #[error("catalogue error: {0}")]
    Catalogue(String),

    /// Configured push-to-talk key is not a known key name
    #[error("invalid push-to-talk key: {0}")]
    InvalidTriggerKey(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Action handler error
    #[error("action error: {0}")]
    Action(String),

    /// Watchdog fetch or extraction error
    #[error("watchdog error: {0}")]
    Watchdog(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
