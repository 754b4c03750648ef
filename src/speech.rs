//! Content-addressed speech cache
//!
//! Phrases drawn from dialogue pools are synthesized once and replayed from
//! `<cache>/<key>.wav` on every later use. Anything else is synthesized into a
//! temporary file that is removed after playback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::catalogue::Catalogue;
use crate::voice::{AudioSink, Synthesizer};
use crate::Result;

/// Maximum length of a cache key stem
pub const CACHE_KEY_MAX: usize = 75;

/// Derive the cache file name for a phrase
///
/// Non-ASCII characters are dropped, then everything except ASCII letters,
/// digits, spaces, `_` and `-`. The result is trimmed, cut to
/// [`CACHE_KEY_MAX`] characters and given a `.wav` suffix. Distinct phrases
/// may share a key; the first synthesized audio wins.
#[must_use]
pub fn cache_key(phrase: &str) -> String {
    let kept: String = phrase
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let stem: String = kept.trim().chars().take(CACHE_KEY_MAX).collect();
    format!("{stem}.wav")
}

/// Something to say
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrase {
    /// A dialogue pool alternative, eligible for caching
    Pooled(String),
    /// Literal text, synthesized fresh every time
    AdHoc(String),
}

impl Phrase {
    /// Interpret `key_or_text` as a pool key if the catalogue has one, else as literal text
    ///
    /// Returns `None` for a pool with no alternatives.
    #[must_use]
    pub fn resolve(catalogue: &Catalogue, key_or_text: &str) -> Option<Self> {
        match catalogue.pool(key_or_text) {
            Some(alternatives) => alternatives
                .choose(&mut rand::thread_rng())
                .map(|text| Self::Pooled(text.clone())),
            None => Some(Self::AdHoc(key_or_text.to_string())),
        }
    }

    /// The words to be spoken
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Pooled(text) | Self::AdHoc(text) => text,
        }
    }
}

/// Whether a pooled phrase was already on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Played from the cache
    Hit,
    /// Synthesized and stored
    Miss,
    /// Not cached (ad-hoc text)
    Uncached,
}

impl CacheStatus {
    /// Short label for logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hit => "cached",
            Self::Miss => "caching",
            Self::Uncached => "generating",
        }
    }
}

/// Synthesizes and plays phrases, caching pooled ones
pub struct SpeechCache {
    dir: PathBuf,
    synthesizer: Arc<dyn Synthesizer>,
    sink: Arc<dyn AudioSink>,
}

impl SpeechCache {
    /// Create a cache rooted at `dir`, creating it if needed
    pub fn new(dir: PathBuf, synthesizer: Arc<dyn Synthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to create speech cache");
        }
        Self {
            dir,
            synthesizer,
            sink,
        }
    }

    /// Cache directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a pooled phrase is cached under
    #[must_use]
    pub fn cache_path(&self, phrase: &str) -> PathBuf {
        self.dir.join(cache_key(phrase))
    }

    /// Synthesize if needed and play a phrase to completion
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    pub async fn play(&self, phrase: &Phrase) -> Result<CacheStatus> {
        match phrase {
            Phrase::Pooled(text) if cache_key(text) != ".wav" => self.play_cached(text).await,
            other => {
                self.play_ad_hoc(other.text()).await?;
                Ok(CacheStatus::Uncached)
            }
        }
    }

    async fn play_cached(&self, text: &str) -> Result<CacheStatus> {
        let path = self.cache_path(text);

        let status = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::trace!(path = %path.display(), "speech cache hit");
            CacheStatus::Hit
        } else {
            // Render beside the final file so a failed run never leaves a partial entry
            let staging = tempfile::Builder::new()
                .prefix(".pending-")
                .suffix(".wav")
                .tempfile_in(&self.dir)?
                .into_temp_path();
            self.synthesizer.synthesize(text, &staging).await?;
            staging.persist(&path).map_err(|e| e.error)?;
            tracing::debug!(path = %path.display(), "speech cached");
            CacheStatus::Miss
        };

        self.sink.play(&path).await?;
        Ok(status)
    }

    async fn play_ad_hoc(&self, text: &str) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("speech-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();
        self.synthesizer.synthesize(text, &scratch).await?;
        self.sink.play(&scratch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_strips_punctuation() {
        assert_eq!(cache_key("Hello, Pilot!"), "Hello Pilot.wav");
        assert_eq!(cache_key("  Ready_when-you are.  "), "Ready_when-you are.wav");
    }

    #[test]
    fn test_cache_key_drops_non_ascii() {
        assert_eq!(cache_key("Café au lait"), "Caf au lait.wav");
    }

    #[test]
    fn test_cache_key_truncates() {
        let long = "a".repeat(200);
        assert_eq!(cache_key(&long), format!("{}.wav", "a".repeat(CACHE_KEY_MAX)));
    }

    #[test]
    fn test_colliding_phrases_share_a_key() {
        assert_eq!(cache_key("Done."), cache_key("Done!"));
    }

    #[test]
    fn test_phrase_resolution() {
        let catalogue = Catalogue::from_json(
            r#"{"commands": [], "dialogue_pools": {"ack": ["Go ahead."], "empty": []}}"#,
        )
        .unwrap();

        assert_eq!(
            Phrase::resolve(&catalogue, "ack"),
            Some(Phrase::Pooled("Go ahead.".into()))
        );
        assert_eq!(
            Phrase::resolve(&catalogue, "The time is 10:00."),
            Some(Phrase::AdHoc("The time is 10:00.".into()))
        );
        assert_eq!(Phrase::resolve(&catalogue, "empty"), None);
    }
}
