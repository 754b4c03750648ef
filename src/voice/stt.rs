//! Speech-to-text (STT) processing

use async_trait::async_trait;

use super::capture::{Utterance, samples_to_wav};
use crate::config::{ApiKeys, SttProvider, VoiceConfig};
use crate::{Error, Result};

/// Outcome of transcribing one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized text
    Text(String),
    /// Audio was received but nothing intelligible was recognized
    NoSpeech,
    /// The recognition service could not be reached
    Unreachable,
}

/// Converts captured audio into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one utterance
    async fn transcribe(&self, utterance: &Utterance) -> Transcript;
}

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// Failure modes of a transcription request
enum SttFailure {
    /// Connection, auth or server failure
    Unreachable(Error),
    /// Service answered but the response was unusable
    Unintelligible(Error),
}

/// Transcribes speech through a hosted API
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider: SttProvider::Whisper,
        })
    }

    /// Create a new STT instance using Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_deepgram(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider: SttProvider::Deepgram,
        })
    }

    /// Create the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is not set
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        match voice.stt_provider {
            SttProvider::Whisper => Self::new_whisper(
                keys.openai.clone().unwrap_or_default(),
                voice.stt_model.clone(),
            ),
            SttProvider::Deepgram => Self::new_deepgram(
                keys.deepgram.clone().unwrap_or_default(),
                voice.stt_model.clone(),
            ),
        }
    }

    async fn request(&self, audio: Vec<u8>) -> std::result::Result<String, SttFailure> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await,
        }
    }

    /// Transcribe using OpenAI Whisper
    async fn transcribe_whisper(&self, audio: Vec<u8>) -> std::result::Result<String, SttFailure> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttFailure::Unintelligible(e.into()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SttFailure::Unreachable(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttFailure::Unreachable(Error::Stt(format!(
                "Whisper API error {status}: {body}"
            ))));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| SttFailure::Unintelligible(e.into()))?;
        Ok(result.text)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: Vec<u8>) -> std::result::Result<String, SttFailure> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let url = format!("https://api.deepgram.com/v1/listen?model={}", self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio)
            .send()
            .await
            .map_err(|e| SttFailure::Unreachable(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttFailure::Unreachable(Error::Stt(format!(
                "Deepgram API error {status}: {body}"
            ))));
        }

        let result: DeepgramResponse = response
            .json()
            .await
            .map_err(|e| SttFailure::Unintelligible(e.into()))?;

        Ok(result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, utterance: &Utterance) -> Transcript {
        let audio = match samples_to_wav(&utterance.samples, utterance.sample_rate) {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode utterance");
                return Transcript::NoSpeech;
            }
        };

        match self.request(audio).await {
            Ok(text) if text.trim().is_empty() => Transcript::NoSpeech,
            Ok(text) => {
                tracing::debug!(transcript = %text, "transcription complete");
                Transcript::Text(text)
            }
            Err(SttFailure::Unreachable(e)) => {
                tracing::error!(error = %e, "speech recognition unreachable");
                Transcript::Unreachable
            }
            Err(SttFailure::Unintelligible(e)) => {
                tracing::warn!(error = %e, "speech recognition returned no usable text");
                Transcript::NoSpeech
            }
        }
    }
}
