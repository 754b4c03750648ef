//! Text-to-speech (TTS) processing

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::VoiceConfig;
use crate::{Error, Result};

/// Upper bound on a single synthesis run
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders text to a WAV file
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` into a WAV file at `output`
    ///
    /// # Errors
    ///
    /// Returns error if the engine fails or produces no audio
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;
}

/// Local neural TTS via the `piper` executable
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    program: PathBuf,
    model: PathBuf,
}

impl PiperSynthesizer {
    /// Create a synthesizer for a piper binary and voice model
    #[must_use]
    pub const fn new(program: PathBuf, model: PathBuf) -> Self {
        Self { program, model }
    }

    /// Create the synthesizer described by the voice configuration
    #[must_use]
    pub fn from_config(voice: &VoiceConfig) -> Self {
        Self::new(voice.piper_path.clone(), voice.voice_model.clone())
    }
}

#[async_trait]
impl Synthesizer for PiperSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        tracing::debug!(chars = text.len(), output = %output.display(), "synthesizing");

        let mut child = Command::new(&self.program)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Tts(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Error::Tts(format!("failed to write to piper stdin: {e}")))?;
        }

        let output_status = timeout(SYNTHESIS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::Tts(format!("piper timed out after {SYNTHESIS_TIMEOUT:?}")))?
            .map_err(|e| Error::Tts(format!("piper execution failed: {e}")))?;

        if !output_status.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            tracing::trace!(stderr = %stderr, "piper stderr");
        }

        if !output_status.status.success() {
            let code = output_status.status.code().unwrap_or(-1);
            return Err(Error::Tts(format!("piper exited with code {code}")));
        }

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(Error::Tts("piper produced no audio".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let piper = PiperSynthesizer::new(
            dir.path().join("no-such-piper"),
            dir.path().join("voice.onnx"),
        );

        let err = piper
            .synthesize("hello", &dir.path().join("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tts(_)));
    }
}
