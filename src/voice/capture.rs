//! Audio capture from microphone

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use super::segment::{self, SegmentState, SpeechSegmenter};
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// How often the capture buffer is drained into the segmenter
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One captured utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Mono f32 samples
    pub samples: Vec<f32>,
    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl Utterance {
    /// Wrap mono samples captured at [`SAMPLE_RATE`]
    #[must_use]
    pub const fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: SAMPLE_RATE,
        }
    }
}

/// Result of a single listen window
#[derive(Debug, Clone, PartialEq)]
pub enum ListenOutcome {
    /// Speech was heard
    Speech(Utterance),
    /// Nothing was said before the timeout
    NoSpeech,
}

/// A source of spoken utterances
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Wait up to `timeout` for speech to start, then record at most `phrase_limit`
    ///
    /// # Errors
    ///
    /// Returns error if the input device fails
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Result<ListenOutcome>;

    /// Measure ambient noise so speech detection ignores it
    ///
    /// # Errors
    ///
    /// Returns error if the input device fails
    async fn calibrate(&self, _duration: Duration) -> Result<()> {
        Ok(())
    }
}

/// Captures audio from the default input device
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::trace!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "audio capture initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        self.stream.take();
    }

    /// Get captured audio buffer and clear it
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// Default input device with energy-based end-of-speech detection
#[derive(Debug)]
pub struct CpalMicrophone {
    threshold: AtomicU32,
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self {
            threshold: AtomicU32::new(segment::ENERGY_THRESHOLD.to_bits()),
        }
    }
}

impl CpalMicrophone {
    /// Create a microphone using the default speech threshold
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current speech energy threshold
    #[must_use]
    pub fn threshold(&self) -> f32 {
        f32::from_bits(self.threshold.load(Ordering::Relaxed))
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Result<ListenOutcome> {
        let threshold = self.threshold();
        tokio::task::spawn_blocking(move || record_utterance(threshold, timeout, phrase_limit))
            .await
            .map_err(|e| Error::Audio(format!("capture task failed: {e}")))?
    }

    async fn calibrate(&self, duration: Duration) -> Result<()> {
        let ambient = tokio::task::spawn_blocking(move || measure_ambient(duration))
            .await
            .map_err(|e| Error::Audio(format!("calibration task failed: {e}")))??;

        let threshold = segment::calibrated_threshold(ambient);
        self.threshold.store(threshold.to_bits(), Ordering::Relaxed);
        tracing::info!(ambient, threshold, "microphone calibrated");
        Ok(())
    }
}

/// Record one utterance, blocking the calling thread
fn record_utterance(
    threshold: f32,
    timeout: Duration,
    phrase_limit: Duration,
) -> Result<ListenOutcome> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let mut segmenter = SpeechSegmenter::new(threshold);
    let phrase_samples = segment::samples_for(phrase_limit.as_secs_f32());
    let started = Instant::now();

    let outcome = loop {
        std::thread::sleep(POLL_INTERVAL);
        let state = segmenter.push(&capture.take_buffer());

        match state {
            SegmentState::Complete => break ListenOutcome::Speech(Utterance::new(segmenter.take())),
            SegmentState::Speaking if segmenter.buffered_samples() >= phrase_samples => {
                tracing::debug!("phrase limit reached");
                break ListenOutcome::Speech(Utterance::new(segmenter.take()));
            }
            SegmentState::Waiting if started.elapsed() >= timeout => break ListenOutcome::NoSpeech,
            _ => {}
        }
    };

    capture.stop();
    Ok(outcome)
}

/// Measure RMS energy of ambient noise, blocking the calling thread
fn measure_ambient(duration: Duration) -> Result<f32> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;
    std::thread::sleep(duration);
    let samples = capture.take_buffer();
    capture.stop();
    Ok(segment::calculate_energy(&samples))
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
