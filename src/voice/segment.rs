//! Energy-based speech segmentation
//!
//! Splits a live sample stream into a single utterance: wait for energy above
//! the threshold, accumulate, and finish once a pause of silence follows
//! enough speech.

use super::SAMPLE_RATE;

/// Floor for the speech energy threshold
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Calibrated thresholds sit this far above ambient noise
const AMBIENT_MULTIPLIER: f32 = 1.5;

/// Minimum duration of speech to count as an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const PAUSE_SAMPLES: usize = 12000; // 0.75 seconds

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// No speech heard yet
    Waiting,
    /// Speech in progress
    Speaking,
    /// Speech followed by a pause
    Complete,
}

/// Detects the start and end of one utterance
#[derive(Debug)]
pub struct SpeechSegmenter {
    threshold: f32,
    state: SegmentState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter with the given energy threshold
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: SegmentState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples and return the resulting state
    pub fn push(&mut self, samples: &[f32]) -> SegmentState {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmentState::Waiting => {
                if is_speech {
                    self.state = SegmentState::Speaking;
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            SegmentState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > PAUSE_SAMPLES {
                    if self.speech_buffer.len() - self.silence_counter > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        self.state = SegmentState::Complete;
                    } else {
                        tracing::trace!("blip too short, waiting again");
                        self.reset();
                    }
                }
            }
            SegmentState::Complete => {}
        }

        self.state
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmentState {
        self.state
    }

    /// Samples accumulated since speech started
    #[must_use]
    pub fn buffered_samples(&self) -> usize {
        self.speech_buffer.len()
    }

    /// Take the accumulated utterance and return to waiting
    pub fn take(&mut self) -> Vec<f32> {
        let samples = std::mem::take(&mut self.speech_buffer);
        self.reset();
        samples
    }

    /// Return to waiting, discarding buffered audio
    pub fn reset(&mut self) {
        self.state = SegmentState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }
}

/// Threshold for a measured ambient noise level
#[must_use]
pub fn calibrated_threshold(ambient_energy: f32) -> f32 {
    (ambient_energy * AMBIENT_MULTIPLIER).max(ENERGY_THRESHOLD)
}

/// Number of samples in `secs` seconds of audio
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn samples_for(secs: f32) -> usize {
    (secs * SAMPLE_RATE as f32) as usize
}

/// Calculate RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
