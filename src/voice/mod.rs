//! Voice processing module
//!
//! Handles microphone capture, end-of-speech detection, playback, and the
//! hosted STT and local TTS engines. Each hardware or network boundary is a
//! trait so the turn logic can run against fakes.

mod capture;
mod playback;
pub mod segment;
mod stt;
mod tts;

pub use capture::{
    AudioCapture, CpalMicrophone, ListenOutcome, Microphone, SAMPLE_RATE, Utterance,
    samples_to_wav,
};
pub use playback::{AudioPlayback, AudioSink, SpeakerSink, read_wav};
pub use segment::{SegmentState, SpeechSegmenter};
pub use stt::{SpeechToText, Transcriber, Transcript};
pub use tts::{PiperSynthesizer, Synthesizer};
