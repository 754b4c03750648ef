//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use voice_router::voice::segment::{ENERGY_THRESHOLD, calibrated_threshold, calculate_energy};
use voice_router::voice::{SAMPLE_RATE, SegmentState, SpeechSegmenter, read_wav, samples_to_wav};

mod common;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

#[test]
fn test_segmenter_starts_waiting() {
    let segmenter = SpeechSegmenter::new(ENERGY_THRESHOLD);

    assert_eq!(segmenter.state(), SegmentState::Waiting);
    assert_eq!(segmenter.buffered_samples(), 0);
}

#[test]
fn test_silence_never_starts_speech() {
    let mut segmenter = SpeechSegmenter::new(ENERGY_THRESHOLD);

    for _ in 0..20 {
        assert_eq!(segmenter.push(&generate_silence(0.1)), SegmentState::Waiting);
    }
    assert_eq!(segmenter.buffered_samples(), 0);
}

#[test]
fn test_speech_then_pause_completes() {
    let mut segmenter = SpeechSegmenter::new(ENERGY_THRESHOLD);

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    assert_eq!(segmenter.push(&speech), SegmentState::Speaking);

    // A short gap keeps the utterance open
    assert_eq!(segmenter.push(&generate_silence(0.3)), SegmentState::Speaking);
    assert_eq!(segmenter.push(&speech), SegmentState::Speaking);

    assert_eq!(segmenter.push(&generate_silence(0.8)), SegmentState::Complete);
}

#[test]
fn test_short_blip_is_discarded() {
    let mut segmenter = SpeechSegmenter::new(ENERGY_THRESHOLD);

    segmenter.push(&generate_sine_samples(440.0, 0.1, 0.3));
    let state = segmenter.push(&generate_silence(0.8));

    assert_eq!(state, SegmentState::Waiting);
    assert_eq!(segmenter.buffered_samples(), 0);
}

#[test]
fn test_take_returns_utterance_and_resets() {
    let mut segmenter = SpeechSegmenter::new(ENERGY_THRESHOLD);
    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    let pause = generate_silence(0.8);

    segmenter.push(&speech);
    segmenter.push(&pause);
    let utterance = segmenter.take();

    assert_eq!(utterance.len(), speech.len() + pause.len());
    assert_eq!(segmenter.state(), SegmentState::Waiting);
    assert_eq!(segmenter.buffered_samples(), 0);
}

#[test]
fn test_raised_threshold_ignores_quiet_speech() {
    let ambient = calculate_energy(&generate_sine_samples(60.0, 1.0, 0.2));
    let threshold = calibrated_threshold(ambient);
    assert!(threshold > ENERGY_THRESHOLD);

    let mut segmenter = SpeechSegmenter::new(threshold);
    assert_eq!(
        segmenter.push(&generate_sine_samples(440.0, 0.5, 0.2)),
        SegmentState::Waiting
    );
    assert_eq!(
        segmenter.push(&generate_sine_samples(440.0, 0.5, 0.6)),
        SegmentState::Speaking
    );
}

#[test]
fn test_calibration_never_drops_below_floor() {
    assert!((calibrated_threshold(0.0) - ENERGY_THRESHOLD).abs() < f32::EPSILON);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // WAV header is 44 bytes
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let cursor = Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
}

#[test]
fn test_read_wav_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("utterance.wav");
    let samples = generate_sine_samples(440.0, 0.25, 0.5);
    std::fs::write(&path, samples_to_wav(&samples, SAMPLE_RATE).unwrap()).unwrap();

    let (decoded, rate) = read_wav(&path).unwrap();

    assert_eq!(rate, SAMPLE_RATE);
    assert_eq!(decoded.len(), samples.len());
    assert!((decoded[100] - samples[100]).abs() < 0.001);
}
