//! Shared test utilities
//!
//! Fakes for every hardware and network boundary, plus a harness that
//! assembles an assistant around them in a temporary data directory.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use voice_router::voice::{
    AudioSink, ListenOutcome, Microphone, Synthesizer, Transcriber, Transcript, Utterance,
};
use voice_router::{ActionRegistry, Assistant, Catalogue, Config, Error, Result, Services};

/// Catalogue used by most integration tests
///
/// Every pool has a single entry so spoken output is deterministic.
pub const TEST_CATALOGUE: &str = r#"{
    "commands": [
        {"keywords": ["what time is it", "time"], "type": "general.time"},
        {"keywords": ["remember that"], "type": "utility.remember"},
        {"keywords": ["what is"], "type": "utility.recall"},
        {"keywords": ["delete"], "type": "file.delete"},
        {"keywords": ["run macro", "execute macro"], "type": "macro.run", "ack": "Running."},
        {"keywords": ["shut down", "go to sleep"], "type": "script.shutdown"},
        {"keywords": ["tell me a joke"], "type": "general.joke"}
    ],
    "dialogue_pools": {
        "ptt_ack": ["Yes, Pilot?"],
        "error": ["I did not catch that."],
        "confirmation": ["Are you sure?"],
        "startup": ["Online."],
        "shutdown": ["Goodbye, Pilot."],
        "jokes": ["I would tell you a UDP joke, but you might not get it."],
        "empty": []
    },
    "macros": {
        "morning": [
            {"type": "general.time"},
            {"type": "lights.on", "data": "kitchen"},
            {"type": "utility.recall", "data": "the door code"}
        ]
    },
    "confirmation_words": ["yes", "do it"]
}"#;

/// Queue of listen outcomes; returns `NoSpeech` once drained
#[derive(Default)]
pub struct FakeMicrophone {
    outcomes: Mutex<VecDeque<ListenOutcome>>,
    listens: AtomicUsize,
}

impl FakeMicrophone {
    pub fn push_speech(&self) {
        let utterance = Utterance::new(vec![0.1; 8000]);
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ListenOutcome::Speech(utterance));
    }

    pub fn listens(&self) -> usize {
        self.listens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Microphone for FakeMicrophone {
    async fn listen(&self, _timeout: Duration, _phrase_limit: Duration) -> Result<ListenOutcome> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ListenOutcome::NoSpeech))
    }
}

/// Queue of transcripts; returns `NoSpeech` once drained
#[derive(Default)]
pub struct FakeTranscriber {
    transcripts: Mutex<VecDeque<Transcript>>,
}

impl FakeTranscriber {
    pub fn push(&self, transcript: Transcript) {
        self.transcripts.lock().unwrap().push_back(transcript);
    }

    pub fn push_text(&self, text: &str) {
        self.push(Transcript::Text(text.to_string()));
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _utterance: &Utterance) -> Transcript {
        self.transcripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Transcript::NoSpeech)
    }
}

/// Writes the phrase text itself as the "audio" and records every request
#[derive(Default)]
pub struct RecordingSynthesizer {
    requests: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        self.requests.lock().unwrap().push(text.to_string());
        tokio::fs::write(output, text).await?;
        Ok(())
    }
}

/// Synthesizer that always fails
pub struct BrokenSynthesizer;

#[async_trait]
impl Synthesizer for BrokenSynthesizer {
    async fn synthesize(&self, _text: &str, _output: &Path) -> Result<()> {
        Err(Error::Tts("engine offline".to_string()))
    }
}

/// Reads back what the fake synthesizer wrote, in play order
#[derive(Default)]
pub struct RecordingSink {
    played: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn spoken(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, path: &Path) -> Result<()> {
        let text = tokio::fs::read_to_string(path).await?;
        self.played.lock().unwrap().push(text);
        Ok(())
    }
}

/// An assistant wired to fakes, rooted in a temporary directory
pub struct Harness {
    pub dir: TempDir,
    pub assistant: Arc<Assistant>,
    pub microphone: Arc<FakeMicrophone>,
    pub transcriber: Arc<FakeTranscriber>,
    pub synthesizer: Arc<RecordingSynthesizer>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    /// Harness around [`TEST_CATALOGUE`] and the built-in handlers
    pub fn new() -> Self {
        Self::with_registry(TEST_CATALOGUE, ActionRegistry::with_builtins().unwrap())
    }

    /// Harness around a custom catalogue and registry
    pub fn with_registry(catalogue: &str, registry: ActionRegistry) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::in_dir(dir, catalogue, registry)
    }

    /// Build (or rebuild) an assistant over an existing data directory
    pub fn in_dir(dir: TempDir, catalogue: &str, registry: ActionRegistry) -> Self {
        let config = test_config(dir.path());
        Self::build(dir, config, catalogue, registry)
    }

    /// Harness with a caller-adjusted configuration
    pub fn configured(catalogue: &str, adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        adjust(&mut config);
        Self::build(dir, config, catalogue, ActionRegistry::with_builtins().unwrap())
    }

    fn build(dir: TempDir, config: Config, catalogue: &str, registry: ActionRegistry) -> Self {
        let microphone = Arc::new(FakeMicrophone::default());
        let transcriber = Arc::new(FakeTranscriber::default());
        let synthesizer = Arc::new(RecordingSynthesizer::default());
        let sink = Arc::new(RecordingSink::default());

        let services = Services {
            microphone: microphone.clone(),
            transcriber: transcriber.clone(),
            synthesizer: synthesizer.clone(),
            sink: sink.clone(),
        };
        let assistant = Assistant::new(
            config,
            Catalogue::from_json(catalogue).unwrap(),
            registry,
            services,
        )
        .unwrap();

        Self {
            dir,
            assistant,
            microphone,
            transcriber,
            synthesizer,
            sink,
        }
    }

    /// Discard the assistant and build a fresh one over the same directory
    pub fn restart(self) -> Self {
        Self::in_dir(self.dir, TEST_CATALOGUE, ActionRegistry::with_builtins().unwrap())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.sink.spoken()
    }
}

/// Defaults rooted at `dir` with every pause removed and file search
/// confined to `dir/files`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::with_data_dir(dir);
    config.pacing.macro_step_delay = Duration::ZERO;
    config.pacing.shutdown_delay = Duration::ZERO;

    let files = dir.join("files");
    std::fs::create_dir_all(&files).unwrap();
    config.files.search_roots = vec![files.clone()];
    config.files.destinations.insert("archive".to_string(), dir.join("archive"));
    config.launcher.opener = vec!["true".to_string()];
    config
}
