//! The voice assistant
//!
//! Owns the catalogue, the handler registry, the turn-taking state, the
//! speech cache and all persisted stores, and runs one push-to-talk turn:
//! acknowledge, listen, transcribe, resolve, dispatch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::actions::{ActionRegistry, Invocation};
use crate::catalogue::{Catalogue, CommandSpec};
use crate::config::Config;
use crate::resolver;
use crate::speech::{Phrase, SpeechCache};
use crate::store::{ClipboardArchive, Context, MemoryStore, WatchdogStore};
use crate::turn::{RecordingGuard, TurnState};
use crate::voice::{
    AudioSink, CpalMicrophone, ListenOutcome, Microphone, PiperSynthesizer, SpeakerSink,
    SpeechToText, Synthesizer, Transcriber, Transcript,
};
use crate::Result;

/// Spoken when a handler fails unexpectedly
pub const CRITICAL_ERROR: &str = "I have encountered a critical error, Pilot.";

/// Spoken when the speech recognition service cannot be reached
pub const CONNECTION_DOWN: &str = "Pilot, my connection to command is down.";

/// Dialogue pool spoken when a trigger is accepted
pub const POOL_PTT_ACK: &str = "ptt_ack";

/// Dialogue pool spoken when nothing matched
pub const POOL_ERROR: &str = "error";

/// Dialogue pool spoken before listening for a confirmation
pub const POOL_CONFIRMATION: &str = "confirmation";

/// Dialogue pool spoken at startup
pub const POOL_STARTUP: &str = "startup";

/// Dialogue pool spoken before exiting
pub const POOL_SHUTDOWN: &str = "shutdown";

/// Hardware and network boundaries the assistant talks through
pub struct Services {
    /// Speech input
    pub microphone: Arc<dyn Microphone>,
    /// Speech recognition
    pub transcriber: Arc<dyn Transcriber>,
    /// Speech synthesis
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Audio output
    pub sink: Arc<dyn AudioSink>,
}

impl Services {
    /// Real devices and engines described by the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configured STT provider has no API key
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            microphone: Arc::new(CpalMicrophone::new()),
            transcriber: Arc::new(SpeechToText::from_config(&config.voice, &config.api_keys)?),
            synthesizer: Arc::new(PiperSynthesizer::from_config(&config.voice)),
            sink: Arc::new(SpeakerSink),
        })
    }
}

/// How a dispatched command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler returned normally
    Completed,
    /// The handler failed; the critical error phrase was spoken
    Failed,
    /// No handler is registered for the command type
    Unregistered,
}

/// The running assistant
pub struct Assistant {
    config: Config,
    catalogue: Catalogue,
    registry: ActionRegistry,
    turn: Arc<TurnState>,
    speech: SpeechCache,
    microphone: Arc<dyn Microphone>,
    transcriber: Arc<dyn Transcriber>,
    context: Mutex<Context>,
    memory: Mutex<MemoryStore>,
    watchdog: Mutex<WatchdogStore>,
    clipboard: ClipboardArchive,
    shutdown: watch::Sender<bool>,
}

impl Assistant {
    /// Assemble the assistant and load persisted state
    ///
    /// # Errors
    ///
    /// Returns error if a catalogue command type has no registered handler
    pub fn new(
        config: Config,
        catalogue: Catalogue,
        registry: ActionRegistry,
        services: Services,
    ) -> Result<Arc<Self>> {
        registry.validate(&catalogue)?;

        let speech = SpeechCache::new(config.tts_cache_dir(), services.synthesizer, services.sink);
        let memory = MemoryStore::load(config.memory_path());
        let watchdog = WatchdogStore::load(config.watchdog_path());
        let clipboard = ClipboardArchive::new(config.clipboard_log_path());
        let (shutdown, _) = watch::channel(false);

        tracing::debug!(
            handlers = registry.len(),
            facts = memory.len(),
            cache = %speech.dir().display(),
            "assistant ready"
        );

        Ok(Arc::new(Self {
            config,
            catalogue,
            registry,
            turn: TurnState::new(),
            speech,
            microphone: services.microphone,
            transcriber: services.transcriber,
            context: Mutex::new(Context::default()),
            memory: Mutex::new(memory),
            watchdog: Mutex::new(watchdog),
            clipboard,
            shutdown,
        }))
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Command catalogue
    #[must_use]
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Turn-taking state
    #[must_use]
    pub fn turn(&self) -> &Arc<TurnState> {
        &self.turn
    }

    /// Clipboard archive
    #[must_use]
    pub const fn clipboard(&self) -> &ClipboardArchive {
        &self.clipboard
    }

    /// Read or update the conversational context
    pub fn with_context<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut lock(&self.context))
    }

    /// Read or update the key/value memory
    pub fn with_memory<R>(&self, f: impl FnOnce(&mut MemoryStore) -> R) -> R {
        f(&mut lock(&self.memory))
    }

    /// Read or update the watchdog hashes
    pub fn with_watchdog<R>(&self, f: impl FnOnce(&mut WatchdogStore) -> R) -> R {
        f(&mut lock(&self.watchdog))
    }

    /// Speak a dialogue pool key or literal text
    ///
    /// Does nothing if something is already being spoken. Waits for any
    /// in-progress capture to finish first. Failures are logged.
    pub async fn speak(&self, key_or_text: &str) {
        let Some(_speaking) = self.turn.begin_speaking().await else {
            tracing::debug!(text = key_or_text, "already speaking, skipped");
            return;
        };

        let Some(phrase) = Phrase::resolve(&self.catalogue, key_or_text) else {
            tracing::warn!(pool = key_or_text, "dialogue pool is empty");
            return;
        };

        match self.speech.play(&phrase).await {
            Ok(status) => tracing::info!(text = phrase.text(), cache = status.label(), "spoke"),
            Err(e) => tracing::warn!(text = phrase.text(), error = %e, "speech failed"),
        }
    }

    /// Listen for one utterance with exclusive use of the microphone
    ///
    /// Device errors are logged and reported as no speech.
    pub async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> ListenOutcome {
        let _microphone = self.turn.lock_microphone().await;
        let _capture = self.turn.begin_capture().await;

        match self.microphone.listen(timeout, phrase_limit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "listen failed");
                ListenOutcome::NoSpeech
            }
        }
    }

    /// Turn captured audio into a normalized transcript
    ///
    /// Returns `None` for silence, unintelligible audio and an unreachable
    /// service; the last is announced to the user.
    pub async fn transcribe(&self, outcome: ListenOutcome) -> Option<String> {
        let ListenOutcome::Speech(utterance) = outcome else {
            tracing::debug!("no speech heard");
            return None;
        };

        match self.transcriber.transcribe(&utterance).await {
            Transcript::Text(text) => {
                let text = normalize_transcript(&text);
                tracing::info!(transcript = %text, "heard");
                (!text.is_empty()).then_some(text)
            }
            Transcript::NoSpeech => {
                tracing::debug!("speech not understood");
                None
            }
            Transcript::Unreachable => {
                self.speak(CONNECTION_DOWN).await;
                None
            }
        }
    }

    /// Ask for and listen to a spoken confirmation
    pub async fn confirm(&self) -> bool {
        self.speak(POOL_CONFIRMATION).await;

        let listen = self.config.listen;
        let outcome = self
            .listen(listen.confirm_timeout, listen.confirm_phrase_limit)
            .await;
        let Some(answer) = self.transcribe(outcome).await else {
            return false;
        };

        let confirmed = self
            .catalogue
            .confirmation_words()
            .iter()
            .any(|word| answer.contains(word.as_str()));
        tracing::info!(answer, confirmed, "confirmation");
        confirmed
    }

    /// Handle a push-to-talk press
    ///
    /// Starts a turn in the background and returns `true`, or returns `false`
    /// if the trigger was dropped because a turn is open or the assistant is
    /// speaking.
    pub fn trigger(self: &Arc<Self>) -> bool {
        if self.is_shutting_down() {
            return false;
        }
        let Some(recording) = self.turn.try_begin_turn() else {
            tracing::debug!("trigger ignored, assistant busy");
            return false;
        };

        let assistant = Arc::clone(self);
        tokio::spawn(async move {
            assistant.run_turn(recording).await;
        });
        true
    }

    /// Run one accepted turn to completion
    pub async fn run_turn(&self, recording: RecordingGuard) {
        self.speak(POOL_PTT_ACK).await;

        let listen = self.config.listen;
        let outcome = self.listen(listen.timeout, listen.phrase_limit).await;
        drop(recording);

        if let Some(transcript) = self.transcribe(outcome).await {
            self.process_transcript(&transcript).await;
        }
    }

    /// Resolve a transcript and run the matching command
    ///
    /// Returns the command type that ran, or `None` if nothing matched.
    pub async fn process_transcript(&self, transcript: &str) -> Option<String> {
        if transcript.is_empty() {
            return None;
        }

        let Some(resolution) = resolver::resolve(&self.catalogue, transcript) else {
            tracing::info!(transcript, "no command matched");
            self.speak(POOL_ERROR).await;
            return None;
        };

        let command = resolution.command;
        tracing::debug!(
            kind = %command.kind,
            keyword = resolution.keyword,
            residual = %resolution.residual,
            "command resolved"
        );

        if let Some(ack) = &command.ack {
            self.speak(ack).await;
        }
        self.with_context(|c| c.note_command(&command.kind, &resolution.residual));

        self.dispatch(command, &resolution.residual).await;
        Some(command.kind.clone())
    }

    /// Run the handler for a command, reporting failures aloud
    pub async fn dispatch(&self, command: &CommandSpec, residual: &str) -> Dispatch {
        let Some(handler) = self.registry.get(&command.kind) else {
            tracing::warn!(kind = %command.kind, "no handler for command type");
            return Dispatch::Unregistered;
        };

        tracing::info!(kind = %command.kind, residual, "running action");
        let invocation = Invocation { command, residual };
        match handler.run(self, invocation).await {
            Ok(()) => Dispatch::Completed,
            Err(e) => {
                tracing::error!(kind = %command.kind, error = %e, "action failed");
                self.speak(CRITICAL_ERROR).await;
                Dispatch::Failed
            }
        }
    }

    /// Whether a handler is registered for a command type
    #[must_use]
    pub fn can_dispatch(&self, kind: &str) -> bool {
        self.registry.contains(kind)
    }

    /// Speak the farewell and wait out the shutdown delay
    pub async fn farewell(&self) {
        self.speak(POOL_SHUTDOWN).await;
        tokio::time::sleep(self.config.pacing.shutdown_delay).await;
    }

    /// Ask the daemon to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver that changes once shutdown is requested
    #[must_use]
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Calibrate the microphone against ambient noise
    pub async fn calibrate(&self, duration: Duration) {
        let _microphone = self.turn.lock_microphone().await;
        if let Err(e) = self.microphone.calibrate(duration).await {
            tracing::warn!(error = %e, "microphone calibration failed");
        }
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("catalogue", &self.config.catalogue_path)
            .field("registry", &self.registry)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lowercase and strip the punctuation added by the recognizer
///
/// Apostrophes are kept, as is punctuation joining two alphanumerics
/// (`budget.xlsx`, `10:30`). Everything else becomes whitespace, and runs of
/// whitespace collapse to a single space.
#[must_use]
pub fn normalize_transcript(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let cleaned: String = chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let joins_word = i > 0
                && chars[i - 1].is_alphanumeric()
                && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());
            if c.is_alphanumeric() || c.is_whitespace() || c == '\'' || joins_word {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_transcript() {
        assert_eq!(normalize_transcript("  Open File Budget. "), "open file budget");
        assert_eq!(normalize_transcript("What time is it?"), "what time is it");
        assert_eq!(normalize_transcript("..."), "");
    }

    #[test]
    fn test_normalize_strips_inner_punctuation() {
        assert_eq!(
            normalize_transcript("Remember that, the door code is 1234."),
            "remember that the door code is 1234"
        );
        assert_eq!(normalize_transcript("Open file, budget!"), "open file budget");
        assert_eq!(normalize_transcript("What's the date?"), "what's the date");
        assert_eq!(normalize_transcript("Delete \"budget.xlsx\" -- now"), "delete budget.xlsx now");
    }
}
