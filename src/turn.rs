//! Turn-taking state
//!
//! Three pieces of shared state serialize access to the audio hardware:
//! - the audio channel, which is either idle, speaking, or capturing, so the
//!   assistant never records its own voice
//! - the recording flag, set when a push-to-talk trigger is accepted and
//!   cleared as soon as listening ends
//! - the microphone lock, held for the whole of a `listen` call so only one
//!   listen is in flight at a time
//!
//! Every acquisition returns a guard that releases on drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Occupancy of the single audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Idle,
    Speaking,
    Capturing,
}

/// Shared turn-taking flags and locks
#[derive(Debug)]
pub struct TurnState {
    channel: watch::Sender<Channel>,
    recording: AtomicBool,
    microphone: tokio::sync::Mutex<()>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            channel: watch::Sender::new(Channel::Idle),
            recording: AtomicBool::new(false),
            microphone: tokio::sync::Mutex::new(()),
        }
    }
}

impl TurnState {
    /// Create idle turn state
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn channel(&self) -> Channel {
        *self.channel.borrow()
    }

    /// Move the channel from idle to `next`, returning the state it was in
    fn claim(&self, next: Channel) -> Channel {
        let mut previous = Channel::Idle;
        self.channel.send_if_modified(|channel| {
            previous = *channel;
            if *channel == Channel::Idle {
                *channel = next;
                true
            } else {
                false
            }
        });
        previous
    }

    /// Wait until the channel satisfies `ready`
    async fn wait_for(&self, ready: impl FnMut(&Channel) -> bool) {
        let mut channel = self.channel.subscribe();
        // The sender lives in `self`, so this cannot fail while we wait
        let _ = channel.wait_for(ready).await;
    }

    /// Whether audio is currently being played
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.channel() == Channel::Speaking
    }

    /// Whether the microphone is actively capturing
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.channel() == Channel::Capturing
    }

    /// Whether a push-to-talk recording window is open
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Whether a `listen` call currently owns the microphone
    #[must_use]
    pub fn microphone_in_use(&self) -> bool {
        self.microphone.try_lock().is_err()
    }

    /// Accept a push-to-talk trigger
    ///
    /// Returns `None` (the trigger is dropped) while speaking or while another
    /// recording window is open.
    #[must_use]
    pub fn try_begin_turn(self: &Arc<Self>) -> Option<RecordingGuard> {
        if self.is_speaking() {
            return None;
        }
        self.recording
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RecordingGuard {
                state: Arc::clone(self),
            })
    }

    /// Claim the audio channel for playback
    ///
    /// Returns `None` if something is already being spoken. Waits while the
    /// microphone is capturing.
    pub async fn begin_speaking(&self) -> Option<SpeakingGuard<'_>> {
        loop {
            match self.claim(Channel::Speaking) {
                Channel::Idle => return Some(SpeakingGuard { state: self }),
                Channel::Speaking => return None,
                Channel::Capturing => self.wait_for(|c| *c != Channel::Capturing).await,
            }
        }
    }

    /// Take exclusive ownership of the microphone
    pub async fn lock_microphone(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.microphone.lock().await
    }

    /// Claim the audio channel for capture, waiting for any playback to end
    ///
    /// Callers must hold the microphone lock.
    pub async fn begin_capture(&self) -> CaptureGuard<'_> {
        while self.claim(Channel::Capturing) != Channel::Idle {
            self.wait_for(|c| *c == Channel::Idle).await;
        }
        CaptureGuard { state: self }
    }

    /// Wait until nothing is being spoken
    pub async fn wait_until_silent(&self) {
        self.wait_for(|c| *c != Channel::Speaking).await;
    }

    fn release_channel(&self) {
        self.channel.send_replace(Channel::Idle);
    }
}

/// Holds the audio channel in the speaking state
#[derive(Debug)]
pub struct SpeakingGuard<'a> {
    state: &'a TurnState,
}

impl Drop for SpeakingGuard<'_> {
    fn drop(&mut self) {
        self.state.release_channel();
    }
}

/// Holds the audio channel in the capturing state
#[derive(Debug)]
pub struct CaptureGuard<'a> {
    state: &'a TurnState,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.state.release_channel();
    }
}

/// Keeps the recording window open for one accepted trigger
#[derive(Debug)]
pub struct RecordingGuard {
    state: Arc<TurnState>,
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        self.state.recording.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_second_trigger_is_dropped() {
        let state = TurnState::new();

        let first = state.try_begin_turn();
        assert!(first.is_some());
        assert!(state.is_recording());
        assert!(state.try_begin_turn().is_none());

        drop(first);
        assert!(!state.is_recording());
        assert!(state.try_begin_turn().is_some());
    }

    #[tokio::test]
    async fn test_speaking_is_exclusive() {
        let state = TurnState::new();

        let guard = state.begin_speaking().await;
        assert!(guard.is_some());
        assert!(state.is_speaking());
        assert!(state.begin_speaking().await.is_none());

        drop(guard);
        assert!(!state.is_speaking());
    }

    #[tokio::test]
    async fn test_trigger_dropped_while_speaking() {
        let state = TurnState::new();
        let _speaking = state.begin_speaking().await;

        assert!(state.try_begin_turn().is_none());
    }

    #[tokio::test]
    async fn test_capture_waits_for_playback() {
        let state = TurnState::new();
        let speaking = state.begin_speaking().await;

        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let _mic = state.lock_microphone().await;
                let _capture = state.begin_capture().await;
                state.is_capturing()
            })
        };

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!state.is_capturing());

        drop(speaking);
        assert!(waiter.await.unwrap());
        assert!(!state.is_capturing());
        assert!(!state.microphone_in_use());
    }

    #[tokio::test]
    async fn test_release_wakes_waiters_immediately() {
        let state = TurnState::new();
        let speaking = state.begin_speaking().await;

        let silent = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.wait_until_silent().await })
        };
        tokio::task::yield_now().await;
        assert!(!silent.is_finished());

        drop(speaking);
        tokio::time::timeout(Duration::from_millis(20), silent)
            .await
            .expect("waiter was not woken")
            .unwrap();
    }
}
