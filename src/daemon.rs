//! Daemon - the push-to-talk event loop
//!
//! A global key listener runs on its own OS thread and forwards presses of
//! the configured key into the async runtime. Each press is offered to the
//! assistant, which either starts a turn or drops it.

use std::sync::Arc;
use std::time::Duration;

use rdev::{Event, EventType, Key};
use tokio::sync::mpsc;

use crate::assistant::{Assistant, POOL_STARTUP};
use crate::{Error, Result};

/// Ambient noise sampled at startup
const CALIBRATION_WINDOW: Duration = Duration::from_secs(1);

/// Pending key presses buffered between the listener thread and the loop
const TRIGGER_BUFFER: usize = 16;

/// Map a key name to an [`rdev::Key`]
///
/// Names are case-insensitive: `F1`..`F12`, `ScrollLock`, `Pause`,
/// `PrintScreen`, `Insert`, `Home`, `End`, `PageUp`, `PageDown`,
/// `RightCtrl`, `RightAlt`, `RightShift`, `CapsLock` and `Num0`..`Num9`.
///
/// # Errors
///
/// Returns `Error::InvalidTriggerKey` for an unknown name
pub fn parse_trigger_key(name: &str) -> Result<Key> {
    let key = match name.trim().to_uppercase().as_str() {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "SCROLLLOCK" | "SCROLL_LOCK" | "SCROLL" => Key::ScrollLock,
        "PAUSE" | "BREAK" => Key::Pause,
        "PRINTSCREEN" | "PRINT_SCREEN" | "PRTSC" => Key::PrintScreen,
        "INSERT" | "INS" => Key::Insert,
        "HOME" => Key::Home,
        "END" => Key::End,
        "PAGEUP" | "PAGE_UP" | "PGUP" => Key::PageUp,
        "PAGEDOWN" | "PAGE_DOWN" | "PGDN" => Key::PageDown,
        "RIGHTCTRL" | "RIGHT_CTRL" | "CONTROLRIGHT" => Key::ControlRight,
        "RIGHTALT" | "RIGHT_ALT" | "ALTGR" => Key::AltGr,
        "RIGHTSHIFT" | "RIGHT_SHIFT" | "SHIFTRIGHT" => Key::ShiftRight,
        "CAPSLOCK" | "CAPS_LOCK" => Key::CapsLock,
        "NUM0" | "NUMPAD0" => Key::Kp0,
        "NUM1" | "NUMPAD1" => Key::Kp1,
        "NUM2" | "NUMPAD2" => Key::Kp2,
        "NUM3" | "NUMPAD3" => Key::Kp3,
        "NUM4" | "NUMPAD4" => Key::Kp4,
        "NUM5" | "NUMPAD5" => Key::Kp5,
        "NUM6" | "NUMPAD6" => Key::Kp6,
        "NUM7" | "NUMPAD7" => Key::Kp7,
        "NUM8" | "NUMPAD8" => Key::Kp8,
        "NUM9" | "NUMPAD9" => Key::Kp9,
        _ => return Err(Error::InvalidTriggerKey(name.to_string())),
    };
    Ok(key)
}

/// The voice router daemon
#[derive(Debug)]
pub struct Daemon {
    assistant: Arc<Assistant>,
    trigger_key: Key,
}

impl Daemon {
    /// Create a daemon for an assembled assistant
    ///
    /// # Errors
    ///
    /// Returns error if the configured push-to-talk key is not recognized
    pub fn new(assistant: Arc<Assistant>) -> Result<Self> {
        let trigger_key = parse_trigger_key(&assistant.config().ptt_key)?;
        Ok(Self {
            assistant,
            trigger_key,
        })
    }

    /// Run until a shutdown command or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the key listener cannot be started
    pub async fn run(self) -> Result<()> {
        self.assistant.calibrate(CALIBRATION_WINDOW).await;
        self.assistant.speak(POOL_STARTUP).await;

        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        spawn_key_listener(self.trigger_key, trigger_tx)?;

        tracing::info!(key = ?self.trigger_key, "voice router ready, hold the push-to-talk key to speak");
        self.event_loop(trigger_rx).await;
        Ok(())
    }

    /// Offer each key press to the assistant until shutdown
    ///
    /// Presses buffered before the loop starts are discarded.
    pub async fn event_loop(&self, mut triggers: mpsc::Receiver<()>) {
        let mut shutdown = self.assistant.subscribe_shutdown();
        if *shutdown.borrow_and_update() {
            return;
        }

        let mut stale = 0_usize;
        while triggers.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::debug!(stale, "dropped presses made before the loop started");
        }

        loop {
            tokio::select! {
                trigger = triggers.recv() => {
                    if trigger.is_none() {
                        tracing::warn!("key listener stopped");
                        break;
                    }
                    self.assistant.trigger();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("shutting down");
                        break;
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "failed to listen for ctrl-c");
                        continue;
                    }
                    tracing::info!("interrupted, shutting down");
                    self.assistant.farewell().await;
                    break;
                }
            }
        }
    }
}

/// Listen for global key presses on a dedicated thread
fn spawn_key_listener(key: Key, triggers: mpsc::Sender<()>) -> Result<()> {
    std::thread::Builder::new()
        .name("ptt-listener".to_string())
        .spawn(move || {
            let callback = move |event: Event| {
                if let EventType::KeyPress(pressed) = event.event_type
                    && pressed == key
                    && triggers.try_send(()).is_err()
                {
                    tracing::trace!("trigger buffer full, press dropped");
                }
            };
            if let Err(e) = rdev::listen(callback) {
                tracing::error!(error = ?e, "global key listener failed");
            }
        })
        .map_err(|e| Error::Config(format!("failed to start key listener: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_key() {
        assert_eq!(parse_trigger_key("F9").unwrap(), Key::F9);
        assert_eq!(parse_trigger_key("scroll_lock").unwrap(), Key::ScrollLock);
        assert_eq!(parse_trigger_key(" pgdn ").unwrap(), Key::PageDown);
        assert_eq!(parse_trigger_key("numpad5").unwrap(), Key::Kp5);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            parse_trigger_key("hyper"),
            Err(Error::InvalidTriggerKey(name)) if name == "hyper"
        ));
    }
}
