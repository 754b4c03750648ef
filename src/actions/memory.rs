//! Remember, recall and clipboard archiving

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ActionHandler, Invocation};
use crate::assistant::Assistant;
use crate::store::parse_fact;
use crate::{Error, Result};

/// Upper bound on reading the clipboard
const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Stores "X is Y" facts
#[derive(Debug, Clone, Copy, Default)]
pub struct RememberHandler;

#[async_trait]
impl ActionHandler for RememberHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((key, value)) = parse_fact(invocation.residual) else {
            assistant
                .speak("I didn't understand. Please say 'remember that something is something'.")
                .await;
            return Ok(());
        };

        assistant.with_memory(|memory| memory.remember(key, value));
        assistant
            .speak(&format!("Understood. I will remember that {key} is {value}."))
            .await;
        Ok(())
    }
}

/// Speaks a stored fact
#[derive(Debug, Clone, Copy, Default)]
pub struct RecallHandler;

#[async_trait]
impl ActionHandler for RecallHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let key = invocation.residual.trim().to_lowercase();
        let value = assistant.with_memory(|memory| memory.recall(&key).map(String::from));

        let reply = match value {
            Some(value) => format!("You said that {key} is {value}."),
            None => format!("I have no memory of {key}, Pilot."),
        };
        assistant.speak(&reply).await;
        Ok(())
    }
}

/// Appends the clipboard to the archive log
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveClipboardHandler;

#[async_trait]
impl ActionHandler for ArchiveClipboardHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        let content = match read_clipboard(&assistant.config().launcher.clipboard).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read clipboard");
                assistant.speak("I could not read the clipboard.").await;
                return Ok(());
            }
        };

        let archive = assistant.clipboard();
        match archive.append(&content, chrono::Local::now()) {
            Ok(()) => {
                tracing::info!(chars = content.len(), path = %archive.path().display(), "clipboard archived");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to archive clipboard");
            }
        }
        Ok(())
    }
}

/// Run the configured clipboard command and capture its output
async fn read_clipboard(argv: &[String]) -> Result<String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Config("clipboard command is empty".to_string()))?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Action(format!("failed to spawn {program}: {e}")))?;

    let output = tokio::time::timeout(CLIPBOARD_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| Error::Action(format!("{program} timed out")))??;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        return Err(Error::Action(format!("{program} exited with code {code}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
