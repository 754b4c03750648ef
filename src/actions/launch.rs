//! Opening and closing applications and websites

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ActionHandler, Invocation};
use crate::assistant::Assistant;
use crate::{Error, Result};

/// Start a detached process: `argv` followed by `extra`
///
/// # Errors
///
/// Returns error if `argv` is empty or the program cannot be spawned
pub(super) fn launch(argv: &[String], extra: &[&str]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Config("launcher command is empty".to_string()))?;

    let child = Command::new(program)
        .args(args)
        .args(extra)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::Action(format!("failed to launch {program}: {e}")))?;

    tracing::debug!(program, pid = child.id(), "launched");
    Ok(())
}

/// Fill a search URL template with an encoded query
#[must_use]
pub fn search_url(template: &str, query: &str) -> String {
    template.replace("{query}", &urlencoding::encode(query))
}

/// Starts a named application
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOpenHandler;

#[async_trait]
impl ActionHandler for AppOpenHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((name, program)) = invocation.command.find_target(invocation.residual) else {
            assistant.speak("Please specify which application.").await;
            return Ok(());
        };

        launch(&assistant.config().launcher.opener, &[program])?;
        assistant.with_context(|c| c.app = Some(name.to_string()));
        Ok(())
    }
}

/// Terminates a named application
#[derive(Debug, Clone, Copy, Default)]
pub struct AppCloseHandler;

#[async_trait]
impl ActionHandler for AppCloseHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((name, program)) = invocation.command.find_target(invocation.residual) else {
            assistant.speak("Please specify which application.").await;
            return Ok(());
        };

        let argv = &assistant.config().launcher.app_close;
        let (killer, args) = argv
            .split_first()
            .ok_or_else(|| Error::Config("app close command is empty".to_string()))?;

        let status = Command::new(killer)
            .args(args)
            .arg(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::Action(format!("failed to run {killer}: {e}")))?;
        tracing::debug!(program, ?status, "close requested");

        assistant
            .speak(&format!("{name} process terminated."))
            .await;
        Ok(())
    }
}

/// Opens a named website in the browser
#[derive(Debug, Clone, Copy, Default)]
pub struct WebOpenHandler;

#[async_trait]
impl ActionHandler for WebOpenHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((_, url)) = invocation.command.find_target(invocation.residual) else {
            assistant.speak("Please specify which website to open.").await;
            return Ok(());
        };

        launch(&assistant.config().launcher.opener, &[url])
    }
}

/// Opens a search results page for the spoken query
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSearchHandler;

#[async_trait]
impl ActionHandler for WebSearchHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some(template) = invocation.command.url_template.as_deref() else {
            return Err(Error::Action(format!(
                "command '{}' has no url_template",
                invocation.command.kind
            )));
        };

        let query = invocation.residual.trim();
        if query.is_empty() {
            assistant.speak("Please specify what to search for.").await;
            return Ok(());
        }

        launch(
            &assistant.config().launcher.opener,
            &[&search_url(template, query)],
        )
    }
}
