//! Time, date, jokes and shutdown

use async_trait::async_trait;
use chrono::{DateTime, Local};

use super::{ActionHandler, Invocation};
use crate::Result;
use crate::assistant::Assistant;

/// Dialogue pool of jokes
const POOL_JOKES: &str = "jokes";

/// Speaks the current time
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeHandler;

#[async_trait]
impl ActionHandler for TimeHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        assistant.speak(&time_phrase(Local::now())).await;
        Ok(())
    }
}

/// Speaks today's date
#[derive(Debug, Clone, Copy, Default)]
pub struct DateHandler;

#[async_trait]
impl ActionHandler for DateHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        assistant.speak(&date_phrase(Local::now())).await;
        Ok(())
    }
}

/// Speaks a random joke
#[derive(Debug, Clone, Copy, Default)]
pub struct JokeHandler;

#[async_trait]
impl ActionHandler for JokeHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        assistant.speak(POOL_JOKES).await;
        Ok(())
    }
}

/// Says goodbye and stops the assistant
#[derive(Debug, Clone, Copy, Default)]
pub struct ShutdownHandler;

#[async_trait]
impl ActionHandler for ShutdownHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        tracing::info!("shutdown requested by voice");
        assistant.farewell().await;
        assistant.request_shutdown();
        Ok(())
    }
}

fn time_phrase(now: DateTime<Local>) -> String {
    format!("The time is {}.", now.format("%H:%M"))
}

fn date_phrase(now: DateTime<Local>) -> String {
    format!("Today is {}.", now.format("%A, %B %d, %Y"))
}
