//! Spoken page-change checks

use async_trait::async_trait;

use super::{ActionHandler, Invocation};
use crate::assistant::Assistant;
use crate::store::WatchOutcome;
use crate::watchdog::{PageFetcher, content_hash, extract_text};
use crate::Result;

/// Checks a named watchdog target for changes
#[derive(Debug, Clone)]
pub struct WatchdogHandler {
    fetcher: PageFetcher,
}

impl WatchdogHandler {
    /// Create a handler with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(PageFetcher::new()?))
    }

    /// Create a handler using an existing fetcher
    #[must_use]
    pub const fn with_fetcher(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ActionHandler for WatchdogHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let name = invocation.residual.trim().to_lowercase();
        let Some(target) = assistant.catalogue().watchdog_target(&name) else {
            assistant.speak("Please specify a valid watchdog target.").await;
            return Ok(());
        };

        assistant.speak(&format!("Checking watchdog for {name}...")).await;

        let text = match self.fetcher.fetch(&target.url).await {
            Ok(html) => extract_text(&html, &target.selector),
            Err(e) => Err(e),
        };

        let reply = match text {
            Ok(Some(text)) => {
                let hash = content_hash(&text);
                match assistant.with_watchdog(|store| store.observe(&name, &hash)) {
                    WatchOutcome::Changed => {
                        format!("Affirmative. The watchdog target {name} has been updated.")
                    }
                    WatchOutcome::Unchanged => {
                        "Negative, Pilot. No change detected at that node.".to_string()
                    }
                }
            }
            Ok(None) => "Error: I could not find the target element on the page.".to_string(),
            Err(e) => {
                tracing::warn!(target = %name, error = %e, "watchdog check failed");
                "I was unable to check the webpage.".to_string()
            }
        };

        assistant.speak(&reply).await;
        Ok(())
    }
}
