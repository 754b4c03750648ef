//! Action handlers
//!
//! Every catalogue command type maps to one [`ActionHandler`]. Handlers speak
//! their own results through the [`Assistant`]; an `Err` return is reported
//! to the user as a critical error and never stops the assistant.

mod files;
mod general;
mod launch;
mod macros;
mod memory;
mod watchdog;
mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

pub use files::{FileDeleteHandler, FileMoveHandler, FileSearchHandler, find_file};
pub use general::{DateHandler, JokeHandler, ShutdownHandler, TimeHandler};
pub use launch::{AppCloseHandler, AppOpenHandler, WebOpenHandler, WebSearchHandler, search_url};
pub use macros::MacroHandler;
pub use memory::{ArchiveClipboardHandler, RecallHandler, RememberHandler};
pub use watchdog::WatchdogHandler;
pub use weather::WeatherHandler;

use crate::assistant::Assistant;
use crate::catalogue::{Catalogue, CommandSpec};
use crate::{Error, Result};

/// One call into a handler
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Command being executed
    pub command: &'a CommandSpec,
    /// Transcript text after the keyword, or macro step data
    pub residual: &'a str,
}

/// Executes one command type
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action
    ///
    /// # Errors
    ///
    /// Returns error on an unexpected failure; expected problems (missing
    /// argument, unknown target) are spoken and return `Ok`
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()>;
}

/// Handlers keyed by command type
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();

        registry.register("general.time", TimeHandler);
        registry.register("general.date", DateHandler);
        registry.register("general.joke", JokeHandler);
        registry.register("script.shutdown", ShutdownHandler);

        registry.register("utility.remember", RememberHandler);
        registry.register("utility.recall", RecallHandler);
        registry.register("utility.archive_clipboard", ArchiveClipboardHandler);

        registry.register("file.search", FileSearchHandler);
        registry.register("file.move", FileMoveHandler);
        registry.register("file.delete", FileDeleteHandler);

        registry.register("app.open", AppOpenHandler);
        registry.register("app.close", AppCloseHandler);
        registry.register("web.open", WebOpenHandler);
        registry.register("web.search", WebSearchHandler);

        registry.register("web.watchdog", WatchdogHandler::new()?);
        registry.register("api.weather", WeatherHandler::new()?);
        registry.register("macro.run", MacroHandler);

        Ok(registry)
    }

    /// Register a handler, replacing any previous one for the type
    pub fn register(&mut self, kind: impl Into<String>, handler: impl ActionHandler + 'static) {
        let kind = kind.into();
        if self.handlers.insert(kind.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(kind, "replaced action handler");
        }
    }

    /// Handler for a command type
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Whether a command type has a handler
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Check that every catalogue command has a handler
    ///
    /// Macro step types are not checked; unknown ones are skipped at run time.
    ///
    /// # Errors
    ///
    /// Returns error naming the first command type with no handler
    pub fn validate(&self, catalogue: &Catalogue) -> Result<()> {
        match catalogue.commands().iter().find(|c| !self.contains(&c.kind)) {
            Some(command) => Err(Error::Catalogue(format!(
                "no handler registered for command type '{}'",
                command.kind
            ))),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ActionRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_core_types() {
        let registry = ActionRegistry::with_builtins().unwrap();
        for kind in ["general.time", "file.search", "macro.run", "web.watchdog"] {
            assert!(registry.contains(kind), "missing {kind}");
        }
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let registry = ActionRegistry::with_builtins().unwrap();
        let catalogue = Catalogue::from_json(
            r#"{"commands": [{"keywords": ["dance"], "type": "robot.dance"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            registry.validate(&catalogue),
            Err(Error::Catalogue(_))
        ));
    }
}
