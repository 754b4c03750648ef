//! Static command catalogue
//!
//! The catalogue is a JSON document loaded once at startup. It declares the
//! command keyword sets, dialogue pools, macros, confirmation words and
//! watchdog targets. A missing or malformed catalogue is fatal.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// A single command definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandSpec {
    /// Trigger keywords, matched as transcript prefixes
    pub keywords: Vec<String>,

    /// Dotted action identifier (e.g. "file.search")
    #[serde(rename = "type")]
    pub kind: String,

    /// Dialogue pool key spoken before the handler runs
    #[serde(default)]
    pub ack: Option<String>,

    /// Named targets (application paths, site URLs)
    #[serde(default)]
    pub targets: BTreeMap<String, String>,

    /// URL template with a `{query}` placeholder
    #[serde(default)]
    pub url_template: Option<String>,

    /// Key name for key-press actions
    #[serde(default)]
    pub key: Option<String>,

    /// Repeat count for stepped actions
    #[serde(default)]
    pub amount: Option<u32>,

    /// Direction for stepped actions ("up" / "down")
    #[serde(default)]
    pub direction: Option<String>,
}

impl CommandSpec {
    /// Build a keyword-less spec for an action type
    ///
    /// Used by macro steps whose type has no catalogue entry of its own.
    #[must_use]
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Pick the longest target name contained in `text`
    #[must_use]
    pub fn find_target(&self, text: &str) -> Option<(&str, &str)> {
        self.targets
            .iter()
            .filter(|(name, _)| text.contains(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// One step of a named macro
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MacroStep {
    /// Action type to invoke
    #[serde(rename = "type")]
    pub kind: String,

    /// Residual argument text passed to the handler
    #[serde(default)]
    pub data: String,
}

/// A monitored page for change detection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchdogTarget {
    /// Page URL
    pub url: String,

    /// CSS selector of the monitored element
    pub selector: String,
}

/// On-disk catalogue schema
#[derive(Debug, Deserialize)]
struct CatalogueFile {
    commands: Vec<CommandSpec>,

    #[serde(default)]
    dialogue_pools: HashMap<String, Vec<String>>,

    #[serde(default)]
    macros: BTreeMap<String, Vec<MacroStep>>,

    #[serde(default = "default_confirmation_words")]
    confirmation_words: Vec<String>,

    #[serde(default)]
    watchdog_targets: BTreeMap<String, WatchdogTarget>,
}

fn default_confirmation_words() -> Vec<String> {
    ["yes", "confirm", "affirmative", "do it"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Immutable command catalogue
#[derive(Debug, Clone)]
pub struct Catalogue {
    commands: Vec<CommandSpec>,
    dialogue_pools: HashMap<String, Vec<String>>,
    macros: BTreeMap<String, Vec<MacroStep>>,
    confirmation_words: Vec<String>,
    watchdog_targets: BTreeMap<String, WatchdogTarget>,
}

impl Catalogue {
    /// Load and validate a catalogue file
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, is not valid JSON, or fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalogue(format!("failed to read {}: {e}", path.display()))
        })?;
        let catalogue = Self::from_json(&content)?;

        tracing::info!(
            path = %path.display(),
            commands = catalogue.commands.len(),
            pools = catalogue.dialogue_pools.len(),
            macros = catalogue.macros.len(),
            "loaded command catalogue"
        );

        Ok(catalogue)
    }

    /// Parse and validate a catalogue from JSON text
    ///
    /// Keywords, macro names and watchdog target names are lowercased and trimmed.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed, a command has no keywords, or a
    /// keyword or type is empty
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogueFile = serde_json::from_str(json)
            .map_err(|e| Error::Catalogue(format!("malformed catalogue: {e}")))?;

        let mut commands = Vec::with_capacity(file.commands.len());
        for (index, mut command) in file.commands.into_iter().enumerate() {
            command.kind = command.kind.trim().to_string();
            if command.kind.is_empty() {
                return Err(Error::Catalogue(format!("command #{index} has no type")));
            }
            if command.keywords.is_empty() {
                return Err(Error::Catalogue(format!(
                    "command '{}' has no keywords",
                    command.kind
                )));
            }
            for keyword in &mut command.keywords {
                *keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(Error::Catalogue(format!(
                        "command '{}' has an empty keyword",
                        command.kind
                    )));
                }
            }
            commands.push(command);
        }

        let macros = file
            .macros
            .into_iter()
            .map(|(name, steps)| (name.trim().to_lowercase(), steps))
            .collect();
        let watchdog_targets = file
            .watchdog_targets
            .into_iter()
            .map(|(name, target)| (name.trim().to_lowercase(), target))
            .collect();
        let confirmation_words = file
            .confirmation_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self {
            commands,
            dialogue_pools: file.dialogue_pools,
            macros,
            confirmation_words,
            watchdog_targets,
        })
    }

    /// Commands in declaration order
    #[must_use]
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// First command declared with the given type
    #[must_use]
    pub fn command_for_type(&self, kind: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.kind == kind)
    }

    /// Alternatives for a dialogue pool key
    #[must_use]
    pub fn pool(&self, key: &str) -> Option<&[String]> {
        self.dialogue_pools.get(key).map(Vec::as_slice)
    }

    /// Steps of a named macro
    #[must_use]
    pub fn macro_steps(&self, name: &str) -> Option<&[MacroStep]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    /// Words accepted as a spoken confirmation
    #[must_use]
    pub fn confirmation_words(&self) -> &[String] {
        &self.confirmation_words
    }

    /// Monitored page for a watchdog target name
    #[must_use]
    pub fn watchdog_target(&self, name: &str) -> Option<&WatchdogTarget> {
        self.watchdog_targets.get(name)
    }
}
