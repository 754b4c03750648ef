//! Spoken key/value memory

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::json;

/// Split "X is Y" into a fact, at the first " is "
///
/// Returns `None` when there is no separator or either side is empty.
#[must_use]
pub fn parse_fact(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(" is ")?;
    let (key, value) = (key.trim(), value.trim());
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

/// Facts keyed by lowercase subject, persisted after every change
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    facts: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Load the store, starting empty if the file is missing or corrupt
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let facts = json::load_map(&path);
        tracing::debug!(path = %path.display(), facts = facts.len(), "memory loaded");
        Self { path, facts }
    }

    /// Store a fact, replacing any previous value for the same subject
    pub fn remember(&mut self, key: &str, value: &str) {
        self.facts
            .insert(key.trim().to_lowercase(), value.trim().to_string());
        if let Err(e) = json::save_map(&self.path, &self.facts) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save memory");
        }
    }

    /// Look up a fact case-insensitively
    #[must_use]
    pub fn recall(&self, key: &str) -> Option<&str> {
        self.facts.get(&key.trim().to_lowercase()).map(String::as_str)
    }

    /// Number of stored facts
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fact_splits_on_first_is() {
        assert_eq!(
            parse_fact("the wifi password is this is fine"),
            Some(("the wifi password", "this is fine"))
        );
        assert_eq!(parse_fact("nothing to split"), None);
        assert_eq!(parse_fact(" is orphan"), None);
    }

    #[test]
    fn test_recall_is_case_insensitive_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let mut store = MemoryStore::load(path.clone());
        store.remember("Locker Code", "4471");
        assert_eq!(store.recall("locker code"), Some("4471"));

        let reloaded = MemoryStore::load(path);
        assert_eq!(reloaded.recall("LOCKER CODE"), Some("4471"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_unwritable_path_keeps_fact_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let mut store = MemoryStore::load(blocker.join("memory.json"));
        store.remember("parking", "level 3");
        assert_eq!(store.recall("parking"), Some("level 3"));
    }
}
