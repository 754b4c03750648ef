//! Last observed content hash per monitored page

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::json;

/// Result of comparing a fresh hash against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// First observation, or the content differs from last time
    Changed,
    /// Same content as last time
    Unchanged,
}

/// Content hashes keyed by watchdog target name
#[derive(Debug)]
pub struct WatchdogStore {
    path: PathBuf,
    hashes: BTreeMap<String, String>,
}

impl WatchdogStore {
    /// Load the store, starting empty if the file is missing or corrupt
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let hashes = json::load_map(&path);
        Self { path, hashes }
    }

    /// Record a hash for a target and report whether it changed
    ///
    /// The file is only rewritten when the hash differs.
    pub fn observe(&mut self, target: &str, hash: &str) -> WatchOutcome {
        if self.hashes.get(target).is_some_and(|prev| prev == hash) {
            return WatchOutcome::Unchanged;
        }

        self.hashes.insert(target.to_string(), hash.to_string());
        if let Err(e) = json::save_map(&self.path, &self.hashes) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save watchdog state");
        }
        WatchOutcome::Changed
    }

    /// Last recorded hash for a target
    #[must_use]
    pub fn last_hash(&self, target: &str) -> Option<&str> {
        self.hashes.get(target).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatchdogStore::load(dir.path().join("watchdog.json"));

        assert_eq!(store.observe("prices", "abc"), WatchOutcome::Changed);
        assert_eq!(store.observe("prices", "abc"), WatchOutcome::Unchanged);
        assert_eq!(store.observe("prices", "def"), WatchOutcome::Changed);
        assert_eq!(store.last_hash("prices"), Some("def"));
    }

    #[test]
    fn test_unchanged_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchdog.json");

        let mut store = WatchdogStore::load(path.clone());
        store.observe("prices", "abc");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(store.observe("prices", "abc"), WatchOutcome::Unchanged);
        assert!(!path.exists());
    }
}
