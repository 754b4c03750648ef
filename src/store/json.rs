//! Flat JSON string maps on disk

use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

/// Load a string map, treating a missing or corrupt file as empty
pub fn load_map(path: &Path) -> BTreeMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no saved state, starting empty");
            return BTreeMap::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read state, starting empty");
            return BTreeMap::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "corrupt state file, starting empty");
        BTreeMap::new()
    })
}

/// Write a string map as pretty JSON, replacing the file
///
/// # Errors
///
/// Returns error if the file cannot be written
pub fn save_map(path: &Path, map: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(map)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_map(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ definitely not json").unwrap();
        assert!(load_map(&path).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");
        let mut map = BTreeMap::new();
        map.insert("locker code".to_string(), "4471".to_string());

        save_map(&path, &map).unwrap();
        assert_eq!(load_map(&path), map);
    }
}
