//! Append-only clipboard archive

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::Result;

/// Text log that clipboard snapshots are appended to
#[derive(Debug, Clone)]
pub struct ClipboardArchive {
    path: PathBuf,
}

impl ClipboardArchive {
    /// Archive writing to `path`
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Log file location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot with a timestamp header
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be opened or written
    pub fn append(&self, content: &str, at: DateTime<Local>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{}", format_entry(content, at))?;
        Ok(())
    }
}

fn format_entry(content: &str, at: DateTime<Local>) -> String {
    format!(
        "\n--- Archived at {} ---\n{content}\n",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_entries_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ClipboardArchive::new(dir.path().join("clipboard_log.txt"));
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();

        archive.append("first", at).unwrap();
        archive.append("second", at).unwrap();

        let log = std::fs::read_to_string(archive.path()).unwrap();
        assert_eq!(
            log,
            "\n--- Archived at 2024-03-09 14:05:00 ---\nfirst\n\
             \n--- Archived at 2024-03-09 14:05:00 ---\nsecond\n"
        );
    }
}
