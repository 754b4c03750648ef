//! File search, move and delete

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::launch::launch;
use super::{ActionHandler, Invocation};
use crate::assistant::Assistant;
use crate::store::FileReference;
use crate::{Error, Result};

/// Directory depth searched below each root
const MAX_SEARCH_DEPTH: usize = 8;

/// Spoken when a pronoun has nothing to refer to
const NO_FILE_IN_CONTEXT: &str = "What file are you referring to, Pilot?";

/// Finds a file by partial name and opens it
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSearchHandler;

#[async_trait]
impl ActionHandler for FileSearchHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let query = invocation.residual.trim();
        if query.is_empty() {
            assistant.speak("Please specify a file name.").await;
            return Ok(());
        }

        assistant.speak(&format!("Searching for {query}...")).await;

        let Some(found) = search(assistant, query).await? else {
            assistant
                .speak(&format!("I could not locate any files matching {query}."))
                .await;
            return Ok(());
        };

        assistant
            .speak(&format!(
                "I found {} in your {} folder. Opening it.",
                file_name(&found),
                folder_name(&found)
            ))
            .await;
        assistant.with_context(|c| c.set_file(&found));

        let target = found.to_string_lossy();
        if let Err(e) = launch(&assistant.config().launcher.opener, &[target.as_ref()]) {
            tracing::warn!(error = %e, file = %found.display(), "failed to open file");
        }
        Ok(())
    }
}

/// Moves the referenced file to a named destination
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMoveHandler;

#[async_trait]
impl ActionHandler for FileMoveHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((file, rest)) = referenced_file(assistant, invocation.residual).await? else {
            return Ok(());
        };

        let Some(destination_name) = destination_phrase(&rest) else {
            assistant
                .speak("Please specify a destination, for example: move it to desktop.")
                .await;
            return Ok(());
        };

        let destination = assistant
            .config()
            .files
            .destinations
            .get(destination_name)
            .filter(|dir| dir.is_dir())
            .cloned();
        let Some(destination) = destination else {
            assistant
                .speak(&format!("I do not recognize the destination {destination_name}."))
                .await;
            return Ok(());
        };

        let target = destination.join(file_name(&file));
        match move_file(&file, &target).await {
            Ok(()) => {
                assistant.with_context(|c| c.set_file(&target));
                assistant
                    .speak(&format!("Moved {} to {destination_name}.", file_name(&file)))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, from = %file.display(), to = %target.display(), "file move failed");
                assistant.speak("I was unable to move the file.").await;
            }
        }
        Ok(())
    }
}

/// Deletes the referenced file after a spoken confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDeleteHandler;

#[async_trait]
impl ActionHandler for FileDeleteHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let Some((file, _)) = referenced_file(assistant, invocation.residual).await? else {
            return Ok(());
        };

        assistant
            .speak(&format!("Confirm: delete {}?", file_name(&file)))
            .await;
        if !assistant.confirm().await {
            assistant.speak("Deletion aborted.").await;
            return Ok(());
        }

        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                assistant.with_context(|c| {
                    if c.file.as_deref() == Some(file.as_path()) {
                        c.file = None;
                    }
                });
                assistant.speak("Target eliminated.").await;
            }
            Err(e) => {
                tracing::warn!(error = %e, file = %file.display(), "file delete failed");
                assistant.speak("Deletion failed. The file may be in use.").await;
            }
        }
        Ok(())
    }
}

/// Resolve a file command's argument to a path and the remaining words
///
/// Speaks and returns `None` when nothing can be resolved.
async fn referenced_file(
    assistant: &Assistant,
    residual: &str,
) -> Result<Option<(PathBuf, String)>> {
    let reference = assistant.with_context(|c| match c.resolve_file(residual) {
        FileReference::Contextual { file, rest } => Resolved::Contextual(file, rest.to_string()),
        FileReference::Named(text) => Resolved::Named(split_destination(text)),
        FileReference::Unresolved => Resolved::Unresolved,
    });

    match reference {
        Resolved::Contextual(file, rest) => Ok(Some((file, rest))),
        Resolved::Named((name, rest)) => match search(assistant, &name).await? {
            Some(file) => Ok(Some((file, rest))),
            None => {
                assistant
                    .speak(&format!("I could not locate any files matching {name}."))
                    .await;
                Ok(None)
            }
        },
        Resolved::Unresolved => {
            assistant.speak(NO_FILE_IN_CONTEXT).await;
            Ok(None)
        }
    }
}

/// Owned form of a [`FileReference`], safe to hold across speech
enum Resolved {
    Contextual(PathBuf, String),
    Named((String, String)),
    Unresolved,
}

/// Split "budget to desktop" into the file name and the destination phrase
fn split_destination(text: &str) -> (String, String) {
    match text.split_once(" to ") {
        Some((name, rest)) => (name.trim().to_string(), format!("to {}", rest.trim())),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Destination name from "to <destination>"
fn destination_phrase(rest: &str) -> Option<&str> {
    let destination = rest.trim().strip_prefix("to ")?.trim();
    (!destination.is_empty()).then_some(destination)
}

/// Search the configured roots for the first file whose name contains `query`
async fn search(assistant: &Assistant, query: &str) -> Result<Option<PathBuf>> {
    let roots = assistant.config().files.search_roots.clone();
    let query = query.to_string();
    tokio::task::spawn_blocking(move || find_file(&roots, &query))
        .await
        .map_err(|e| Error::Action(format!("file search task failed: {e}")))
}

/// First file below `roots` whose name contains `query`, case-insensitively
///
/// Roots are searched in order, each depth-first with entries sorted by name.
/// Unreadable directories are skipped.
#[must_use]
pub fn find_file(roots: &[PathBuf], query: &str) -> Option<PathBuf> {
    let query = query.to_lowercase();
    roots
        .iter()
        .find_map(|root| find_in(root, &query, MAX_SEARCH_DEPTH))
}

fn find_in(dir: &Path, query: &str, depth: usize) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return None;
        }
    };
    entries.sort();

    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) = entries.into_iter().partition(|p| p.is_dir());

    if let Some(hit) = files
        .into_iter()
        .find(|p| file_name(p).to_lowercase().contains(query))
    {
        return Some(hit);
    }

    if depth == 0 {
        return None;
    }
    dirs.iter().find_map(|d| find_in(d, query, depth - 1))
}

/// Rename, falling back to copy and remove across filesystems
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn folder_name(path: &Path) -> String {
    path.parent().map(file_name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_file_matches_partial_name() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("finance").join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Budget-Q3.xlsx"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let roots = vec![dir.path().to_path_buf()];
        assert_eq!(
            find_file(&roots, "budget"),
            Some(nested.join("Budget-Q3.xlsx"))
        );
        assert_eq!(find_file(&roots, "missing"), None);
    }

    #[test]
    fn test_find_file_prefers_earlier_root() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("report.pdf"), "").unwrap();
        std::fs::write(second.path().join("report.pdf"), "").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_file(&roots, "report"), Some(first.path().join("report.pdf")));
    }

    #[test]
    fn test_destination_phrase() {
        assert_eq!(destination_phrase("to desktop"), Some("desktop"));
        assert_eq!(destination_phrase("desktop"), None);
        assert_eq!(destination_phrase("to "), None);
    }

    #[test]
    fn test_split_destination() {
        assert_eq!(
            split_destination("budget to downloads"),
            ("budget".to_string(), "to downloads".to_string())
        );
        assert_eq!(split_destination("budget"), ("budget".to_string(), String::new()));
    }
}
