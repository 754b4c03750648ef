//! Conversational context
//!
//! Remembers what the user last worked with so follow-up commands can say
//! "it" or "that" instead of repeating a name.

use std::path::{Path, PathBuf};

/// Words that refer back to the most recent file
const PRONOUNS: &[&str] = &["it", "that", "this"];

/// Most recent entities, kept for the lifetime of the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Last file found or acted on
    pub file: Option<PathBuf>,
    /// Query of the last search-type command
    pub search: Option<String>,
    /// Last application opened
    pub app: Option<String>,
}

/// How a file-targeting command's argument resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference<'a> {
    /// A pronoun resolved to the most recent file; `rest` follows the pronoun
    Contextual { file: PathBuf, rest: &'a str },
    /// The argument names a file explicitly
    Named(&'a str),
    /// A pronoun was used but no file is in context
    Unresolved,
}

impl Context {
    /// Resolve the residual of a file command against the most recent file
    ///
    /// An empty residual or one whose first word is a pronoun refers to the
    /// most recent file.
    #[must_use]
    pub fn resolve_file<'a>(&self, residual: &'a str) -> FileReference<'a> {
        let residual = residual.trim();
        let (first, rest) = residual
            .split_once(char::is_whitespace)
            .unwrap_or((residual, ""));

        if !residual.is_empty() && !PRONOUNS.contains(&first) {
            return FileReference::Named(residual);
        }

        match &self.file {
            Some(file) => FileReference::Contextual {
                file: file.clone(),
                rest: rest.trim(),
            },
            None => FileReference::Unresolved,
        }
    }

    /// Record a search-type command's query, or clear it for anything else
    pub fn note_command(&mut self, kind: &str, residual: &str) {
        self.search = kind.contains("search").then(|| residual.to_string());
    }

    /// Remember a file as the most recent one
    pub fn set_file(&mut self, file: &Path) {
        self.file = Some(file.to_path_buf());
    }
}
