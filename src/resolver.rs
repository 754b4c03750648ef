//! Longest-keyword command resolution
//!
//! Every keyword of every command is tested as a prefix of the transcript.
//! The longest matching keyword wins, so "open file" beats "open" for the
//! transcript "open file budget". Among equal-length matches the command
//! declared first in the catalogue wins.

use crate::catalogue::{Catalogue, CommandSpec};

/// A transcript resolved to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Winning command
    pub command: &'a CommandSpec,
    /// Keyword that matched
    pub keyword: &'a str,
    /// Transcript with the keyword removed, trimmed
    pub residual: String,
}

/// Resolve a lowercase transcript against the catalogue
///
/// Returns `None` when no keyword is a prefix of the transcript.
#[must_use]
pub fn resolve<'a>(catalogue: &'a Catalogue, transcript: &str) -> Option<Resolution<'a>> {
    let mut best: Option<(&CommandSpec, &str, usize)> = None;

    for command in catalogue.commands() {
        for keyword in &command.keywords {
            if !transcript.starts_with(keyword.as_str()) {
                continue;
            }
            let len = keyword.chars().count();
            if best.is_none_or(|(_, _, best_len)| len > best_len) {
                best = Some((command, keyword.as_str(), len));
            }
        }
    }

    best.map(|(command, keyword, _)| Resolution {
        command,
        keyword,
        residual: residual(transcript, keyword),
    })
}

/// Remove the first occurrence of `keyword` and trim the remainder
fn residual(transcript: &str, keyword: &str) -> String {
    transcript.replacen(keyword, "", 1).trim().to_string()
}
