//! Web page change detection
//!
//! A watchdog target names a page and a CSS selector. Each check fetches the
//! page, hashes the text of the first matching element, and compares the
//! hash with the one recorded last time.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Browser-like user agent; some sites refuse unknown clients
const USER_AGENT: &str = "Mozilla/5.0";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Hex SHA-256 of element text
#[must_use]
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Text of the first element matching `selector`
///
/// Returns `Ok(None)` when nothing matches.
///
/// # Errors
///
/// Returns error if the selector is not valid CSS
pub fn extract_text(html: &str, selector: &str) -> Result<Option<String>> {
    let selector = Selector::parse(selector)
        .map_err(|e| Error::Watchdog(format!("invalid selector '{selector}': {e}")))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>()))
}

/// Fetches monitored pages
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the default timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }

    /// Fetch a page body as text
    ///
    /// # Errors
    ///
    /// Returns error on network failure or a non-success status
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Watchdog(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Watchdog(format!("HTTP {status} from {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Watchdog(format!("failed to read {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="price">$<span>42</span></div>
          <div class="price">$99</div>
        </body></html>
    "#;

    #[test]
    fn test_extracts_first_match_text() {
        assert_eq!(
            extract_text(PAGE, "div.price").unwrap().as_deref(),
            Some("$42")
        );
    }

    #[test]
    fn test_missing_element_is_none() {
        assert_eq!(extract_text(PAGE, "#stock").unwrap(), None);
    }

    #[test]
    fn test_invalid_selector_is_error() {
        assert!(matches!(
            extract_text(PAGE, "div[").unwrap_err(),
            Error::Watchdog(_)
        ));
    }

    #[test]
    fn test_content_hash_is_stable_hex() {
        let hash = content_hash("$42");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash("$42"));
        assert_ne!(hash, content_hash("$43"));
    }
}
