//! Comment source configuration.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RetryPolicy;

/// Default YouTube Data API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page size the comment threads endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default overall deadline for one fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Text rendering requested from the source service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    /// Comment bodies rendered with markup (`<br>`, links, entities).
    #[default]
    Html,
    /// Comment bodies as plain text.
    PlainText,
}

impl TextFormat {
    /// Returns the value the API expects for `textFormat`.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            TextFormat::Html => "html",
            TextFormat::PlainText => "plainText",
        }
    }
}

/// Settings for the comment source client.
#[derive(Clone)]
pub struct SourceConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL of the API.
    pub endpoint: String,
    /// Threads requested per page (1..=100).
    pub page_size: u32,
    /// Requested text rendering.
    pub text_format: TextFormat,
    /// Maximum number of pages fetched per call (None = unlimited).
    pub max_pages: Option<NonZeroU32>,
    /// Overall deadline for one `fetch_comments` call.
    pub timeout: Duration,
    /// Retry policy for transient page failures.
    pub retry: RetryPolicy,
}

impl SourceConfig {
    /// Creates a config with defaults and the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: MAX_PAGE_SIZE,
            text_format: TextFormat::default(),
            max_pages: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the page size, clamped to what the API accepts.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Sets the text format.
    pub fn with_text_format(mut self, text_format: TextFormat) -> Self {
        self.text_format = text_format;
        self
    }

    /// Limits the number of pages per fetch. `0` means unlimited.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = NonZeroU32::new(max_pages);
        self
    }

    /// Sets the overall fetch deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("page_size", &self.page_size)
            .field("text_format", &self.text_format)
            .field("max_pages", &self.max_pages)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SourceConfig::new("key");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn zero_max_pages_means_unlimited() {
        let config = SourceConfig::new("key").with_max_pages(0);
        assert_eq!(config.max_pages, None);

        let config = SourceConfig::new("key").with_max_pages(4);
        assert_eq!(config.max_pages.map(NonZeroU32::get), Some(4));
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(SourceConfig::new("k").with_page_size(0).page_size, 1);
        assert_eq!(SourceConfig::new("k").with_page_size(500).page_size, 100);
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", SourceConfig::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
