//! Error taxonomy for the scraping pipeline.
//!
//! Adapters return these freely; the aggregator turns them into per-source
//! outcomes so one broken site never fails the combined response.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraping operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP request failed before a response arrived
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// CSS selector failed to parse
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Headless browser launch, navigation or evaluation failed
    #[error("browser automation failed: {0}")]
    Browser(String),

    /// The blocking scrape task panicked or was cancelled
    #[error("scrape task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ScrapeError {
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }
}
