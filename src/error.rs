//! Error handling for the product fetcher.
//!
//! This module provides centralized error handling with the error types that
//! can occur while paginating the catalog, fetching detail records and
//! persisting them. Retryable failures (`Network`, `RateLimited`,
//! `HttpStatus`, `Decode`) are what a single attempt produces; once the retry
//! policy gives up they are wrapped in [`Error::ExhaustedRetries`].

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when fetching a catalog.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other categories,
    /// such as a worker task that panicked.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The configured base URL or endpoint path cannot form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The brand name is empty once trimmed.
    #[error("Invalid brand name: {0:?}")]
    InvalidBrand(String),

    /// Transport-level failure: connection refused, timeout, TLS, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream API answered with HTTP 429.
    #[error("Rate limited by upstream API (HTTP 429)")]
    RateLimited,

    /// The upstream API answered with a non-success status other than 429.
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus {
        /// Status code returned by the server.
        status: StatusCode,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A call kept failing until the retry policy gave up.
    ///
    /// `target` describes what was being fetched, e.g. `product 12345` or
    /// `product list page (startId=0)`.
    #[error("Failed to fetch {target} after {attempts} attempt(s): {source}")]
    ExhaustedRetries {
        /// What was being fetched.
        target: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error of the final attempt.
        #[source]
        source: Box<Error>,
    },

    /// Required credentials are absent from the environment.
    #[error("Credentials missing: {}", .0.join(", "))]
    CredentialsMissing(Vec<String>),

    /// I/O Error.
    ///
    /// This variant wraps standard I/O errors that can occur while writing
    /// the output file.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from serde_json while serialising records.
    #[error("JSON error")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether this error came from an HTTP 429 response.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::RateLimited => true,
            Error::ExhaustedRetries { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            other => Error::Network(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Result type alias for operations that can fail with a fetcher error.
pub type Result<T> = std::result::Result<T, Error>;
