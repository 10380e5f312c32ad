//! Configuration structures and defaults for the fetcher.
//!
//! [`FetcherConfig`] is filled in by the [`FetcherBuilder`](super::FetcherBuilder).
//! Every field has a default matching the upstream API's published limits.
//!
//! # Examples
//!
//! ```rust
//! use product_fetcher::session::{Outcome, Status};
//! use product_fetcher::fetcher::OutcomeCallback;
//!
//! let callback: OutcomeCallback = Box::new(|outcome: &Outcome| match outcome.status() {
//!     Status::Success => println!("✓ {}", outcome.reference()),
//!     Status::Fail(msg) => println!("✗ {} - {}", outcome.reference(), msg),
//! });
//! ```

use super::strategy::{Strategy, RATE_LIMIT_CAP};
use crate::api::{BrandFilter, Endpoints};
use crate::http::DEFAULT_TIMEOUT;
use crate::paginator::DEFAULT_PAGE_SIZE;
use crate::retry::RetryPolicy;
use crate::session::{OutcomeCallback, ProgressCallback};

use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

/// Configuration structure for the fetcher.
#[derive(Clone)]
pub struct FetcherConfig {
    /// Location of the catalog endpoints.
    pub endpoints: Endpoints,
    /// Products requested per list page.
    pub page_size: u32,
    /// Retry policy for list and detail calls.
    pub retry: RetryPolicy,
    /// Maximum detail requests in flight, at most [`RATE_LIMIT_CAP`].
    pub concurrency: usize,
    /// How the detail phase is scheduled.
    pub strategy: Strategy,
    /// How the brand name is sent to the list endpoint.
    pub brand_filter: BrandFilter,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Optional proxy.
    pub proxy: Option<reqwest::Proxy>,
    /// Extra HTTP headers.
    pub headers: Option<HeaderMap>,
    /// Called after every counter update.
    pub on_progress: Option<Arc<ProgressCallback>>,
    /// Called with every product outcome.
    pub on_complete: Option<Arc<OutcomeCallback>>,
}

impl std::fmt::Debug for FetcherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherConfig")
            .field("endpoints", &self.endpoints)
            .field("page_size", &self.page_size)
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .field("strategy", &self.strategy)
            .field("brand_filter", &self.brand_filter)
            .field("timeout", &self.timeout)
            .field("proxy", &self.proxy)
            .field("headers", &self.headers)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            concurrency: RATE_LIMIT_CAP,
            strategy: Strategy::default(),
            brand_filter: BrandFilter::default(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            headers: None,
            on_progress: None,
            on_complete: None,
        }
    }
}
