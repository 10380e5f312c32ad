//! Builder pattern implementation for creating Fetcher instances.
//!
//! [`FetcherBuilder`] configures endpoints, paging, retries, concurrency and
//! callbacks, then builds a [`Fetcher`]. Building against the real API needs
//! [`Credentials`], so a run cannot start without them.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use product_fetcher::credentials::Credentials;
//! use product_fetcher::fetcher::FetcherBuilder;
//!
//! # fn example() -> Result<(), product_fetcher::Error> {
//! let credentials = Credentials::AccessToken("token".into());
//! let fetcher = FetcherBuilder::new()
//!     .page_size(100)
//!     .retries(3)
//!     .serial()
//!     .build(&credentials)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress Callbacks
//!
//! ```rust
//! use product_fetcher::credentials::Credentials;
//! use product_fetcher::fetcher::FetcherBuilder;
//! use product_fetcher::session::Status;
//!
//! # fn example() -> Result<(), product_fetcher::Error> {
//! let fetcher = FetcherBuilder::new()
//!     .on_progress(|p| println!("{}/{}", p.completed, p.total))
//!     .on_complete(|outcome| {
//!         if let Status::Fail(msg) = outcome.status() {
//!             eprintln!("{} failed: {}", outcome.reference(), msg);
//!         }
//!     })
//!     .build(&Credentials::AccessToken("token".into()))?;
//! # Ok(())
//! # }
//! ```

use super::config::FetcherConfig;
use super::fetcher::Fetcher;
use super::strategy::{Strategy, RATE_LIMIT_CAP};
use crate::api::{BrandFilter, CatalogApi, CatalogClient};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};
use crate::retry::RetryPolicy;
use crate::session::{Outcome, Progress};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A builder used to create a [`Fetcher`].
///
/// ```rust
/// use product_fetcher::fetcher::FetcherBuilder;
///
/// let builder = FetcherBuilder::new().retries(5).concurrency(2);
/// assert_eq!(builder.config().concurrency, 2);
/// ```
#[derive(Debug, Default)]
pub struct FetcherBuilder {
    config: FetcherConfig,
}

impl FetcherBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        FetcherBuilder::default()
    }

    /// The configuration built so far.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Set the root URL of the catalog API. A path prefix is kept.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.endpoints.base_url = base_url.into();
        self
    }

    /// Set the path of the list endpoint.
    pub fn list_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoints.list_path = path.into();
        self
    }

    /// Set the path of the detail endpoint.
    pub fn detail_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoints.detail_path = path.into();
        self
    }

    /// Set the number of products requested per list page.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the number of attempts per call, keeping the current delays.
    pub fn retries(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Replace the whole retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the number of detail requests allowed in flight.
    ///
    /// The upstream API tolerates at most [`RATE_LIMIT_CAP`] concurrent
    /// requests; larger values are lowered to the cap and 0 is raised to 1.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        let clamped = concurrency.clamp(1, RATE_LIMIT_CAP);
        if clamped != concurrency {
            warn!(
                "Concurrency {} is outside 1..={}, using {}",
                concurrency, RATE_LIMIT_CAP, clamped
            );
        }
        self.config.concurrency = clamped;
        self
    }

    /// Set the detail phase strategy.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Fetch details one at a time.
    pub fn serial(self) -> Self {
        self.strategy(Strategy::Serial)
    }

    /// Fetch details with a pool of workers.
    pub fn worker_pool(self) -> Self {
        self.strategy(Strategy::WorkerPool)
    }

    /// Fetch details in sequential batches.
    pub fn batched(self, batch_size: usize, batch_delay: Duration) -> Self {
        self.strategy(Strategy::Batched {
            batch_size,
            batch_delay,
        })
    }

    /// Set how the brand is sent to the list endpoint.
    pub fn brand_filter(mut self, brand_filter: BrandFilter) -> Self {
        self.config.brand_filter = brand_filter;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Route every request through a proxy.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add http headers. Calling it several times merges the maps.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: FetcherBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add a single http header.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use product_fetcher::fetcher::FetcherBuilder;
    ///
    /// let builder = FetcherBuilder::new()
    ///     .header(header::USER_AGENT, HeaderValue::from_static("fetcher/1.0"));
    /// assert!(builder.config().headers.is_some());
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Set callback fired after every counter update.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.config.on_progress = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Set callback for when each product is settled.
    ///
    /// The callback is called as soon as a product succeeds or exhausts its
    /// retries, while other fetches may still be in flight.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Fetcher`] talking to the HTTP catalog API.
    pub fn build(self, credentials: &Credentials) -> Result<Fetcher> {
        let mut headers = self.new_header();
        headers.extend(credentials.to_headers()?);

        let client = create_http_client(HttpClientConfig {
            timeout: self.config.timeout,
            proxy: self.config.proxy.clone(),
            headers: Some(headers),
        })
        .map_err(|e| Error::Internal(format!("cannot build HTTP client: {}", e)))?;

        let api = CatalogClient::new(client, &self.config.endpoints, self.config.brand_filter)?;
        Ok(Fetcher::new(self.config, Arc::new(api)))
    }

    /// Create the [`Fetcher`] on top of any catalog implementation.
    pub fn build_with_api(self, api: Arc<dyn CatalogApi>) -> Fetcher {
        Fetcher::new(self.config, api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::USER_AGENT;

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(FetcherBuilder::new().concurrency(10).config().concurrency, 3);
        assert_eq!(FetcherBuilder::new().concurrency(0).config().concurrency, 1);
        assert_eq!(FetcherBuilder::new().concurrency(2).config().concurrency, 2);
    }

    #[test]
    fn test_headers_merge() {
        let builder = FetcherBuilder::new()
            .header(USER_AGENT, HeaderValue::from_static("a"))
            .headers(HeaderMap::from_iter([(
                reqwest::header::ACCEPT,
                HeaderValue::from_static("application/json"),
            )]));
        let headers = builder.config().headers.as_ref().unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_retries_keep_delays() {
        let builder = FetcherBuilder::new()
            .retry_policy(RetryPolicy::new(5).with_base_delay(Duration::from_millis(1)))
            .retries(2);
        assert_eq!(builder.config().retry.max_attempts, 2);
        assert_eq!(builder.config().retry.base_delay, Duration::from_millis(1));
    }

    #[test]
    fn test_build_rejects_bad_base_url() {
        let err = FetcherBuilder::new()
            .base_url("not a url")
            .build(&Credentials::AccessToken("t".into()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
