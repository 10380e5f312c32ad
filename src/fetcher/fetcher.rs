//! Core fetcher implementation.
//!
//! A [`Fetcher`] runs the whole pipeline for one brand: walk the product list,
//! fetch every detail record with the configured [`Strategy`], hand the
//! records to a [`ResultSink`] and finalize it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use product_fetcher::credentials::{CredentialKind, Credentials};
//! use product_fetcher::fetcher::FetcherBuilder;
//! use product_fetcher::sink::MemorySink;
//!
//! # async fn example() -> Result<(), product_fetcher::Error> {
//! let credentials = Credentials::load(CredentialKind::AccessToken)?;
//! let fetcher = FetcherBuilder::new().worker_pool().build(&credentials)?;
//!
//! let mut sink = MemorySink::new("products.json");
//! let report = fetcher.fetch("Nike", &mut sink).await?;
//! println!(
//!     "{}: {} of {} product(s) saved",
//!     report.brand, report.succeeded, report.references
//! );
//! # Ok(())
//! # }
//! ```

use super::config::FetcherConfig;
use super::strategy::{Coordinator, Strategy};
use crate::api::CatalogApi;
use crate::error::{Error, Result};
use crate::paginator::paginate;
use crate::retry::RetryPolicy;
use crate::session::{FetchSession, RunReport};
use crate::sink::ResultSink;

use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Runs fetches against a catalog.
///
/// Created through [`FetcherBuilder`](super::FetcherBuilder). Cloning is cheap
/// and clones share the underlying HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    config: FetcherConfig,
    api: Arc<dyn CatalogApi>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .finish()
    }
}

impl Fetcher {
    pub(crate) fn new(config: FetcherConfig, api: Arc<dyn CatalogApi>) -> Self {
        Self { config, api }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Gets the detail phase strategy.
    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// Gets the number of detail requests allowed in flight.
    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Gets the retry policy.
    pub fn retry(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Gets the list page size.
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Create a session for `brand` carrying the configured callbacks.
    ///
    /// Keep a clone of the session to poll its progress while
    /// [`Fetcher::run`] is in flight.
    pub fn session(&self, brand: impl Into<String>) -> FetchSession {
        FetchSession::with_callbacks(
            brand,
            self.config.on_progress.clone(),
            self.config.on_complete.clone(),
        )
    }

    /// Fetch every product of `brand` into `sink`.
    pub async fn fetch<S>(&self, brand: &str, sink: &mut S) -> Result<RunReport>
    where
        S: ResultSink + ?Sized,
    {
        let session = self.session(brand);
        self.run(&session, sink).await
    }

    /// Run the pipeline for an existing session.
    ///
    /// The session's counters start from zero on every run, so a session can
    /// be run again.
    ///
    /// Fails if the brand is blank, if the product list cannot be walked or if
    /// the sink cannot write. Failed detail fetches do not fail the run; they
    /// are listed in the report.
    pub async fn run<S>(&self, session: &FetchSession, sink: &mut S) -> Result<RunReport>
    where
        S: ResultSink + ?Sized,
    {
        let brand = session.brand().trim();
        if brand.is_empty() {
            return Err(Error::InvalidBrand(session.brand().to_string()));
        }

        info!("Listing products for brand {:?}", brand);
        let pagination = paginate(
            self.api.as_ref(),
            &self.config.retry,
            brand,
            self.config.page_size,
        )
        .await?;
        let references = pagination.references.len();
        info!(
            "Found {} product(s) for {:?} in {} page(s) (reported total {})",
            references, brand, pagination.pages, pagination.total
        );

        session.begin(references);
        let failures = Coordinator::new(
            self.api.clone(),
            self.config.retry,
            self.config.concurrency,
            session,
        )
        .run(self.config.strategy, pagination.references, sink)
        .await?;

        let finalized = sink.finalize().await?;
        let progress = session.progress();
        info!(
            "Fetched {} of {} product(s) for {:?}",
            progress.completed - progress.failed,
            progress.total,
            brand
        );

        Ok(RunReport {
            brand: brand.to_string(),
            reported_total: pagination.total,
            references,
            completed: progress.completed,
            succeeded: progress.completed - progress.failed,
            failures,
            finalized,
        })
    }
}
