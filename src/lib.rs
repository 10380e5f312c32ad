//! Product fetcher is a crate that downloads a brand's product catalog from a
//! rate-limited e-commerce API.
//!
//! A run walks the cursor-paginated product list, fetches every product's
//! detail record without exceeding three concurrent requests, and persists
//! the records as JSON. Failed products are retried with exponential backoff
//! and, once retries are exhausted, reported without aborting the run.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use product_fetcher::{CredentialKind, Credentials, FetcherBuilder, MemorySink, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let credentials = Credentials::load(CredentialKind::AccessToken)?;
//! let fetcher = FetcherBuilder::new().build(&credentials)?;
//!
//! let mut sink = MemorySink::new("products.json");
//! let report = fetcher.fetch("Nike", &mut sink).await?;
//! println!("{} product(s) saved", report.succeeded);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`api`] - Wire types and the [`CatalogApi`] seam with its HTTP client
//! - [`credentials`] - Loading credentials from the environment
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`fetcher`] - The [`Fetcher`], its builder and the concurrency strategies
//! - [`http`] - HTTP client construction
//! - [`paginator`] - Walking the product list
//! - [`progress`] - Progress bar styling and display
//! - [`retry`] - Retry policy with backoff
//! - [`session`] - Run state, outcomes and the final report
//! - [`sink`] - Where fetched records go

pub mod api;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod paginator;
pub mod progress;
pub mod retry;
pub mod session;
pub mod sink;

pub use api::{BrandFilter, CatalogApi, CatalogClient, Endpoints, ProductDetail, ProductRef};
pub use credentials::{CredentialKind, Credentials};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, FetcherBuilder, Strategy, RATE_LIMIT_CAP};
pub use http::{create_http_client, HttpClientConfig};
pub use paginator::{paginate, Pagination};
pub use progress::{ProgressBarOpts, ProgressDisplay};
pub use retry::RetryPolicy;
pub use session::{FetchSession, Outcome, Progress, RunReport, Status};
pub use sink::{BatchFileSink, Finalized, MemorySink, ResultSink};
