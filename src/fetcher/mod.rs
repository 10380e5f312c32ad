//! Fetcher module containing the pipeline, its builder and configuration.
//!
//! - `fetcher` - the [`Fetcher`] that runs list, detail and sink phases
//! - `builder` - [`FetcherBuilder`] for configuring it
//! - `config` - [`FetcherConfig`] and its defaults
//! - `strategy` - the concurrency [`Strategy`] of the detail phase
//!
//! # Examples
//!
//! ```rust
//! use product_fetcher::fetcher::{FetcherBuilder, Strategy};
//! use std::time::Duration;
//!
//! let builder = FetcherBuilder::new()
//!     .concurrency(3)
//!     .batched(50, Duration::from_millis(500));
//! assert_eq!(
//!     builder.config().strategy,
//!     Strategy::Batched { batch_size: 50, batch_delay: Duration::from_millis(500) }
//! );
//! ```

pub mod builder;
pub mod config;
#[allow(clippy::module_inception)]
pub mod fetcher;
pub mod strategy;

pub use crate::session::{OutcomeCallback, ProgressCallback};
pub use builder::FetcherBuilder;
pub use config::FetcherConfig;
pub use fetcher::Fetcher;
pub use strategy::{Strategy, DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE, RATE_LIMIT_CAP};
