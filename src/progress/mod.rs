//! Progress module containing progress bar functionality.
//!
//! - `style` - progress bar styling options and templates
//! - `display` - a bar fed from session progress snapshots
//!
//! # Examples
//!
//! ```rust
//! use product_fetcher::fetcher::FetcherBuilder;
//! use product_fetcher::progress::{ProgressBarOpts, ProgressDisplay};
//!
//! let display = ProgressDisplay::new(ProgressBarOpts::hidden());
//! let feed = display.clone();
//! let builder = FetcherBuilder::new().on_progress(move |p| feed.update(p));
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::ProgressBarOpts;
