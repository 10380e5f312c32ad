//! Terminal rendering of a fetch session.
//!
//! [`ProgressDisplay`] turns [`Progress`] snapshots into an indicatif bar. It
//! is fed from the `on_progress` callback, so the pipeline itself never draws
//! anything.
//!
//! ```rust
//! use product_fetcher::progress::{ProgressBarOpts, ProgressDisplay};
//! use product_fetcher::session::Progress;
//!
//! let display = ProgressDisplay::new(ProgressBarOpts::hidden());
//! display.update(Progress { completed: 1, total: 4, failed: 0 });
//! assert_eq!(display.bar().position(), 1);
//! display.finish();
//! ```

use super::ProgressBarOpts;
use crate::session::Progress;

use indicatif::ProgressBar;
use std::fmt;
use std::time::Duration;

/// Progress bar bound to a session's counters.
#[derive(Clone)]
pub struct ProgressDisplay {
    bar: ProgressBar,
    opts: ProgressBarOpts,
}

impl fmt::Debug for ProgressDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressDisplay")
            .field("position", &self.bar.position())
            .field("length", &self.bar.length())
            .field("opts", &self.opts)
            .finish()
    }
}

impl ProgressDisplay {
    /// Create a display. It spins until the first update carrying a total.
    pub fn new(opts: ProgressBarOpts) -> Self {
        let bar = if opts.is_enabled() {
            let spinner = ProgressBarOpts::new(
                Some(ProgressBarOpts::TEMPLATE_SPINNER.into()),
                None,
                true,
                opts.clear,
            );
            let bar = ProgressBar::new_spinner().with_style(spinner.to_progress_style());
            bar.set_message("Listing products...");
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, opts }
    }

    /// The underlying bar.
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Apply a snapshot.
    pub fn update(&self, progress: Progress) {
        let total = progress.total as u64;
        if self.bar.length() != Some(total) {
            self.bar.disable_steady_tick();
            self.bar.set_length(total);
            if self.opts.is_enabled() {
                self.bar.set_style(self.opts.clone().to_progress_style());
            }
        }
        self.bar.set_position(progress.completed as u64);
        if progress.failed > 0 {
            self.bar.set_message(format!("failed {}", progress.failed));
        } else {
            self.bar.set_message("");
        }
    }

    /// Finish the display, clearing or keeping the bar based on configuration.
    pub fn finish(&self) {
        if self.opts.clear {
            self.bar.finish_and_clear();
        } else {
            self.bar.finish();
        }
    }
}
