//! Fetch session, per-product outcomes and the run report.
//!
//! A [`FetchSession`] is the shared state of one run. It is a cheap handle
//! around atomic counters, so a UI can clone it and poll
//! [`FetchSession::progress`] while the run is in flight. It can also receive
//! pushes through the `on_progress` callback configured on the
//! [`FetcherBuilder`](crate::FetcherBuilder).
//!
//! # Examples
//!
//! ```rust
//! use product_fetcher::session::{Outcome, Status};
//! use product_fetcher::api::ProductRef;
//!
//! let outcome = Outcome::new(ProductRef::from("1001")).fail("HTTP 429");
//! match outcome.status() {
//!     Status::Success => println!("fetched {}", outcome.reference()),
//!     Status::Fail(msg) => println!("failed {}: {}", outcome.reference(), msg),
//! }
//! ```

use crate::api::ProductRef;
use crate::sink::Finalized;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Callback receiving a progress snapshot after every completed product.
pub type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Callback receiving the outcome of every product.
pub type OutcomeCallback = Box<dyn Fn(&Outcome) + Send + Sync>;

/// Result of one detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The detail record was fetched.
    Success,
    /// Every attempt failed; the message describes the last error.
    Fail(String),
}

/// Outcome of fetching one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    reference: ProductRef,
    status: Status,
}

impl Outcome {
    /// Create a successful outcome for `reference`.
    pub fn new(reference: ProductRef) -> Self {
        Self {
            reference,
            status: Status::Success,
        }
    }

    /// Attach a status.
    pub fn with_status(self, status: Status) -> Self {
        Self { status, ..self }
    }

    /// Mark the outcome as failed with a message.
    pub fn fail(self, msg: impl fmt::Display) -> Self {
        Self {
            status: Status::Fail(msg.to_string()),
            ..self
        }
    }

    /// The product this outcome is about.
    pub fn reference(&self) -> &ProductRef {
        &self.reference
    }

    /// Get a reference to the outcome's status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Whether the detail record was fetched.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Snapshot of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Products attempted so far, successful or not.
    pub completed: usize,
    /// Products the run will attempt.
    pub total: usize,
    /// Products whose fetch failed.
    pub failed: usize,
}

impl Progress {
    /// Whether every product has been attempted.
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

struct SessionInner {
    brand: String,
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    on_progress: Option<Arc<ProgressCallback>>,
    on_complete: Option<Arc<OutcomeCallback>>,
}

/// Shared state of a single fetch run.
#[derive(Clone)]
pub struct FetchSession {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for FetchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSession")
            .field("brand", &self.inner.brand)
            .field("progress", &self.progress())
            .field("on_progress", &self.inner.on_progress.is_some())
            .field("on_complete", &self.inner.on_complete.is_some())
            .finish()
    }
}

impl FetchSession {
    /// Create a session without callbacks.
    pub fn new(brand: impl Into<String>) -> Self {
        Self::with_callbacks(brand, None, None)
    }

    pub(crate) fn with_callbacks(
        brand: impl Into<String>,
        on_progress: Option<Arc<ProgressCallback>>,
        on_complete: Option<Arc<OutcomeCallback>>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                brand: brand.into(),
                total: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                on_progress,
                on_complete,
            }),
        }
    }

    /// Brand name this session fetches.
    pub fn brand(&self) -> &str {
        &self.inner.brand
    }

    /// Current counters.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.inner.completed.load(Ordering::Acquire),
            total: self.inner.total.load(Ordering::Acquire),
            failed: self.inner.failed.load(Ordering::Acquire),
        }
    }

    /// Start a run over `total` products and notify listeners.
    ///
    /// Counters from an earlier run on the same session are reset.
    pub(crate) fn begin(&self, total: usize) {
        self.inner.completed.store(0, Ordering::Release);
        self.inner.failed.store(0, Ordering::Release);
        self.inner.total.store(total, Ordering::Release);
        self.notify(self.progress());
    }

    /// Count one attempted product. Called exactly once per reference.
    pub(crate) fn record(&self, outcome: &Outcome) -> Progress {
        if !outcome.is_success() {
            self.inner.failed.fetch_add(1, Ordering::AcqRel);
        }
        let completed = self.inner.completed.fetch_add(1, Ordering::AcqRel) + 1;
        let progress = Progress {
            completed,
            total: self.inner.total.load(Ordering::Acquire),
            failed: self.inner.failed.load(Ordering::Acquire),
        };
        debug_assert!(progress.completed <= progress.total);

        if let Some(ref callback) = self.inner.on_complete {
            callback(outcome);
        }
        self.notify(progress);
        progress
    }

    fn notify(&self, progress: Progress) {
        if let Some(ref callback) = self.inner.on_progress {
            callback(progress);
        }
    }
}

/// A product whose detail could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Product that failed.
    pub reference: ProductRef,
    /// Last error, rendered.
    pub message: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Brand that was fetched.
    pub brand: String,
    /// Total reported by the list endpoint.
    pub reported_total: u64,
    /// References actually collected by the paginator.
    pub references: usize,
    /// Products attempted.
    pub completed: usize,
    /// Products fetched successfully.
    pub succeeded: usize,
    /// Products that failed, with the reason.
    pub failures: Vec<Failure>,
    /// What the sink did on finalize.
    pub finalized: Finalized,
}
