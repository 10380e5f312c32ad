//! Concurrency strategies for the detail phase.
//!
//! Every strategy attempts each reference exactly once and counts it in the
//! session whether it succeeded or not. A failed product never aborts the run.
//! None of them lets more than [`RATE_LIMIT_CAP`] detail requests be in flight.
//!
//! - [`Strategy::Serial`]: one request at a time.
//! - [`Strategy::WorkerPool`]: `concurrency` spawned workers drain a shared
//!   queue and report back over a channel. The coordinator is the only
//!   consumer of that channel, so sink writes are serialised.
//! - [`Strategy::Batched`]: references are split into batches. Within a batch
//!   all fetches are multiplexed on the coordinator task under a semaphore.
//!   Each finished batch is handed to the sink in one call, then the
//!   coordinator sleeps `batch_delay` before starting the next one.

use crate::api::{CatalogApi, ProductDetail, ProductRef};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::session::{Failure, FetchSession, Outcome};
use crate::sink::ResultSink;

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Maximum number of concurrent requests the upstream API tolerates.
pub const RATE_LIMIT_CAP: usize = 3;
/// Default number of references per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default pause between two batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// How detail fetches are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch one product at a time.
    Serial,
    /// A fixed pool of workers, one per allowed concurrent request.
    WorkerPool,
    /// Sequential batches, each fetched under a semaphore.
    Batched {
        /// References per batch; values below 1 act as 1.
        batch_size: usize,
        /// Pause after each batch except the last.
        batch_delay: Duration,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::batched()
    }
}

impl Strategy {
    /// Batched strategy with the default batch size and delay.
    pub fn batched() -> Self {
        Strategy::Batched {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Short name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Serial => "serial",
            Strategy::WorkerPool => "pool",
            Strategy::Batched { .. } => "batched",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Batched {
                batch_size,
                batch_delay,
            } => write!(f, "batched (size {}, delay {:?})", batch_size, batch_delay),
            other => f.write_str(other.name()),
        }
    }
}

/// Fetch one detail record, retrying per `retry`.
async fn fetch_one(
    api: &dyn CatalogApi,
    retry: &RetryPolicy,
    reference: ProductRef,
) -> (ProductRef, Result<ProductDetail>) {
    let target = format!("product {}", reference);
    let result = retry.run(&target, || api.fetch_detail(&reference)).await;
    (reference, result)
}

fn next_reference(queue: &Mutex<VecDeque<ProductRef>>) -> Option<ProductRef> {
    match queue.lock() {
        Ok(mut queue) => queue.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

/// Drives the detail phase of one run.
pub(crate) struct Coordinator<'a> {
    api: Arc<dyn CatalogApi>,
    retry: RetryPolicy,
    concurrency: usize,
    session: &'a FetchSession,
    failures: Vec<Failure>,
}

impl<'a> Coordinator<'a> {
    pub(crate) fn new(
        api: Arc<dyn CatalogApi>,
        retry: RetryPolicy,
        concurrency: usize,
        session: &'a FetchSession,
    ) -> Self {
        Self {
            api,
            retry,
            concurrency: concurrency.clamp(1, RATE_LIMIT_CAP),
            session,
            failures: Vec::new(),
        }
    }

    /// Fetch every reference and route the results; returns the failures.
    pub(crate) async fn run<S>(
        mut self,
        strategy: Strategy,
        references: Vec<ProductRef>,
        sink: &mut S,
    ) -> Result<Vec<Failure>>
    where
        S: ResultSink + ?Sized,
    {
        info!(
            "Fetching {} detail record(s) with strategy {} (concurrency {})",
            references.len(),
            strategy,
            self.concurrency
        );
        match strategy {
            Strategy::Serial => self.run_serial(references, sink).await?,
            Strategy::WorkerPool => self.run_worker_pool(references, sink).await?,
            Strategy::Batched {
                batch_size,
                batch_delay,
            } => {
                self.run_batched(references, batch_size, batch_delay, sink)
                    .await?
            }
        }
        Ok(self.failures)
    }

    /// Count the outcome and hand back the record on success.
    fn settle(
        &mut self,
        reference: ProductRef,
        result: Result<ProductDetail>,
    ) -> Option<ProductDetail> {
        match result {
            Ok(detail) => {
                self.session.record(&Outcome::new(reference));
                Some(detail)
            }
            Err(e) => {
                warn!("Giving up on product {}: {}", reference, e);
                let outcome = Outcome::new(reference.clone()).fail(&e);
                self.session.record(&outcome);
                self.failures.push(Failure {
                    reference,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    async fn run_serial<S>(&mut self, references: Vec<ProductRef>, sink: &mut S) -> Result<()>
    where
        S: ResultSink + ?Sized,
    {
        for reference in references {
            let (reference, result) = fetch_one(self.api.as_ref(), &self.retry, reference).await;
            if let Some(detail) = self.settle(reference, result) {
                sink.record(vec![detail]).await?;
            }
        }
        Ok(())
    }

    async fn run_worker_pool<S>(&mut self, references: Vec<ProductRef>, sink: &mut S) -> Result<()>
    where
        S: ResultSink + ?Sized,
    {
        let workers = self.concurrency.min(references.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(references)));
        let (tx, mut rx) = mpsc::channel(self.concurrency);

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let queue = queue.clone();
            let api = self.api.clone();
            let retry = self.retry;
            let tx = tx.clone();
            pool.spawn(async move {
                while let Some(reference) = next_reference(&queue) {
                    let result = fetch_one(api.as_ref(), &retry, reference).await;
                    if tx.send(result).await.is_err() {
                        break;
                    }
                }
                debug!("Worker {} drained the queue", worker);
            });
        }
        // Workers hold the remaining senders; the loop below ends when they all finish.
        drop(tx);

        while let Some((reference, result)) = rx.recv().await {
            if let Some(detail) = self.settle(reference, result) {
                sink.record(vec![detail]).await?;
            }
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                return Err(Error::Internal(format!("detail worker failed: {}", e)));
            }
        }
        Ok(())
    }

    async fn run_batched<S>(
        &mut self,
        references: Vec<ProductRef>,
        batch_size: usize,
        batch_delay: Duration,
        sink: &mut S,
    ) -> Result<()>
    where
        S: ResultSink + ?Sized,
    {
        let batch_size = batch_size.max(1);
        let batch_count = references.len().div_ceil(batch_size);
        let semaphore = Semaphore::new(self.concurrency);
        let api = self.api.clone();
        let retry = self.retry;

        for (index, batch) in references.chunks(batch_size).enumerate() {
            debug!(
                "Starting batch {}/{} ({} reference(s))",
                index + 1,
                batch_count,
                batch.len()
            );

            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .cloned()
                .map(|reference| {
                    let semaphore = &semaphore;
                    let api = api.as_ref();
                    let retry = &retry;
                    async move {
                        // The semaphore is never closed.
                        let _permit = semaphore.acquire().await;
                        fetch_one(api, retry, reference).await
                    }
                })
                .collect();

            let mut records = Vec::with_capacity(batch.len());
            while let Some((reference, result)) = in_flight.next().await {
                if let Some(detail) = self.settle(reference, result) {
                    records.push(detail);
                }
            }

            info!(
                "Batch {}/{} done: {} of {} record(s) fetched",
                index + 1,
                batch_count,
                records.len(),
                batch.len()
            );
            sink.record(records).await?;

            if index + 1 < batch_count && !batch_delay.is_zero() {
                tokio::time::sleep(batch_delay).await;
            }
        }
        Ok(())
    }
}
