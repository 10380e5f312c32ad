//! Result sinks.
//!
//! A sink receives the fetched detail records and persists them. Two sinks
//! are provided:
//!
//! - [`MemorySink`] keeps everything in memory and writes one pretty-printed
//!   JSON array at [`ResultSink::finalize`];
//! - [`BatchFileSink`] appends every recorded batch to a file as soon as it
//!   arrives, one compact JSON array per line.
//!
//! The batch file is a sequence of JSON arrays, one per line, and not a single
//! JSON document. Each line parses on its own; readers must split on newlines.
//!
//! The pipeline is the only writer of a sink, so appends never interleave.

use crate::api::ProductDetail;
use crate::error::Result;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, info};

/// What [`ResultSink::finalize`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// Records are persisted at this path.
    Saved(PathBuf),
    /// Already persisted at this path, nothing new since.
    Unchanged(PathBuf),
    /// No record was ever received; nothing was written.
    NothingToSave,
}

impl Finalized {
    /// Path of the persisted data, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Finalized::Saved(p) | Finalized::Unchanged(p) => Some(p),
            Finalized::NothingToSave => None,
        }
    }
}

/// Destination for fetched detail records.
#[async_trait]
pub trait ResultSink: Send {
    /// Receive a group of records (a single record or a whole batch).
    async fn record(&mut self, records: Vec<ProductDetail>) -> Result<()>;

    /// Persist whatever is pending and report where the data lives.
    async fn finalize(&mut self) -> Result<Finalized>;
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        debug!("Creating destination directory {:?}", dir);
        fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Accumulates records, then writes them once as a JSON array.
#[derive(Debug, Clone)]
pub struct MemorySink {
    destination: PathBuf,
    records: Vec<ProductDetail>,
    persisted: Option<usize>,
}

impl MemorySink {
    /// Create a sink that will write to `destination`.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            records: Vec::new(),
            persisted: None,
        }
    }

    /// Where the records are written.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Records received so far.
    pub fn records(&self) -> &[ProductDetail] {
        &self.records
    }

    /// Consume the sink and return its records.
    pub fn into_records(self) -> Vec<ProductDetail> {
        self.records
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record(&mut self, records: Vec<ProductDetail>) -> Result<()> {
        self.records.extend(records);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<Finalized> {
        if self.records.is_empty() {
            info!("No data to save");
            return Ok(Finalized::NothingToSave);
        }
        if self.persisted == Some(self.records.len()) {
            return Ok(Finalized::Unchanged(self.destination.clone()));
        }

        ensure_parent(&self.destination).await?;
        let json = serde_json::to_vec_pretty(&self.records)?;
        fs::write(&self.destination, json).await?;
        self.persisted = Some(self.records.len());

        info!(
            "Saved {} record(s) to {:?}",
            self.records.len(),
            self.destination
        );
        Ok(Finalized::Saved(self.destination.clone()))
    }
}

/// Appends each batch to a file as one line of JSON.
#[derive(Debug, Clone)]
pub struct BatchFileSink {
    path: PathBuf,
    batches: usize,
    records: usize,
}

impl BatchFileSink {
    /// Create a sink appending to `path`. Existing content is kept.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batches: 0,
            records: 0,
        }
    }

    /// The file batches are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Batches written by this sink.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Records written by this sink.
    pub fn records(&self) -> usize {
        self.records
    }
}

#[async_trait]
impl ResultSink for BatchFileSink {
    async fn record(&mut self, records: Vec<ProductDetail>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut line = serde_json::to_vec(&records)?;
        line.push(b'\n');

        ensure_parent(&self.path).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        self.batches += 1;
        self.records += records.len();
        debug!(
            "Appended batch of {} record(s) to {:?}",
            records.len(),
            self.path
        );
        Ok(())
    }

    async fn finalize(&mut self) -> Result<Finalized> {
        if fs::try_exists(&self.path).await? {
            Ok(Finalized::Saved(self.path.clone()))
        } else {
            info!("No data to save");
            Ok(Finalized::NothingToSave)
        }
    }
}
