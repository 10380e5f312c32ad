#![allow(dead_code)]

use async_trait::async_trait;
use product_fetcher::api::{CatalogApi, ListData, ListResponse, ProductDetail, ProductRef, SpuSummary};
use product_fetcher::credentials::Credentials;
use product_fetcher::retry::RetryPolicy;
use product_fetcher::sink::{Finalized, ResultSink};
use product_fetcher::{Error, FetcherBuilder, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Common test constants
pub const TEST_BRAND: &str = "Nike";
pub const TEST_TOKEN: &str = "test-token";
pub const LIST_PATH: &str = "/open/api/v1/distribute/product/querySpuList";
pub const DETAIL_PATH: &str = "/open/api/v1/distribute/product/queryBySpuId";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Retry policy with millisecond delays so tests stay fast
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts)
        .with_base_delay(Duration::from_millis(1))
        .with_rate_limit_floor(Duration::from_millis(5))
}

/// Access-token credentials used against the mock server
pub fn test_credentials() -> Credentials {
    Credentials::AccessToken(TEST_TOKEN.to_string())
}

/// Builder pointed at a mock server, with fast retries and no batch delay
pub fn create_mock_builder(server: &MockServer) -> FetcherBuilder {
    FetcherBuilder::new()
        .base_url(server.uri())
        .retry_policy(fast_retry(3))
        .batched(100, Duration::ZERO)
}

/// Reference key of the product with pagination id `id`
pub fn reference_for(id: u64) -> ProductRef {
    ProductRef::from(1000 + id)
}

/// Detail record the fake catalog and mock server return for `id`
pub fn detail_for(id: u64) -> Value {
    json!({ "dwSpuId": 1000 + id, "title": format!("Product {}", id), "skus": [] })
}

// === In-memory catalog ===

/// A [`CatalogApi`] backed by a product list, with failure injection and
/// in-flight accounting.
pub struct FakeCatalog {
    ids: Vec<u64>,
    reported_total: u64,
    detail_latency: Duration,
    failing: HashSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    list_calls: Mutex<Vec<(u64, u32)>>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl FakeCatalog {
    /// A catalog with products `1..=count`, reporting `count` as total
    pub fn with_products(count: u64) -> Self {
        Self::with_ids((1..=count).collect())
    }

    /// A catalog with the given pagination ids
    pub fn with_ids(ids: Vec<u64>) -> Self {
        let reported_total = ids.len() as u64;
        Self {
            ids,
            reported_total,
            detail_latency: Duration::from_millis(2),
            failing: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            list_calls: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Report a total different from the real number of products
    pub fn reporting_total(mut self, total: u64) -> Self {
        self.reported_total = total;
        self
    }

    /// Make the detail fetch of `id` always answer 429
    pub fn failing(mut self, id: u64) -> Self {
        self.failing.insert(reference_for(id).to_string());
        self
    }

    /// Time each detail fetch takes
    pub fn detail_latency(mut self, latency: Duration) -> Self {
        self.detail_latency = latency;
        self
    }

    /// Highest number of detail fetches observed at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// `(startId, pageSize)` of every list call, in order
    pub fn list_calls(&self) -> Vec<(u64, u32)> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Detail attempts made for `reference`
    pub fn attempts_for(&self, reference: &ProductRef) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(&reference.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Detail attempts made across all products
    pub fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_page(&self, _brand: &str, start_id: u64, page_size: u32) -> Result<ListResponse> {
        self.list_calls.lock().unwrap().push((start_id, page_size));
        let spu_list = self
            .ids
            .iter()
            .filter(|id| **id > start_id)
            .take(page_size as usize)
            .map(|id| SpuSummary {
                id: *id,
                dw_spu_id: reference_for(*id),
            })
            .collect();
        Ok(ListResponse {
            data: Some(ListData {
                total: self.reported_total,
                spu_list,
            }),
        })
    }

    async fn fetch_detail(&self, reference: &ProductRef) -> Result<ProductDetail> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(reference.to_string())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.detail_latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&reference.to_string()) {
            return Err(Error::RateLimited);
        }
        let id = reference
            .as_value()
            .as_u64()
            .map(|r| r - 1000)
            .unwrap_or_default();
        Ok(detail_for(id))
    }
}

// === Sinks ===

/// Sink that remembers every `record` call
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<Vec<ProductDetail>>,
    pub finalized: usize,
}

impl RecordingSink {
    /// Sizes of the recorded groups, in order
    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.iter().map(Vec::len).collect()
    }

    /// All records, flattened
    pub fn records(&self) -> Vec<ProductDetail> {
        self.calls.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn record(&mut self, records: Vec<ProductDetail>) -> Result<()> {
        self.calls.push(records);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<Finalized> {
        self.finalized += 1;
        Ok(Finalized::NothingToSave)
    }
}

// === Mock server helpers ===

/// Body of a list response
pub fn list_body(total: u64, ids: &[u64]) -> Value {
    let spu_list: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "dwSpuId": 1000 + id, "brandName": TEST_BRAND }))
        .collect();
    json!({ "code": 200, "data": { "total": total, "spuList": spu_list } })
}

/// Serve one list page for requests starting at `start_id`
pub async fn mount_list_page(server: &MockServer, start_id: u64, total: u64, ids: &[u64]) {
    Mock::given(method("POST"))
        .and(path(LIST_PATH))
        .and(header("access-token", TEST_TOKEN))
        .and(body_partial_json(json!({ "startId": start_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(total, ids)))
        .expect(1)
        .mount(server)
        .await;
}

/// Serve the detail record of `id`
pub async fn mount_detail(server: &MockServer, id: u64) {
    Mock::given(method("POST"))
        .and(path(DETAIL_PATH))
        .and(header("access-token", TEST_TOKEN))
        .and(body_partial_json(json!({ "dwSpuId": 1000 + id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_for(id)))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer 429 to every detail request for `id`, expecting `attempts` of them
pub async fn mount_rate_limited_detail(server: &MockServer, id: u64, attempts: u64) {
    Mock::given(method("POST"))
        .and(path(DETAIL_PATH))
        .and(body_partial_json(json!({ "dwSpuId": 1000 + id })))
        .respond_with(ResponseTemplate::new(429))
        .expect(attempts)
        .mount(server)
        .await;
}

// === Assertion Helpers ===

/// Parse a batch file: one JSON array per line
pub fn read_batch_file(path: &std::path::Path) -> Vec<Vec<Value>> {
    let text = std::fs::read_to_string(path).expect("Failed to read batch file");
    text.lines()
        .map(|line| serde_json::from_str(line).expect("Each line should be a JSON array"))
        .collect()
}

/// Titles of the given detail records, sorted
pub fn sorted_titles(records: &[Value]) -> Vec<String> {
    let mut titles: Vec<String> = records
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default().to_string())
        .collect();
    titles.sort();
    titles
}
