//! Catalog API module.
//!
//! This module describes the two upstream endpoints the fetcher talks to:
//!
//! - the product list, paginated with a `startId` cursor and filtered by brand;
//! - the product detail, keyed by the product reference (`dwSpuId`).
//!
//! [`CatalogApi`] is the seam between the pipeline and the network. The
//! pipeline only ever sees this trait, so tests can plug in an in-memory
//! catalog. [`CatalogClient`] is the HTTP implementation.

pub mod client;
pub mod types;

pub use client::{CatalogClient, Endpoints, DEFAULT_BASE_URL, DEFAULT_DETAIL_PATH, DEFAULT_LIST_PATH};
pub use types::{
    BrandFilter, DetailRequest, ListData, ListRequest, ListResponse, ProductDetail, ProductRef,
    SpuSummary,
};

use crate::error::Result;
use async_trait::async_trait;

/// Single-attempt access to the catalog endpoints.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one page of the product list for `brand`, starting after `start_id`.
    async fn list_page(&self, brand: &str, start_id: u64, page_size: u32) -> Result<ListResponse>;

    /// Fetch the detail record of one product.
    async fn fetch_detail(&self, reference: &ProductRef) -> Result<ProductDetail>;
}
