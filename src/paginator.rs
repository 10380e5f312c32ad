//! Cursor-based walk of the product list.
//!
//! The first call starts at cursor 0. It tells us the reported total and is
//! also the first page. Each following call starts after the `id` of the last
//! product seen. This is the pagination id, not the `dwSpuId` reference key.
//! The walk stops on the first of:
//!
//! - the reported total is 0, or the response carries no `data`;
//! - a page comes back empty (the reported total may exceed reality);
//! - the collected references reach the reported total;
//! - the cursor fails to advance, or [`MAX_PAGES`] pages were read.
//!
//! Any call that exhausts its retries aborts the walk.

use crate::api::{CatalogApi, ProductRef};
use crate::error::Result;
use crate::retry::RetryPolicy;

use tracing::{debug, warn};

/// Default number of products requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Hard stop for a misbehaving upstream.
pub const MAX_PAGES: usize = 10_000;

/// Result of walking the product list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    /// Reference keys in the order the API returned them.
    pub references: Vec<ProductRef>,
    /// Total reported by the first page.
    pub total: u64,
    /// Number of list calls that succeeded.
    pub pages: usize,
}

/// Collect every product reference for `brand`.
pub async fn paginate(
    api: &dyn CatalogApi,
    retry: &RetryPolicy,
    brand: &str,
    page_size: u32,
) -> Result<Pagination> {
    let page_size = page_size.max(1);
    let mut pagination = Pagination::default();
    let mut cursor = 0u64;

    loop {
        if pagination.pages >= MAX_PAGES {
            warn!("Stopped listing after {} pages", MAX_PAGES);
            break;
        }

        let target = format!("product list page for {:?} (startId={})", brand, cursor);
        let response = retry
            .run(&target, || api.list_page(brand, cursor, page_size))
            .await?;
        pagination.pages += 1;

        let Some(data) = response.data else {
            debug!("List response without data at startId={}, stopping", cursor);
            break;
        };

        if pagination.pages == 1 {
            pagination.total = data.total;
            debug!("Brand {:?} reports {} product(s)", brand, data.total);
            if data.total == 0 {
                break;
            }
        }

        let Some(last_id) = data.spu_list.last().map(|p| p.id) else {
            debug!("Empty page at startId={}, stopping", cursor);
            break;
        };

        pagination
            .references
            .extend(data.spu_list.into_iter().map(|p| p.dw_spu_id));

        if pagination.references.len() as u64 >= pagination.total {
            break;
        }

        if last_id <= cursor {
            warn!(
                "List cursor did not advance (startId={}, last id={}), stopping with {} of {} product(s)",
                cursor,
                last_id,
                pagination.references.len(),
                pagination.total
            );
            break;
        }
        cursor = last_id;
    }

    Ok(pagination)
}
