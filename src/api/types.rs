//! Wire types of the catalog endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque detail record, stored exactly as the detail endpoint returned it.
pub type ProductDetail = Value;

/// Product reference key (`dwSpuId`), used to request a detail record.
///
/// The upstream API may send it as a number or a string; it is kept as the
/// original JSON scalar so it goes back to the detail endpoint unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRef(Value);

impl ProductRef {
    /// Wrap a raw JSON value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// The raw JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<u64> for ProductRef {
    fn from(value: u64) -> Self {
        Self(Value::from(value))
    }
}

impl From<&str> for ProductRef {
    fn from(value: &str) -> Self {
        Self(Value::from(value))
    }
}

impl From<String> for ProductRef {
    fn from(value: String) -> Self {
        Self(Value::from(value))
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// One entry of a product list page.
///
/// Only the two keys the fetcher needs are decoded; the rest is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpuSummary {
    /// Pagination identifier, used as the next `startId`.
    pub id: u64,
    /// Reference key used by the detail endpoint.
    pub dw_spu_id: ProductRef,
}

/// Payload of a product list response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData {
    /// Number of products the API claims to hold for the filter.
    #[serde(default)]
    pub total: u64,
    /// Products of this page.
    #[serde(default)]
    pub spu_list: Vec<SpuSummary>,
}

/// Envelope of a product list response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListResponse {
    /// Page payload; absent when the API has nothing to return.
    #[serde(default)]
    pub data: Option<ListData>,
}

/// Body of a product list request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Pagination cursor: the `id` of the last product seen, 0 for the first page.
    pub start_id: u64,
    /// Products per page.
    pub page_size: u32,
    /// Brand filter, a string or a list of strings.
    pub dist_brand_name: Value,
}

/// Body of a detail request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest<'a> {
    /// Product to fetch.
    pub dw_spu_id: &'a ProductRef,
}

/// How the brand name is sent to the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrandFilter {
    /// Send the brand name as a single string.
    Literal,
    /// Split on commas, trim each part, drop empty parts and send the list.
    #[default]
    Split,
}

impl BrandFilter {
    /// Render `brand` as the `distBrandName` value.
    pub fn to_value(self, brand: &str) -> Value {
        match self {
            BrandFilter::Literal => Value::from(brand.trim()),
            BrandFilter::Split => Value::from(
                brand
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>(),
            ),
        }
    }
}
