//! HTTP implementation of [`CatalogApi`].

use super::types::{BrandFilter, DetailRequest, ListRequest, ListResponse, ProductDetail, ProductRef};
use super::CatalogApi;
use crate::error::{Error, Result};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://distopen.poizon.com";
/// Default path of the product list endpoint.
pub const DEFAULT_LIST_PATH: &str = "/open/api/v1/distribute/product/querySpuList";
/// Default path of the product detail endpoint.
pub const DEFAULT_DETAIL_PATH: &str = "/open/api/v1/distribute/product/queryBySpuId";

// Error bodies are kept for diagnostics only.
const MAX_ERROR_BODY: usize = 512;

/// Where the catalog endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// API root. A path prefix such as `https://gw.example.com/proxy` is kept.
    pub base_url: String,
    /// Path of the list endpoint, relative to `base_url`.
    pub list_path: String,
    /// Path of the detail endpoint, relative to `base_url`.
    pub detail_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            list_path: DEFAULT_LIST_PATH.into(),
            detail_path: DEFAULT_DETAIL_PATH.into(),
        }
    }
}

impl Endpoints {
    fn join(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.base_url).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", self.base_url, e))
        })?;
        // Url::join replaces the last segment unless the base ends with a slash.
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        base.join(path.trim_start_matches('/')).map_err(|e| {
            Error::InvalidUrl(format!(
                "The path \"{}\" cannot be joined to \"{}\": {}",
                path, self.base_url, e
            ))
        })
    }
}

/// Catalog client talking to the real API.
///
/// Each method performs a single attempt; retrying is the caller's job.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: ClientWithMiddleware,
    list_url: Url,
    detail_url: Url,
    brand_filter: BrandFilter,
}

impl CatalogClient {
    /// Create a client for `endpoints` on top of a configured HTTP client.
    pub fn new(
        client: ClientWithMiddleware,
        endpoints: &Endpoints,
        brand_filter: BrandFilter,
    ) -> Result<Self> {
        Ok(Self {
            client,
            list_url: endpoints.join(&endpoints.list_path)?,
            detail_url: endpoints.join(&endpoints.detail_path)?,
            brand_filter,
        })
    }

    /// URL of the list endpoint.
    pub fn list_url(&self) -> &Url {
        &self.list_url
    }

    /// URL of the detail endpoint.
    pub fn detail_url(&self) -> &Url {
        &self.detail_url
    }

    async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.client.post(url.clone()).json(body).send().await?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let mut body = res.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(Error::HttpStatus { status, body });
        }

        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_page(&self, brand: &str, start_id: u64, page_size: u32) -> Result<ListResponse> {
        let request = ListRequest {
            start_id,
            page_size,
            dist_brand_name: self.brand_filter.to_value(brand),
        };
        debug!("Listing products: startId={} pageSize={}", start_id, page_size);
        self.post_json(&self.list_url, &request).await
    }

    async fn fetch_detail(&self, reference: &ProductRef) -> Result<ProductDetail> {
        debug!("Fetching detail for product {}", reference);
        self.post_json(&self.detail_url, &DetailRequest { dw_spu_id: reference })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{create_http_client, HttpClientConfig};

    #[test]
    fn test_default_endpoints_resolve() {
        let client = create_http_client(HttpClientConfig::default()).unwrap();
        let catalog = CatalogClient::new(client, &Endpoints::default(), BrandFilter::Split).unwrap();
        assert_eq!(
            catalog.list_url().as_str(),
            "https://distopen.poizon.com/open/api/v1/distribute/product/querySpuList"
        );
        assert_eq!(
            catalog.detail_url().as_str(),
            "https://distopen.poizon.com/open/api/v1/distribute/product/queryBySpuId"
        );
    }

    #[test]
    fn test_base_url_path_prefix_is_kept() {
        let client = create_http_client(HttpClientConfig::default()).unwrap();
        for base_url in ["https://gw.example.com/proxy", "https://gw.example.com/proxy/"] {
            let endpoints = Endpoints {
                base_url: base_url.into(),
                ..Endpoints::default()
            };
            let catalog = CatalogClient::new(client.clone(), &endpoints, BrandFilter::Split).unwrap();
            assert_eq!(
                catalog.list_url().as_str(),
                "https://gw.example.com/proxy/open/api/v1/distribute/product/querySpuList"
            );
            assert_eq!(
                catalog.detail_url().as_str(),
                "https://gw.example.com/proxy/open/api/v1/distribute/product/queryBySpuId"
            );
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let client = create_http_client(HttpClientConfig::default()).unwrap();
        let endpoints = Endpoints {
            base_url: "not a url".into(),
            ..Endpoints::default()
        };
        let err = CatalogClient::new(client, &endpoints, BrandFilter::Split).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
