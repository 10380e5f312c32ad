//! HTTP module containing HTTP client functionality.
//!
//! This module provides HTTP client setup: request tracing, default headers,
//! timeouts and proxy support. The catalog endpoints themselves live in
//! [`crate::api`].
//!
//! - [`client`] - HTTP client creation and middleware configuration

pub mod client;

pub use client::{create_http_client, HttpClientConfig, DEFAULT_TIMEOUT};
