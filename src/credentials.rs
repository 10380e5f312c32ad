//! Credential loading.
//!
//! Credentials come from named environment variables, optionally seeded from a
//! `.env` file in the working directory. A [`Fetcher`](crate::Fetcher) cannot
//! be built without [`Credentials`], so a missing value stops a run before any
//! unauthenticated request is sent.
//!
//! # Examples
//!
//! ```rust
//! use product_fetcher::credentials::{CredentialKind, Credentials};
//!
//! let creds = Credentials::from_lookup(CredentialKind::AccessToken, |name| match name {
//!     "ACCESS_TOKEN" => Some("secret".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//! assert_eq!(creds.kind(), CredentialKind::AccessToken);
//! ```

use crate::error::{Error, Result};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use tracing::debug;

/// Environment variable holding the access token.
pub const ACCESS_TOKEN_VAR: &str = "ACCESS_TOKEN";
/// Environment variable holding the application key.
pub const APP_KEY_VAR: &str = "APP_KEY";
/// Environment variable holding the application secret.
pub const APP_SECRET_VAR: &str = "APP_SECRET";

/// Which credential family an endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialKind {
    /// A single static access token.
    #[default]
    AccessToken,
    /// An application key/secret pair.
    AppKeyPair,
}

impl CredentialKind {
    /// Names of the variables this kind requires.
    pub fn required_vars(self) -> &'static [&'static str] {
        match self {
            CredentialKind::AccessToken => &[ACCESS_TOKEN_VAR],
            CredentialKind::AppKeyPair => &[APP_KEY_VAR, APP_SECRET_VAR],
        }
    }
}

/// Loaded API credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `access-token` header.
    AccessToken(String),
    /// Sent as the `app-key` and `app-secret` headers.
    AppKeyPair { key: String, secret: String },
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("Credentials::AccessToken(***)"),
            Credentials::AppKeyPair { .. } => f.write_str("Credentials::AppKeyPair(***)"),
        }
    }
}

impl Credentials {
    /// Load credentials from the process environment.
    ///
    /// A `.env` file in the current directory is read first if present; its
    /// values never override variables already set in the environment.
    pub fn load(kind: CredentialKind) -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
        Self::from_lookup(kind, |name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    ///
    /// Blank values count as missing. All missing names are reported at once.
    pub fn from_lookup<F>(kind: CredentialKind, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = kind
            .required_vars()
            .iter()
            .filter(|name| get(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::CredentialsMissing(missing));
        }

        // Presence was checked above.
        let value = |name: &str| get(name).unwrap_or_default();
        Ok(match kind {
            CredentialKind::AccessToken => Credentials::AccessToken(value(ACCESS_TOKEN_VAR)),
            CredentialKind::AppKeyPair => Credentials::AppKeyPair {
                key: value(APP_KEY_VAR),
                secret: value(APP_SECRET_VAR),
            },
        })
    }

    /// The family these credentials belong to.
    pub fn kind(&self) -> CredentialKind {
        match self {
            Credentials::AccessToken(_) => CredentialKind::AccessToken,
            Credentials::AppKeyPair { .. } => CredentialKind::AppKeyPair,
        }
    }

    /// Render the credentials as request headers.
    pub fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut insert = |name: &'static str, value: &str| -> Result<()> {
            let mut value = HeaderValue::from_str(value).map_err(|_| {
                Error::Internal(format!("credential for header `{}` is not a valid header value", name))
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(name), value);
            Ok(())
        };

        match self {
            Credentials::AccessToken(token) => insert("access-token", token)?,
            Credentials::AppKeyPair { key, secret } => {
                insert("app-key", key)?;
                insert("app-secret", secret)?;
            }
        }
        Ok(headers)
    }
}
