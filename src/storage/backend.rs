//! Abstract storage gateway trait.
//!
//! Every backing store must implement [`StorageGateway`].  The trait is a
//! thin capability surface over a flat object namespace: paged listing,
//! existence probes, whole-object reads and writes, server-side copy, and
//! time-bounded signed URLs.  It carries no catalog or management logic.

use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by every gateway operation.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send + 'a>>;

/// One stored object as reported by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Full object key within the bucket.
    pub key: String,
    /// Object size in bytes.  Zero-byte objects are folder placeholders.
    pub size: u64,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// A single page of a delimiter-aware listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects directly matched by the request.
    pub objects: Vec<ObjectDescriptor>,
    /// Groupings collapsed by the delimiter (each ends with the delimiter).
    pub common_prefixes: Vec<String>,
    /// Token for the next page; `None` or empty when the listing is complete.
    pub next_token: Option<String>,
}

/// Operation a signed URL grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlMode {
    /// `PUT` of a new object body.  The URL only accepts uploads sent with
    /// this `Content-Type`.
    Upload { content_type: String },
    /// `GET` of an existing object.
    Download,
}

impl UrlMode {
    pub fn upload(content_type: impl Into<String>) -> Self {
        UrlMode::Upload {
            content_type: content_type.into(),
        }
    }

    /// HTTP method the URL is scoped to.
    pub fn method(&self) -> &'static str {
        match self {
            UrlMode::Upload { .. } => "PUT",
            UrlMode::Download => "GET",
        }
    }
}

impl fmt::Display for UrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Errors surfaced by a gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend reported that the key does not exist.
    #[error("object `{key}` not found")]
    NotFound { key: String },

    /// A signed URL could not be produced.
    #[error("could not sign {mode} url for `{key}`: {message}")]
    Presign {
        key: String,
        mode: UrlMode,
        message: String,
    },

    /// A paginated listing did not terminate within the page cap.
    #[error("listing did not terminate after {pages} pages")]
    PaginationExceeded { pages: usize },

    /// Any other backend failure (network, permissions, throttling).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Async object storage capability.
pub trait StorageGateway: Send + Sync + 'static {
    /// Fetch one page of keys under `prefix`.
    ///
    /// With a `delimiter`, keys containing the delimiter after the prefix
    /// are collapsed into `common_prefixes` instead of being returned.
    fn list_page<'a>(
        &'a self,
        prefix: Option<&'a str>,
        delimiter: Option<&'a str>,
        continuation: Option<&'a str>,
    ) -> GatewayFuture<'a, ListPage>;

    /// Metadata-only existence probe.  `Ok(false)` only for a not-found answer.
    fn exists<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, bool>;

    /// Read the full object body.
    fn fetch<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, Bytes>;

    /// Write `data` to `key`, replacing any existing object.
    fn put<'a>(&'a self, key: &'a str, data: Bytes, content_type: &'a str)
        -> GatewayFuture<'a, ()>;

    /// Delete `key`.  Deleting a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, ()>;

    /// Server-side copy of `source` to `destination`.
    fn copy<'a>(&'a self, source: &'a str, destination: &'a str) -> GatewayFuture<'a, ()>;

    /// Mint a URL granting `mode` on `key` for exactly `ttl_seconds`.
    fn signed_url<'a>(
        &'a self,
        key: &'a str,
        ttl_seconds: u64,
        mode: UrlMode,
    ) -> GatewayFuture<'a, String>;
}
