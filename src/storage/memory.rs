//! In-memory storage gateway.
//!
//! Objects are held in a `tokio::sync::RwLock<BTreeMap<...>>` so listings
//! come back in lexicographic key order, mirroring S3 ListObjectsV2.
//! Continuation tokens are the last key returned on the previous page.
//!
//! Signed URLs are deterministic strings rooted at `base_url`; they are not
//! served by anything and exist so local runs and tests can observe which
//! key, TTL, and operation a URL was minted for.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::{BTreeMap, BTreeSet};

use super::aws::KEY_ENCODE_SET;
use super::backend::{
    GatewayError, GatewayFuture, ListPage, ObjectDescriptor, StorageGateway, UrlMode,
};

/// A stored object body plus its declared content type.
#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
}

/// In-memory gateway.
pub struct MemoryGateway {
    /// key -> object
    objects: tokio::sync::RwLock<BTreeMap<String, MemoryObject>>,
    /// Root of every minted URL, without trailing slash.
    base_url: String,
    /// Maximum keys (objects + prefixes) per listing page.
    page_size: usize,
}

impl MemoryGateway {
    /// Create an empty gateway.  A `page_size` of zero is treated as one.
    pub fn new(base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            objects: tokio::sync::RwLock::new(BTreeMap::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        }
    }

    /// The URL `signed_url` produces for the given arguments.
    ///
    /// Upload URLs also name the content type they are bound to.
    pub fn url_for(&self, key: &str, ttl_seconds: u64, mode: &UrlMode) -> String {
        let mut url = format!(
            "{}/{}?X-Amz-Expires={}&X-Amz-Method={}",
            self.base_url,
            utf8_percent_encode(key, KEY_ENCODE_SET),
            ttl_seconds,
            mode.method()
        );
        if let UrlMode::Upload { content_type } = mode {
            url.push_str("&X-Amz-Content-Type=");
            url.extend(utf8_percent_encode(content_type, NON_ALPHANUMERIC));
        }
        url
    }

    /// Number of stored objects, placeholders included.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Declared content type of `key`, if present.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|obj| obj.content_type.clone())
    }
}

/// Collapse `key` into a common prefix when it contains `delimiter` past
/// `prefix`.
fn common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let rest = key.strip_prefix(prefix)?;
    let pos = rest.find(delimiter)?;
    Some(format!("{prefix}{}", &rest[..pos + delimiter.len()]))
}

impl StorageGateway for MemoryGateway {
    fn list_page<'a>(
        &'a self,
        prefix: Option<&'a str>,
        delimiter: Option<&'a str>,
        continuation: Option<&'a str>,
    ) -> GatewayFuture<'a, ListPage> {
        Box::pin(async move {
            let prefix = prefix.unwrap_or("");
            let objects = self.objects.read().await;

            let mut page = ListPage::default();
            let mut prefixes = BTreeSet::new();
            let mut taken = 0usize;
            let mut last_key: Option<&String> = None;

            let candidates = objects
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .filter(|(key, _)| continuation.map_or(true, |token| key.as_str() > token));

            for (key, obj) in candidates {
                if taken == self.page_size {
                    page.next_token = last_key.cloned();
                    break;
                }
                last_key = Some(key);
                match delimiter.and_then(|d| common_prefix(key, prefix, d)) {
                    Some(group) => {
                        if prefixes.insert(group.clone()) {
                            page.common_prefixes.push(group);
                            taken += 1;
                        }
                    }
                    None => {
                        page.objects
                            .push(ObjectDescriptor::new(key.clone(), obj.data.len() as u64));
                        taken += 1;
                    }
                }
            }

            Ok(page)
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, bool> {
        Box::pin(async move { Ok(self.objects.read().await.contains_key(key)) })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, Bytes> {
        Box::pin(async move {
            self.objects
                .read()
                .await
                .get(key)
                .map(|obj| obj.data.clone())
                .ok_or_else(|| GatewayError::NotFound {
                    key: key.to_string(),
                })
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.objects.write().await.insert(
                key.to_string(),
                MemoryObject {
                    data,
                    content_type: content_type.to_string(),
                },
            );
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.objects.write().await.remove(key);
            Ok(())
        })
    }

    fn copy<'a>(&'a self, source: &'a str, destination: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let mut objects = self.objects.write().await;
            let obj = objects
                .get(source)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound {
                    key: source.to_string(),
                })?;
            objects.insert(destination.to_string(), obj);
            Ok(())
        })
    }

    fn signed_url<'a>(
        &'a self,
        key: &'a str,
        ttl_seconds: u64,
        mode: UrlMode,
    ) -> GatewayFuture<'a, String> {
        Box::pin(async move { Ok(self.url_for(key, ttl_seconds, &mode)) })
    }
}
