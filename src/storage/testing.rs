//! Test doubles for [`StorageGateway`].

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::backend::{
    GatewayError, GatewayFuture, ListPage, ObjectDescriptor, StorageGateway, UrlMode,
};
use super::memory::MemoryGateway;

/// A backend whose listing always claims there is another page.
pub struct EndlessListing;

impl StorageGateway for EndlessListing {
    fn list_page<'a>(
        &'a self,
        _prefix: Option<&'a str>,
        _delimiter: Option<&'a str>,
        _continuation: Option<&'a str>,
    ) -> GatewayFuture<'a, ListPage> {
        Box::pin(async move {
            Ok(ListPage {
                objects: vec![ObjectDescriptor::new("loop/a.mp3", 1)],
                common_prefixes: vec!["loop/".to_string()],
                next_token: Some("again".to_string()),
            })
        })
    }

    fn exists<'a>(&'a self, _key: &'a str) -> GatewayFuture<'a, bool> {
        Box::pin(async move { Ok(false) })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, Bytes> {
        Box::pin(async move {
            Err(GatewayError::NotFound {
                key: key.to_string(),
            })
        })
    }

    fn put<'a>(&'a self, _key: &'a str, _data: Bytes, _ct: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move { Ok(()) })
    }

    fn delete<'a>(&'a self, _key: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move { Ok(()) })
    }

    fn copy<'a>(&'a self, _source: &'a str, _destination: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move { Ok(()) })
    }

    fn signed_url<'a>(
        &'a self,
        key: &'a str,
        _ttl_seconds: u64,
        _mode: UrlMode,
    ) -> GatewayFuture<'a, String> {
        Box::pin(async move { Ok(key.to_string()) })
    }
}

/// Wraps a [`MemoryGateway`], records every call, and injects failures.
pub struct RecordingGateway {
    pub inner: MemoryGateway,
    calls: Mutex<Vec<String>>,
    fail_delete: AtomicBool,
    fail_list_prefix: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            inner: MemoryGateway::new("http://objects.test", 1000),
            calls: Mutex::new(Vec::new()),
            fail_delete: AtomicBool::new(false),
            fail_list_prefix: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Seed an object without recording the call.
    pub async fn seed(&self, key: &str, data: &'static [u8]) {
        self.inner
            .put(key, Bytes::from_static(data), "application/octet-stream")
            .await
            .unwrap();
    }

    /// Make every subsequent `delete` fail with a backend error.
    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Make object listings under `prefix` fail with a backend error.
    pub fn fail_listing_of(&self, prefix: &str) {
        *self.fail_list_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    /// Names of the recorded calls, in order (`op:key`).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `fetch` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, op: &str, key: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{key}"));
    }

    /// True when any recorded call starts with `op:`.
    pub fn called(&self, op: &str) -> bool {
        let tag = format!("{op}:");
        self.calls().iter().any(|c| c.starts_with(&tag))
    }
}

impl StorageGateway for RecordingGateway {
    fn list_page<'a>(
        &'a self,
        prefix: Option<&'a str>,
        delimiter: Option<&'a str>,
        continuation: Option<&'a str>,
    ) -> GatewayFuture<'a, ListPage> {
        Box::pin(async move {
            self.record("list", prefix.unwrap_or(""));
            let failing = self.fail_list_prefix.lock().unwrap().clone();
            if let (Some(failing), Some(prefix)) = (failing, prefix) {
                if failing == prefix {
                    return Err(GatewayError::Backend(anyhow::anyhow!(
                        "injected listing failure for {prefix}"
                    )));
                }
            }
            self.inner.list_page(prefix, delimiter, continuation).await
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, bool> {
        Box::pin(async move {
            self.record("exists", key);
            self.inner.exists(key).await
        })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, Bytes> {
        Box::pin(async move {
            self.record("fetch", key);
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(key).await
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.record("put", key);
            self.inner.put(key, data, content_type).await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.record("delete", key);
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(GatewayError::Backend(anyhow::anyhow!(
                    "injected delete failure for {key}"
                )));
            }
            self.inner.delete(key).await
        })
    }

    fn copy<'a>(&'a self, source: &'a str, destination: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            self.record("copy", source);
            self.inner.copy(source, destination).await
        })
    }

    fn signed_url<'a>(
        &'a self,
        key: &'a str,
        ttl_seconds: u64,
        mode: UrlMode,
    ) -> GatewayFuture<'a, String> {
        Box::pin(async move {
            self.record("sign", key);
            self.inner.signed_url(key, ttl_seconds, mode).await
        })
    }
}
