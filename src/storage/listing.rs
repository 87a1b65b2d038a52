//! Paginated listing helpers built on [`StorageGateway::list_page`].
//!
//! Both helpers follow continuation tokens until the backend reports the
//! listing complete.  A backend that never stops handing out tokens is cut
//! off after [`MAX_LIST_PAGES`] pages.

use std::collections::HashSet;

use tracing::debug;

use super::backend::{GatewayError, GatewayResult, ObjectDescriptor, StorageGateway};

/// Delimiter separating virtual folders.
pub const DELIMITER: &str = "/";

/// Upper bound on pages fetched by a single listing.
pub const MAX_LIST_PAGES: usize = 10_000;

/// List the first-level prefixes of the bucket (not recursive).
///
/// Prefixes are returned in backend order with duplicates removed.
pub async fn list_prefixes(gateway: &dyn StorageGateway) -> GatewayResult<Vec<String>> {
    let mut prefixes = Vec::new();
    let mut seen = HashSet::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_LIST_PAGES {
        let page = gateway
            .list_page(None, Some(DELIMITER), token.as_deref())
            .await?;
        for prefix in page.common_prefixes {
            if !prefix.is_empty() && seen.insert(prefix.clone()) {
                prefixes.push(prefix);
            }
        }
        match page.next_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => {
                debug!("listed {} top-level prefixes", prefixes.len());
                return Ok(prefixes);
            }
        }
    }

    Err(GatewayError::PaginationExceeded {
        pages: MAX_LIST_PAGES,
    })
}

/// List every non-empty object under `prefix`, recursively.
///
/// Zero-byte objects (folder placeholders) are dropped.
pub async fn list_objects(
    gateway: &dyn StorageGateway,
    prefix: &str,
) -> GatewayResult<Vec<ObjectDescriptor>> {
    let mut objects = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_LIST_PAGES {
        let page = gateway
            .list_page(Some(prefix), None, token.as_deref())
            .await?;
        objects.extend(
            page.objects
                .into_iter()
                .filter(|obj| !obj.key.is_empty() && obj.size > 0),
        );
        match page.next_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => return Ok(objects),
        }
    }

    Err(GatewayError::PaginationExceeded {
        pages: MAX_LIST_PAGES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryGateway;
    use crate::storage::testing::EndlessListing;
    use bytes::Bytes;

    async fn seeded(page_size: usize) -> MemoryGateway {
        let gateway = MemoryGateway::new("http://objects.test", page_size);
        for key in [
            "alpha/01.mp3",
            "alpha/02.mp3",
            "beta/cover.jpg",
            "beta/track.flac",
            "gamma/.gitkeep",
            "loose.txt",
        ] {
            let body = if key.ends_with(".gitkeep") {
                Bytes::new()
            } else {
                Bytes::from_static(b"data")
            };
            gateway.put(key, body, "application/octet-stream").await.unwrap();
        }
        gateway
    }

    #[tokio::test]
    async fn test_list_prefixes_single_page() {
        let gateway = seeded(1000).await;
        let prefixes = list_prefixes(&gateway).await.unwrap();
        assert_eq!(prefixes, vec!["alpha/", "beta/", "gamma/"]);
    }

    #[tokio::test]
    async fn test_list_prefixes_across_pages_dedupes() {
        let gateway = seeded(1).await;
        let prefixes = list_prefixes(&gateway).await.unwrap();
        assert_eq!(prefixes, vec!["alpha/", "beta/", "gamma/"]);
    }

    #[tokio::test]
    async fn test_list_objects_skips_placeholders() {
        let gateway = seeded(2).await;
        let objects = list_objects(&gateway, "gamma/").await.unwrap();
        assert!(objects.is_empty());

        let objects = list_objects(&gateway, "alpha/").await.unwrap();
        let keys: Vec<_> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["alpha/01.mp3", "alpha/02.mp3"]);
    }

    #[tokio::test]
    async fn test_list_objects_stops_on_endless_tokens() {
        let err = list_objects(&EndlessListing, "any/").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::PaginationExceeded { pages } if pages == MAX_LIST_PAGES
        ));
    }

    #[tokio::test]
    async fn test_list_prefixes_stops_on_endless_tokens() {
        let err = list_prefixes(&EndlessListing).await.unwrap_err();
        assert!(matches!(err, GatewayError::PaginationExceeded { .. }));
    }
}
