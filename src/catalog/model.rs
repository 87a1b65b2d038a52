//! Catalog records returned to clients.

use serde::Serialize;

/// One album: the playable content found under a single top-level prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// 1-based position of the prefix in the bucket listing.
    pub id: usize,
    pub name: String,
    /// Four-digit year, or empty.
    pub year: String,
    /// Declared art link or signed cover image URL, or empty.
    pub cover_url: String,
    /// Signed URL of the lexicographically first audio object.
    pub primary_url: String,
    pub prefix: String,
    pub tracks: Vec<Track>,
}

/// One playable entry of an album.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    /// Object key; empty when the entry is declared with no matching object.
    pub key: String,
    pub title: String,
    pub url: String,
    pub art: String,
    /// Seconds, when declared.
    pub duration: Option<f64>,
}

/// Body of the catalog query.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub albums: Vec<Album>,
}
