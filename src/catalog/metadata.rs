//! Optional per-album metadata documents.
//!
//! A prefix may carry a JSON document describing the album.  The document is
//! untrusted: fields of the wrong type are ignored, empty strings and zero
//! numbers count as absent, and a document that does not parse at all is
//! reported as a [`ParseFault`] so the caller can decide to carry on without
//! it.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::backend::{GatewayResult, ObjectDescriptor, StorageGateway};

/// Document names tried under each prefix, in order.
pub const METADATA_CANDIDATES: &[&str] = &["metadata.json", "album.json"];

/// Why a metadata document was rejected.
#[derive(Debug, Error)]
pub enum ParseFault {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level value is not an object")]
    NotAnObject,
}

/// Album-level fields of a metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumMetadata {
    pub title: Option<String>,
    pub year: Option<String>,
    pub release_year: Option<String>,
    pub art: Option<String>,
    pub cover: Option<String>,
    pub tracks: Vec<TrackEntry>,
}

impl AlbumMetadata {
    /// Declared album art link: `art`, else `cover`.
    pub fn art_link(&self) -> Option<&str> {
        self.art.as_deref().or(self.cover.as_deref())
    }
}

/// One declared track.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackEntry {
    pub id: Option<u64>,
    pub key: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub art: Option<String>,
    pub duration: Option<f64>,
}

/// Parse a metadata document.
pub fn parse_document(bytes: &[u8]) -> Result<AlbumMetadata, ParseFault> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(doc) = value else {
        return Err(ParseFault::NotAnObject);
    };

    let tracks = match doc.get("tracks") {
        Some(Value::Array(entries)) => entries.iter().map(track_entry).collect(),
        _ => Vec::new(),
    };

    Ok(AlbumMetadata {
        title: text(&doc, &["title"]),
        year: year_text(doc.get("year")),
        release_year: year_text(doc.get("releaseYear")),
        art: text(&doc, &["art"]),
        cover: text(&doc, &["cover"]),
        tracks,
    })
}

fn track_entry(value: &Value) -> TrackEntry {
    // Non-object entries still occupy a position in the track list.
    let Value::Object(entry) = value else {
        return TrackEntry::default();
    };
    TrackEntry {
        id: entry.get("id").and_then(positive_integer),
        key: text(entry, &["key", "Key", "path"]),
        title: text(entry, &["title", "name", "nombre"]),
        url: text(entry, &["url", "link"]),
        art: text(entry, &["art", "cover"]),
        duration: entry.get("duration").and_then(nonzero_number),
    }
}

/// First alias holding a non-empty string.
fn text(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|name| match obj.get(*name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// A year given as a string or a number, rendered as text.
fn year_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (i != 0).then(|| i.to_string())
            } else {
                let f = n.as_f64()?;
                if f == 0.0 || !f.is_finite() {
                    None
                } else if f.fract() == 0.0 {
                    Some(format!("{f:.0}"))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

fn positive_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().filter(|id| *id > 0),
        Value::String(s) => s.trim().parse::<u64>().ok().filter(|id| *id > 0),
        _ => None,
    }
}

fn nonzero_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n != 0.0 && n.is_finite()).then_some(n)
}

/// Load the first present, parseable metadata document under `prefix`.
///
/// Candidates missing from `objects` are skipped without a fetch.  A
/// candidate that fails to parse is logged and the next one is tried.
/// Storage failures propagate.
pub async fn resolve(
    gateway: &dyn StorageGateway,
    prefix: &str,
    objects: &[ObjectDescriptor],
) -> GatewayResult<Option<AlbumMetadata>> {
    for candidate in METADATA_CANDIDATES {
        let key = format!("{prefix}{candidate}");
        if !objects.iter().any(|obj| obj.key == key) {
            continue;
        }

        let body = gateway.fetch(&key).await?;
        match parse_document(&body) {
            Ok(metadata) => {
                debug!("loaded album metadata from {}", key);
                return Ok(Some(metadata));
            }
            Err(fault) => warn!(key = %key, "ignoring album metadata: {fault}"),
        }
    }
    Ok(None)
}
