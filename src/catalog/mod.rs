//! Album catalog built from the bucket's prefix layout.
//!
//! - [`naming`]: display names, years, and extension classification.
//! - [`metadata`]: optional per-album JSON documents.
//! - [`tracks`]: reconciliation of declared tracks with audio objects.
//! - [`album`]: the aggregator that ties them together.

pub mod album;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod tracks;

pub use album::{AlbumAggregator, CatalogSettings};
pub use model::{Album, CatalogResponse, Track};
