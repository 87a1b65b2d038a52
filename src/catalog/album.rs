//! Album aggregation.
//!
//! [`AlbumAggregator`] turns the bucket's top-level prefixes into albums.
//! Each prefix is built independently: list its objects, classify them,
//! resolve the optional metadata document, derive display fields, and sign
//! the URLs clients need.  Builds run concurrently and are reassembled by
//! prefix position.

use futures::stream::{self, StreamExt};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::metadata::{self, AlbumMetadata};
use super::model::Album;
use super::naming::{classify, display_name, extract_year, MediaKind};
use super::tracks::{mint_tracks, plan_tracks};
use crate::config::Config;
use crate::metrics::{ALBUMS_BUILT_TOTAL, ALBUMS_SKIPPED_TOTAL};
use crate::storage::backend::{GatewayResult, StorageGateway, UrlMode};
use crate::storage::listing::{list_objects, list_prefixes};

/// Tunables for catalog builds.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Lifetime of every URL signed for the catalog.
    pub url_ttl_seconds: u64,
    /// Maximum album builds in flight; 0 means one per prefix.
    pub max_concurrency: usize,
    /// Drop a prefix whose build fails instead of failing the catalog.
    pub skip_failed_albums: bool,
}

impl CatalogSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url_ttl_seconds: config.signing.catalog_ttl_seconds,
            max_concurrency: config.catalog.max_concurrency,
            skip_failed_albums: config.catalog.skip_failed_albums,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Builds the album catalog from a storage gateway.
#[derive(Clone)]
pub struct AlbumAggregator {
    gateway: Arc<dyn StorageGateway>,
    settings: CatalogSettings,
}

impl AlbumAggregator {
    pub fn new(gateway: Arc<dyn StorageGateway>, settings: CatalogSettings) -> Self {
        Self { gateway, settings }
    }

    /// Build every album, in prefix-listing order.
    ///
    /// Album ids are assigned from the prefix position before any build is
    /// dispatched, so prefixes without albums leave gaps in the ids.
    pub async fn build_catalog(&self) -> GatewayResult<Vec<Album>> {
        let prefixes = list_prefixes(self.gateway.as_ref()).await?;
        let limit = match self.settings.max_concurrency {
            0 => prefixes.len().max(1),
            n => n,
        };

        // `buffered` yields in input order regardless of completion order.
        let results: Vec<_> = stream::iter(prefixes.iter().cloned().enumerate())
            .map(|(index, prefix)| async move {
                let result = self.build_album(&prefix, index).await;
                (prefix, result)
            })
            .buffered(limit)
            .collect()
            .await;

        let mut albums = Vec::with_capacity(results.len());
        for (prefix, result) in results {
            match result {
                Ok(Some(album)) => albums.push(album),
                Ok(None) => debug!("prefix {} has no playable audio", prefix),
                Err(err) if self.settings.skip_failed_albums => {
                    counter!(ALBUMS_SKIPPED_TOTAL).increment(1);
                    warn!(prefix = %prefix, "skipping album: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        counter!(ALBUMS_BUILT_TOTAL).increment(albums.len() as u64);
        info!(
            "catalog built: {} albums from {} prefixes",
            albums.len(),
            prefixes.len()
        );
        Ok(albums)
    }

    /// Build the album at `prefix`, or `None` when it holds no audio.
    ///
    /// `index` is the prefix's 0-based position in the listing.
    pub async fn build_album(&self, prefix: &str, index: usize) -> GatewayResult<Option<Album>> {
        let gateway = self.gateway.as_ref();
        let ttl = self.settings.url_ttl_seconds;

        let objects = list_objects(gateway, prefix).await?;
        if objects.is_empty() {
            return Ok(None);
        }

        let mut audio_keys = Vec::new();
        let mut image_key = None;
        for obj in &objects {
            match classify(&obj.key) {
                MediaKind::Audio => audio_keys.push(obj.key.clone()),
                MediaKind::Image if image_key.is_none() => image_key = Some(obj.key.as_str()),
                _ => {}
            }
        }
        if audio_keys.is_empty() {
            return Ok(None);
        }
        audio_keys.sort();

        let metadata = metadata::resolve(gateway, prefix, &objects)
            .await?
            .unwrap_or_default();

        let name = metadata
            .title
            .clone()
            .unwrap_or_else(|| display_name(prefix));
        let year = album_year(&metadata, &name);

        let primary_url = gateway
            .signed_url(&audio_keys[0], ttl, UrlMode::Download)
            .await?;

        let cover_url = async {
            match (metadata.art_link(), image_key) {
                (Some(link), _) => Ok(link.to_string()),
                (None, Some(key)) => gateway.signed_url(key, ttl, UrlMode::Download).await,
                (None, None) => Ok(String::new()),
            }
        };
        let plans = plan_tracks(&metadata.tracks, &audio_keys);
        let tracks = mint_tracks(gateway, plans, &primary_url, ttl);
        let (cover_url, tracks) = futures::try_join!(cover_url, tracks)?;

        Ok(Some(Album {
            id: index + 1,
            name,
            year,
            cover_url,
            primary_url,
            prefix: prefix.to_string(),
            tracks,
        }))
    }
}

/// Declared year, else a year found in the name, else the release year.
fn album_year(metadata: &AlbumMetadata, name: &str) -> String {
    if let Some(year) = &metadata.year {
        return year.clone();
    }
    let from_name = extract_year(name);
    if !from_name.is_empty() {
        return from_name;
    }
    metadata.release_year.clone().unwrap_or_default()
}
