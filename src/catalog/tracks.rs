//! Track list normalization.
//!
//! Reconciliation runs in two passes.  [`plan_tracks`] is pure: it decides
//! every field of every track and records where each URL must come from.
//! [`mint_tracks`] then signs the URLs that need signing, concurrently, and
//! keeps the planned order.

use futures::future::try_join_all;

use super::metadata::TrackEntry;
use super::model::Track;
use super::naming::file_name;
use crate::storage::backend::{GatewayError, GatewayResult, StorageGateway, UrlMode};

/// Where a track URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    /// A link declared in the metadata document, used as-is.
    Declared(String),
    /// A download URL to be signed for this key.
    Sign(String),
    /// No key resolved: fall back to the album's primary URL.
    Primary,
}

/// A fully resolved track whose URL may still need signing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPlan {
    pub id: u64,
    pub key: String,
    pub title: String,
    pub url: UrlSource,
    pub art: String,
    pub duration: Option<f64>,
}

/// Resolve the track list of an album.
///
/// `audio_keys` must be sorted ascending.  A non-empty declared list is
/// used as the base; otherwise one entry is synthesized per audio key.  For
/// every field, declared values win over values derived from the key, which
/// win over the positional fallback.
pub fn plan_tracks(declared: &[TrackEntry], audio_keys: &[String]) -> Vec<TrackPlan> {
    let synthesized;
    let entries = if declared.is_empty() {
        synthesized = audio_keys
            .iter()
            .enumerate()
            .map(|(i, key)| TrackEntry {
                id: Some(i as u64 + 1),
                key: Some(key.clone()),
                title: Some(file_name(key).to_string()),
                ..TrackEntry::default()
            })
            .collect::<Vec<_>>();
        &synthesized[..]
    } else {
        declared
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let position = i as u64 + 1;
            let key = entry
                .key
                .clone()
                .or_else(|| audio_keys.get(i).cloned())
                .unwrap_or_default();

            let title = match &entry.title {
                Some(title) => title.clone(),
                None if !key.is_empty() => file_name(&key).to_string(),
                None => format!("Track {position}"),
            };

            let url = match &entry.url {
                Some(url) => UrlSource::Declared(url.clone()),
                None if !key.is_empty() => UrlSource::Sign(key.clone()),
                None => UrlSource::Primary,
            };

            TrackPlan {
                id: entry.id.unwrap_or(position),
                key,
                title,
                url,
                art: entry.art.clone().unwrap_or_default(),
                duration: entry.duration,
            }
        })
        .collect()
}

/// Turn plans into tracks, signing download URLs concurrently.
pub async fn mint_tracks(
    gateway: &dyn StorageGateway,
    plans: Vec<TrackPlan>,
    primary_url: &str,
    ttl_seconds: u64,
) -> GatewayResult<Vec<Track>> {
    try_join_all(plans.into_iter().map(|plan| async move {
        let url = match plan.url {
            UrlSource::Declared(url) => url,
            UrlSource::Sign(key) => {
                gateway
                    .signed_url(&key, ttl_seconds, UrlMode::Download)
                    .await?
            }
            UrlSource::Primary => primary_url.to_string(),
        };
        Ok::<_, GatewayError>(Track {
            id: plan.id,
            key: plan.key,
            title: plan.title,
            url,
            art: plan.art,
            duration: plan.duration,
        })
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryGateway;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_synthesized_tracks_follow_key_order() {
        let plans = plan_tracks(&[], &keys(&["al/a.mp3", "al/b.flac"]));
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, 1);
        assert_eq!(plans[0].key, "al/a.mp3");
        assert_eq!(plans[0].title, "a.mp3");
        assert_eq!(plans[0].url, UrlSource::Sign("al/a.mp3".into()));
        assert_eq!(plans[1].id, 2);
        assert_eq!(plans[1].title, "b.flac");
        assert_eq!(plans[1].art, "");
        assert_eq!(plans[1].duration, None);
    }

    #[test]
    fn test_declared_key_without_url_is_signed() {
        let declared = vec![TrackEntry {
            title: Some("Intro".into()),
            key: Some("02.mp3".into()),
            ..TrackEntry::default()
        }];
        let plans = plan_tracks(&declared, &keys(&["al/01.mp3"]));
        assert_eq!(plans[0].key, "02.mp3");
        assert_eq!(plans[0].title, "Intro");
        assert_eq!(plans[0].url, UrlSource::Sign("02.mp3".into()));
    }

    #[test]
    fn test_positional_fallbacks() {
        let declared = vec![
            TrackEntry {
                url: Some("http://declared".into()),
                ..TrackEntry::default()
            },
            TrackEntry::default(),
            TrackEntry {
                id: Some(42),
                art: Some("http://art".into()),
                duration: Some(61.0),
                ..TrackEntry::default()
            },
        ];
        let plans = plan_tracks(&declared, &keys(&["al/x.mp3"]));

        // Position 0 borrows the first audio key but keeps its declared url.
        assert_eq!(plans[0].key, "al/x.mp3");
        assert_eq!(plans[0].title, "x.mp3");
        assert_eq!(plans[0].url, UrlSource::Declared("http://declared".into()));
        assert_eq!(plans[0].id, 1);

        // No declared key and no audio object at this position.
        assert_eq!(plans[1].key, "");
        assert_eq!(plans[1].title, "Track 2");
        assert_eq!(plans[1].url, UrlSource::Primary);

        assert_eq!(plans[2].id, 42);
        assert_eq!(plans[2].art, "http://art");
        assert_eq!(plans[2].duration, Some(61.0));
    }

    #[test]
    fn test_declared_list_wins_over_audio_count() {
        let declared = vec![TrackEntry {
            title: Some("Only".into()),
            ..TrackEntry::default()
        }];
        let plans = plan_tracks(&declared, &keys(&["al/a.mp3", "al/b.mp3", "al/c.mp3"]));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Only");
    }

    #[tokio::test]
    async fn test_mint_tracks_resolves_every_source() {
        let gw = MemoryGateway::new("http://objects.test", 1000);
        let plans = vec![
            TrackPlan {
                id: 1,
                key: "al/a.mp3".into(),
                title: "a".into(),
                url: UrlSource::Sign("al/a.mp3".into()),
                art: String::new(),
                duration: None,
            },
            TrackPlan {
                id: 2,
                key: String::new(),
                title: "Track 2".into(),
                url: UrlSource::Primary,
                art: String::new(),
                duration: None,
            },
            TrackPlan {
                id: 3,
                key: String::new(),
                title: "c".into(),
                url: UrlSource::Declared("http://elsewhere/c.mp3".into()),
                art: String::new(),
                duration: Some(3.5),
            },
        ];

        let tracks = mint_tracks(&gw, plans, "http://primary", 60).await.unwrap();
        assert_eq!(
            tracks[0].url,
            "http://objects.test/al/a.mp3?X-Amz-Expires=60&X-Amz-Method=GET"
        );
        assert_eq!(tracks[1].url, "http://primary");
        assert_eq!(tracks[2].url, "http://elsewhere/c.mp3");
        assert_eq!(tracks[2].duration, Some(3.5));
    }
}
