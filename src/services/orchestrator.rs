//! Aggregation orchestrator.
//!
//! One function per logical capability: fetch the minimum necessary upstream
//! data (concurrently where independent), apply fallbacks, and shape the
//! response. Best-effort signals degrade here; only the loss of a response's
//! sole primary source propagates as an error.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clients::{DiscoverKind, FulfillmentClient, LibraryClient},
    error::{AppError, AppResult},
    models::{
        CollectionSummary, MediaItem, ReconciledStatus, RequestMediaType, UnifiedSearchResult,
        UserPreferences,
    },
    services::{dagzrank, status},
};

/// Catalog and history sample sizes for ranking
const RECOMMENDATION_SAMPLE: u32 = 100;
const HISTORY_SAMPLE: u32 = 100;
/// Items scoring at or below this never surface
const MIN_RANK: u32 = 20;
const MAX_RECOMMENDATIONS: usize = 30;

/// Cap on locally scanned grouped sets; the scan is O(groups x members)
const MAX_SCANNED_GROUPS: u32 = 40;

/// Wizard discover scan bounds
const WIZARD_MAX_PAGES: u32 = 5;
const WIZARD_TARGET_MATCHES: usize = 10;
const WIZARD_MAX_RESULTS: usize = 20;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    #[serde(flatten)]
    pub item: MediaItem,
    pub dagz_rank: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCounts {
    pub jellyfin: usize,
    pub jellyseerr: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RankedItem>,
    pub total_scored: usize,
    pub sources: SourceCounts,
}

/// Builds the personalized ranking.
///
/// Watch history and the trending feed are best-effort; the local catalog
/// sample is the one hard requirement, since there is nothing to rank
/// without it.
pub async fn recommendations(
    library: &dyn LibraryClient,
    fulfillment: Option<&dyn FulfillmentClient>,
    preferences: &UserPreferences,
    now: DateTime<Utc>,
) -> AppResult<RecommendationsResponse> {
    let (history, catalog) = tokio::join!(
        library.watch_history(HISTORY_SAMPLE),
        library.catalog_sample(RECOMMENDATION_SAMPLE),
    );

    let history = history.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "watch history unavailable, scoring without it");
        Vec::new()
    });
    let catalog = catalog?;

    let mut trending = Vec::new();
    if let Some(client) = fulfillment {
        let (movies, tv) = tokio::join!(
            client.discover(DiscoverKind::Movies, 1),
            client.discover(DiscoverKind::Tv, 1),
        );
        for feed in [movies, tv] {
            match feed {
                Ok(items) => trending.extend(items),
                Err(e) => tracing::warn!(error = %e, "trending feed unavailable"),
            }
        }
    }

    let local_count = catalog.len();
    let trending_count = trending.len();

    // Fuse the two catalogs, locally available titles first, one entry per
    // title name.
    let mut seen_names = HashSet::new();
    let mut pool = Vec::new();
    for item in catalog.into_iter().chain(trending) {
        if seen_names.insert(item.name.to_lowercase()) {
            pool.push(item);
        }
    }

    let mut ranked: Vec<RankedItem> = pool
        .into_iter()
        .map(|item| RankedItem {
            dagz_rank: dagzrank::score(&item, preferences, &history, now),
            item,
        })
        .collect();
    let total_scored = ranked.len();

    // Stable sort: fetch order breaks ties
    ranked.sort_by(|a, b| b.dagz_rank.cmp(&a.dagz_rank));
    ranked.retain(|entry| entry.dagz_rank > MIN_RANK);
    ranked.truncate(MAX_RECOMMENDATIONS);

    tracing::info!(
        total_scored,
        surfaced = ranked.len(),
        local = local_count,
        trending = trending_count,
        "recommendations built"
    );

    Ok(RecommendationsResponse {
        recommendations: ranked,
        total_scored,
        sources: SourceCounts {
            jellyfin: local_count,
            jellyseerr: trending_count,
        },
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: ReconciledStatus,
    pub jellyfin_available: bool,
    pub jellyseerr_status: Option<i32>,
}

/// Runs the two availability probes concurrently and reconciles them.
///
/// Each probe may fail without failing the other; when neither signal could
/// be obtained at all the result is `unknown`, bypassing the decision table.
pub async fn media_status(
    library: &dyn LibraryClient,
    fulfillment: Option<&dyn FulfillmentClient>,
    item_id: Option<&str>,
    tmdb_id: Option<i64>,
    media_type: RequestMediaType,
) -> StatusResponse {
    let local_probe = async {
        match item_id {
            Some(id) => match library.has_media_sources(id).await {
                Ok(available) => Some(available),
                Err(e) => {
                    tracing::warn!(error = %e, item_id = %id, "local availability probe failed");
                    None
                }
            },
            None => None,
        }
    };

    let fulfillment_probe = async {
        match (fulfillment, tmdb_id) {
            (Some(client), Some(id)) => match client.media_status(id, media_type).await {
                Ok(code) => Some(code),
                Err(e) => {
                    tracing::warn!(error = %e, tmdb_id = id, "fulfillment status probe failed");
                    None
                }
            },
            _ => None,
        }
    };

    let (local, remote) = tokio::join!(local_probe, fulfillment_probe);

    if local.is_none() && remote.is_none() {
        return StatusResponse {
            status: ReconciledStatus::Unknown,
            jellyfin_available: false,
            jellyseerr_status: None,
        };
    }

    let jellyfin_available = local.unwrap_or(false);
    let jellyseerr_status = remote.flatten();

    StatusResponse {
        status: status::reconcile(jellyfin_available, jellyseerr_status),
        jellyfin_available,
        jellyseerr_status,
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<UnifiedSearchResult>,
    pub total_results: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
}

/// Searches the richer (fulfillment-aware) source first, falling back to the
/// library when it fails or is not configured.
pub async fn search(
    library: &dyn LibraryClient,
    fulfillment: Option<&dyn FulfillmentClient>,
    query: &str,
    page: u32,
) -> AppResult<SearchResponse> {
    if query.trim().is_empty() {
        return Ok(SearchResponse {
            results: Vec::new(),
            total_results: 0,
            total_pages: None,
        });
    }

    if let Some(client) = fulfillment {
        match client.search(query, page).await {
            Ok(results) => {
                return Ok(SearchResponse {
                    results: results.results,
                    total_results: results.total_results,
                    total_pages: results.total_pages,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog search failed, falling back to library");
            }
        }
    }

    let results = library.search(query, 20).await?;
    Ok(SearchResponse {
        results: results.results,
        total_results: results.total_results,
        total_pages: None,
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub collection: Option<CollectionSummary>,
    pub items: Vec<MediaItem>,
}

/// Finds the saga a title belongs to: local grouped sets first (bounded
/// scan), then the fulfillment upstream's native collection lookup. The
/// first non-empty result wins; partial results are never merged.
pub async fn collection(
    library: &dyn LibraryClient,
    fulfillment: Option<&dyn FulfillmentClient>,
    item_id: Option<&str>,
    tmdb_id: Option<i64>,
) -> AppResult<CollectionResponse> {
    if item_id.is_none() && tmdb_id.is_none() {
        return Err(AppError::InvalidInput("id or tmdbId is required".to_string()));
    }

    if let Some(id) = item_id {
        match find_local_group(library, id).await {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "local group scan failed"),
        }
    }

    if let (Some(client), Some(tmdb)) = (fulfillment, tmdb_id) {
        match fetch_remote_collection(client, tmdb).await {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "remote collection lookup failed"),
        }
    }

    Ok(CollectionResponse {
        collection: None,
        items: Vec::new(),
    })
}

async fn find_local_group(
    library: &dyn LibraryClient,
    item_id: &str,
) -> AppResult<Option<CollectionResponse>> {
    let groups = library.grouped_sets(MAX_SCANNED_GROUPS).await?;
    for group in groups {
        let members = library.grouped_set_members(&group.id).await?;
        if members.iter().any(|member| member.id == item_id) {
            tracing::debug!(group = %group.name, "item found in local grouped set");
            return Ok(Some(CollectionResponse {
                collection: Some(CollectionSummary {
                    id: group.id,
                    name: group.name,
                    overview: group.overview,
                }),
                items: members,
            }));
        }
    }
    Ok(None)
}

async fn fetch_remote_collection(
    client: &dyn FulfillmentClient,
    tmdb_id: i64,
) -> AppResult<Option<CollectionResponse>> {
    let Some(collection_id) = client.movie_collection_id(tmdb_id).await? else {
        return Ok(None);
    };

    let (summary, items) = client.collection(collection_id).await?;
    if items.is_empty() {
        return Ok(None);
    }

    Ok(Some(CollectionResponse {
        collection: Some(summary),
        items,
    }))
}

/// Release-era filter for wizard discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Classic,
    Nineties,
    TwoThousands,
    Recent,
    All,
}

impl Era {
    fn year_range(&self, current_year: i32) -> (i32, i32) {
        match self {
            Era::Classic => (1900, 1979),
            Era::Nineties => (1990, 1999),
            Era::TwoThousands => (2000, 2009),
            Era::Recent => (2010, current_year),
            Era::All => (1900, current_year),
        }
    }
}

/// Runtime preference for wizard discovery; applied to movies only, since TV
/// runtimes are per-episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePref {
    Short,
    Medium,
    Long,
    Any,
}

impl RuntimePref {
    fn range(&self) -> (i64, Option<i64>) {
        match self {
            RuntimePref::Short => (0, Some(105)),
            RuntimePref::Medium => (75, Some(165)),
            RuntimePref::Long => (135, None),
            RuntimePref::Any => (0, None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WizardFilters {
    pub era: Era,
    pub mood: Option<String>,
    pub runtime: RuntimePref,
    pub media_type: RequestMediaType,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardResponse {
    pub results: Vec<MediaItem>,
    pub total_found: usize,
}

/// Guided discovery: pages through the trending feed applying era, mood and
/// runtime filters, with a second unfiltered-runtime pass when the runtime
/// constraint empties the result.
pub async fn wizard_discover(
    fulfillment: Option<&dyn FulfillmentClient>,
    filters: &WizardFilters,
    now: DateTime<Utc>,
) -> AppResult<WizardResponse> {
    let Some(client) = fulfillment else {
        return Ok(WizardResponse {
            results: Vec::new(),
            total_found: 0,
        });
    };

    let runtime_filter = filters.media_type == RequestMediaType::Movie
        && filters.runtime != RuntimePref::Any;

    let mut matches = scan_discover_pages(client, filters, now, runtime_filter).await;
    if matches.is_empty() && runtime_filter {
        matches = scan_discover_pages(client, filters, now, false).await;
    }

    let total_found = matches.len();
    matches.truncate(WIZARD_MAX_RESULTS);

    Ok(WizardResponse {
        results: matches,
        total_found,
    })
}

async fn scan_discover_pages(
    client: &dyn FulfillmentClient,
    filters: &WizardFilters,
    now: DateTime<Utc>,
    apply_runtime: bool,
) -> Vec<MediaItem> {
    let kind = match filters.media_type {
        RequestMediaType::Tv => DiscoverKind::Tv,
        RequestMediaType::Movie => DiscoverKind::Movies,
    };
    let (min_year, max_year) = filters.era.year_range(now.year());
    let (min_runtime, max_runtime) = filters.runtime.range();
    let mood = filters.mood.as_deref().map(str::to_lowercase);

    let mut matches = Vec::new();
    for page in 1..=WIZARD_MAX_PAGES {
        if matches.len() >= WIZARD_TARGET_MATCHES {
            break;
        }

        let items = match client.discover(kind, page).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, page, "wizard discover page failed");
                break;
            }
        };

        matches.extend(items.into_iter().filter(|item| {
            let year_ok = item
                .year
                .map(|year| year >= min_year && year <= max_year)
                .unwrap_or(false);
            let mood_ok = mood.as_deref().map_or(true, |mood| {
                item.genres
                    .iter()
                    .any(|genre| genre.to_lowercase().contains(mood))
            });
            let runtime_ok = !apply_runtime
                || (item.runtime >= min_runtime
                    && max_runtime.map_or(true, |max| item.runtime <= max));
            year_ok && mood_ok && runtime_ok
        }));
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockFulfillmentClient, MockLibraryClient};
    use crate::models::{ItemSource, MediaKind, SearchPage};
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn catalog_item(id: &str, name: &str, rating: f64) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            tmdb_id: None,
            name: name.to_string(),
            kind: MediaKind::Movie,
            overview: String::new(),
            genres: vec!["Action".to_string()],
            community_rating: rating,
            year: Some(2026),
            runtime: 120,
            is_played: false,
            playback_position_ticks: 0,
            media_status: 0,
            source: ItemSource::Jellyfin,
        }
    }

    fn prefs() -> UserPreferences {
        UserPreferences {
            user_id: "u1".to_string(),
            favorite_genres: vec!["Action".to_string()],
            disliked_genres: Vec::new(),
            onboarding_complete: true,
        }
    }

    fn upstream_error() -> AppError {
        AppError::UpstreamStatus {
            upstream: "Jellyfin",
            status: 503,
        }
    }

    #[tokio::test]
    async fn test_status_unknown_when_both_signals_unobtainable() {
        let mut library = MockLibraryClient::new();
        library
            .expect_has_media_sources()
            .returning(|_| Err(upstream_error()));
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment
            .expect_media_status()
            .returning(|_, _| {
                Err(AppError::UpstreamStatus {
                    upstream: "Jellyseerr",
                    status: 503,
                })
            });

        let response = media_status(
            &library,
            Some(&fulfillment),
            Some("item-1"),
            Some(42),
            RequestMediaType::Movie,
        )
        .await;

        assert_eq!(response.status, ReconciledStatus::Unknown);
        assert!(!response.jellyfin_available);
        assert_eq!(response.jellyseerr_status, None);
    }

    #[tokio::test]
    async fn test_status_unknown_when_no_ids_supplied() {
        let library = MockLibraryClient::new();
        let response =
            media_status(&library, None, None, None, RequestMediaType::Movie).await;
        assert_eq!(response.status, ReconciledStatus::Unknown);
    }

    #[tokio::test]
    async fn test_status_survives_one_failed_probe() {
        let mut library = MockLibraryClient::new();
        library
            .expect_has_media_sources()
            .returning(|_| Err(upstream_error()));
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment
            .expect_media_status()
            .with(eq(42), eq(RequestMediaType::Movie))
            .returning(|_, _| Ok(Some(2)));

        let response = media_status(
            &library,
            Some(&fulfillment),
            Some("item-1"),
            Some(42),
            RequestMediaType::Movie,
        )
        .await;

        assert_eq!(response.status, ReconciledStatus::Pending);
        assert_eq!(response.jellyseerr_status, Some(2));
    }

    #[tokio::test]
    async fn test_status_obtained_empty_fulfillment_signal_is_not_unknown() {
        // The fulfillment call succeeds but reports no pipeline entry: that
        // is a real "nothing requested" signal, not an outage.
        let mut library = MockLibraryClient::new();
        library
            .expect_has_media_sources()
            .returning(|_| Err(upstream_error()));
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment
            .expect_media_status()
            .returning(|_, _| Ok(None));

        let response = media_status(
            &library,
            Some(&fulfillment),
            Some("item-1"),
            Some(42),
            RequestMediaType::Movie,
        )
        .await;

        assert_eq!(response.status, ReconciledStatus::NotAvailable);
    }

    #[tokio::test]
    async fn test_status_local_availability_wins() {
        let mut library = MockLibraryClient::new();
        library
            .expect_has_media_sources()
            .withf(|id| id == "item-1")
            .returning(|_| Ok(true));

        let response = media_status(
            &library,
            None,
            Some("item-1"),
            None,
            RequestMediaType::Movie,
        )
        .await;

        assert_eq!(response.status, ReconciledStatus::Available);
        assert!(response.jellyfin_available);
    }

    #[tokio::test]
    async fn test_recommendations_degrade_without_history() {
        let mut library = MockLibraryClient::new();
        library
            .expect_watch_history()
            .returning(|_| Err(upstream_error()));
        library.expect_catalog_sample().returning(|_| {
            Ok(vec![
                catalog_item("a", "Alpha", 8.0),
                catalog_item("b", "Beta", 9.0),
            ])
        });

        let response = recommendations(&library, None, &prefs(), now())
            .await
            .unwrap();

        assert_eq!(response.total_scored, 2);
        assert_eq!(response.recommendations.len(), 2);
        // genre 40 + history default 10 + community + freshness 10
        assert_eq!(response.recommendations[0].item.name, "Beta");
        assert_eq!(response.recommendations[0].dagz_rank, 78);
        assert_eq!(response.recommendations[1].dagz_rank, 76);
    }

    #[tokio::test]
    async fn test_recommendations_fail_without_catalog() {
        let mut library = MockLibraryClient::new();
        library.expect_watch_history().returning(|_| Ok(Vec::new()));
        library
            .expect_catalog_sample()
            .returning(|_| Err(upstream_error()));

        let result = recommendations(&library, None, &prefs(), now()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recommendations_fuse_and_dedup_by_name() {
        let mut library = MockLibraryClient::new();
        library.expect_watch_history().returning(|_| Ok(Vec::new()));
        library
            .expect_catalog_sample()
            .returning(|_| Ok(vec![catalog_item("a", "Alpha", 8.0)]));

        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment.expect_discover().returning(|kind, _| {
            Ok(match kind {
                DiscoverKind::Movies => vec![
                    MediaItem {
                        id: "tmdb-1".to_string(),
                        source: ItemSource::Jellyseerr,
                        ..catalog_item("ignored", "ALPHA", 9.9)
                    },
                    MediaItem {
                        id: "tmdb-2".to_string(),
                        source: ItemSource::Jellyseerr,
                        ..catalog_item("ignored", "Gamma", 7.0)
                    },
                ],
                DiscoverKind::Tv => Vec::new(),
            })
        });

        let response = recommendations(&library, Some(&fulfillment), &prefs(), now())
            .await
            .unwrap();

        // "ALPHA" collapses into the locally available "Alpha"
        assert_eq!(response.total_scored, 2);
        let names: Vec<&str> = response
            .recommendations
            .iter()
            .map(|entry| entry.item.name.as_str())
            .collect();
        assert!(names.contains(&"Alpha"));
        assert!(names.contains(&"Gamma"));
        assert!(!names.contains(&"ALPHA"));
        assert_eq!(response.sources.jellyfin, 1);
        assert_eq!(response.sources.jellyseerr, 2);
    }

    #[tokio::test]
    async fn test_recommendations_filter_and_cap() {
        let mut library = MockLibraryClient::new();
        library.expect_watch_history().returning(|_| Ok(Vec::new()));
        library.expect_catalog_sample().returning(|_| {
            // 40 rankable items plus one that scores at the threshold
            let mut items: Vec<MediaItem> = (0..40)
                .map(|i| catalog_item(&format!("id-{i}"), &format!("Title {i}"), 8.0))
                .collect();
            items.push(MediaItem {
                genres: Vec::new(),
                community_rating: 0.0,
                year: None,
                is_played: true,
                ..catalog_item("low", "Low", 0.0)
            });
            Ok(items)
        });

        let response = recommendations(&library, None, &prefs(), now())
            .await
            .unwrap();

        assert_eq!(response.total_scored, 41);
        assert_eq!(response.recommendations.len(), MAX_RECOMMENDATIONS);
        assert!(response
            .recommendations
            .iter()
            .all(|entry| entry.dagz_rank > MIN_RANK));
    }

    #[tokio::test]
    async fn test_search_falls_back_to_library() {
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment.expect_search().returning(|_, _| {
            Err(AppError::UpstreamStatus {
                upstream: "Jellyseerr",
                status: 500,
            })
        });

        let mut library = MockLibraryClient::new();
        library.expect_search().returning(|_, _| {
            Ok(SearchPage {
                results: vec![UnifiedSearchResult {
                    id: "x".to_string(),
                    tmdb_id: None,
                    name: "Dune".to_string(),
                    kind: MediaKind::Movie,
                    media_type: RequestMediaType::Movie,
                    overview: String::new(),
                    year: Some(2021),
                    vote_average: 8.0,
                    media_status: 5,
                }],
                total_results: 1,
                total_pages: None,
            })
        });

        let response = search(&library, Some(&fulfillment), "dune", 1)
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].media_status, 5);
        assert_eq!(response.total_pages, None);
    }

    #[tokio::test]
    async fn test_search_empty_query_short_circuits() {
        let library = MockLibraryClient::new();
        let response = search(&library, None, "   ", 1).await.unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_results, 0);
    }

    #[tokio::test]
    async fn test_collection_requires_an_id() {
        let library = MockLibraryClient::new();
        let result = collection(&library, None, None, None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_collection_local_group_short_circuits_fulfillment() {
        let mut library = MockLibraryClient::new();
        library.expect_grouped_sets().returning(|_| {
            Ok(vec![
                catalog_item("set-1", "Unrelated Saga", 0.0),
                catalog_item("set-2", "Target Saga", 0.0),
            ])
        });
        library.expect_grouped_set_members().returning(|set_id| {
            Ok(match set_id {
                "set-2" => vec![
                    catalog_item("member-1", "Part One", 7.0),
                    catalog_item("wanted", "Part Two", 7.5),
                ],
                _ => vec![catalog_item("other", "Elsewhere", 5.0)],
            })
        });

        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment.expect_movie_collection_id().times(0);

        let response = collection(&library, Some(&fulfillment), Some("wanted"), Some(42))
            .await
            .unwrap();

        let summary = response.collection.unwrap();
        assert_eq!(summary.name, "Target Saga");
        assert_eq!(response.items.len(), 2);
    }

    #[tokio::test]
    async fn test_collection_falls_back_to_fulfillment() {
        let mut library = MockLibraryClient::new();
        library.expect_grouped_sets().returning(|_| Ok(Vec::new()));

        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment
            .expect_movie_collection_id()
            .with(eq(42))
            .returning(|_| Ok(Some(9485)));
        fulfillment.expect_collection().with(eq(9485)).returning(|_| {
            Ok((
                CollectionSummary {
                    id: "9485".to_string(),
                    name: "Remote Saga".to_string(),
                    overview: String::new(),
                },
                vec![catalog_item("tmdb-1", "Part One", 7.0)],
            ))
        });

        let response = collection(&library, Some(&fulfillment), Some("missing"), Some(42))
            .await
            .unwrap();

        assert_eq!(response.collection.unwrap().name, "Remote Saga");
        assert_eq!(response.items.len(), 1);
    }

    #[tokio::test]
    async fn test_collection_empty_when_neither_source_knows() {
        let mut library = MockLibraryClient::new();
        library.expect_grouped_sets().returning(|_| Ok(Vec::new()));
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment
            .expect_movie_collection_id()
            .returning(|_| Ok(None));

        let response = collection(&library, Some(&fulfillment), Some("x"), Some(42))
            .await
            .unwrap();

        assert!(response.collection.is_none());
        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn test_wizard_applies_era_and_mood_filters() {
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment.expect_discover().returning(|_, page| {
            Ok(if page == 1 {
                vec![
                    MediaItem {
                        year: Some(1995),
                        genres: vec!["Action".to_string()],
                        ..catalog_item("a", "Nineties Action", 7.0)
                    },
                    MediaItem {
                        year: Some(1995),
                        genres: vec!["Romance".to_string()],
                        ..catalog_item("b", "Nineties Romance", 7.0)
                    },
                    MediaItem {
                        year: Some(2020),
                        genres: vec!["Action".to_string()],
                        ..catalog_item("c", "Modern Action", 7.0)
                    },
                ]
            } else {
                Vec::new()
            })
        });

        let filters = WizardFilters {
            era: Era::Nineties,
            mood: Some("action".to_string()),
            runtime: RuntimePref::Any,
            media_type: RequestMediaType::Movie,
        };
        let response = wizard_discover(Some(&fulfillment), &filters, now())
            .await
            .unwrap();

        assert_eq!(response.total_found, 1);
        assert_eq!(response.results[0].name, "Nineties Action");
    }

    #[tokio::test]
    async fn test_wizard_retries_without_runtime_filter() {
        let mut fulfillment = MockFulfillmentClient::new();
        fulfillment.expect_discover().returning(|_, page| {
            Ok(if page == 1 {
                // runtime 0 fails the "long" filter on the first pass
                vec![MediaItem {
                    year: Some(2020),
                    runtime: 0,
                    ..catalog_item("a", "Epic", 7.0)
                }]
            } else {
                Vec::new()
            })
        });

        let filters = WizardFilters {
            era: Era::All,
            mood: None,
            runtime: RuntimePref::Long,
            media_type: RequestMediaType::Movie,
        };
        let response = wizard_discover(Some(&fulfillment), &filters, now())
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].name, "Epic");
    }

    #[tokio::test]
    async fn test_wizard_without_fulfillment_is_empty() {
        let filters = WizardFilters {
            era: Era::All,
            mood: None,
            runtime: RuntimePref::Any,
            media_type: RequestMediaType::Movie,
        };
        let response = wizard_discover(None, &filters, now()).await.unwrap();
        assert!(response.results.is_empty());
    }
}
