/// Jellyseerr adapter
///
/// Implements the request-fulfillment side: world-catalog search and
/// discovery (TMDB-shaped payloads), acquisition pipeline status, collection
/// lookups, trailer videos, and request submission. TMDB numeric genre ids
/// are resolved to names here so the scoring engine only ever sees one genre
/// vocabulary.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    clients::{
        DiscoverKind, FulfillmentClient, ProbeInfo, ENRICHMENT_TIMEOUT, PRIMARY_TIMEOUT,
    },
    config::UpstreamEndpoint,
    error::{AppError, AppResult},
    models::{
        CollectionSummary, ItemSource, MediaItem, MediaKind, MediaRequest, RequestMediaType,
        SearchPage, Trailer, UnifiedSearchResult,
    },
};

/// TMDB genre id → display name, movie and TV vocabularies merged
const TMDB_GENRES: &[(i64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
    (10759, "Action & Adventure"),
    (10762, "Kids"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
];

#[derive(Clone)]
pub struct JellyseerrClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl JellyseerrClient {
    pub fn new(http: HttpClient, endpoint: &UpstreamEndpoint) -> Self {
        Self {
            http,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    /// Connectivity probe used by setup
    pub async fn probe(http: &HttpClient, endpoint: &UpstreamEndpoint) -> AppResult<ProbeInfo> {
        let response = http
            .get(format!("{}/api/v1/status", endpoint.base_url))
            .header("X-Api-Key", &endpoint.api_key)
            .timeout(PRIMARY_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyseerr",
                status: response.status().as_u16(),
            });
        }

        let status: SeerrStatus = response.json().await?;
        Ok(ProbeInfo {
            server_name: None,
            version: status.version,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: std::time::Duration,
    ) -> AppResult<T> {
        let url = format!("{}/api/v1/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .header("X-Api-Key", &self.api_key)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%url, %status, "Jellyseerr request failed");
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyseerr",
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl FulfillmentClient for JellyseerrClient {
    async fn media_status(
        &self,
        tmdb_id: i64,
        media_type: RequestMediaType,
    ) -> AppResult<Option<i32>> {
        let detail: SeerrMediaDetail = self
            .get_json(
                &format!("{}/{}", media_type.as_path(), tmdb_id),
                &[],
                PRIMARY_TIMEOUT,
            )
            .await?;
        Ok(detail.media_info.and_then(|info| info.status))
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<SearchPage> {
        let response: SeerrPage = self
            .get_json(
                "search",
                &[
                    ("query", query.to_string()),
                    ("page", page.to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        tracing::info!(
            query = %query,
            results = response.results.len(),
            source = "jellyseerr",
            "catalog search completed"
        );

        Ok(SearchPage {
            results: response
                .results
                .into_iter()
                .map(normalize_search_hit)
                .collect(),
            total_results: response.total_results.unwrap_or(0),
            total_pages: Some(response.total_pages.unwrap_or(1)),
        })
    }

    async fn discover(&self, kind: DiscoverKind, page: u32) -> AppResult<Vec<MediaItem>> {
        let response: SeerrPage = self
            .get_json(
                &format!("discover/{}", kind.as_path()),
                &[("page", page.to_string())],
                ENRICHMENT_TIMEOUT,
            )
            .await?;

        let kind = match kind {
            DiscoverKind::Movies => MediaKind::Movie,
            DiscoverKind::Tv => MediaKind::Series,
        };
        Ok(response
            .results
            .into_iter()
            .map(|raw| normalize_catalog_item(raw, kind))
            .collect())
    }

    async fn movie_collection_id(&self, tmdb_id: i64) -> AppResult<Option<i64>> {
        let detail: SeerrMediaDetail = self
            .get_json(&format!("movie/{tmdb_id}"), &[], ENRICHMENT_TIMEOUT)
            .await?;
        Ok(detail.belongs_to_collection.map(|collection| collection.id))
    }

    async fn collection(
        &self,
        collection_id: i64,
    ) -> AppResult<(CollectionSummary, Vec<MediaItem>)> {
        let collection: SeerrCollection = self
            .get_json(
                &format!("collection/{collection_id}"),
                &[],
                ENRICHMENT_TIMEOUT,
            )
            .await?;

        let summary = CollectionSummary {
            id: collection.id.to_string(),
            name: collection.name.unwrap_or_default(),
            overview: collection.overview.unwrap_or_default(),
        };
        let items = collection
            .parts
            .into_iter()
            .map(|part| normalize_catalog_item(part, MediaKind::Movie))
            .collect();
        Ok((summary, items))
    }

    async fn videos(
        &self,
        tmdb_id: i64,
        media_type: RequestMediaType,
    ) -> AppResult<Vec<Trailer>> {
        let response: SeerrVideos = self
            .get_json(
                &format!("{}/{}/videos", media_type.as_path(), tmdb_id),
                &[],
                ENRICHMENT_TIMEOUT,
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter(|video| {
                video.site.as_deref() == Some("YouTube")
                    && video.video_type.as_deref() == Some("Trailer")
            })
            .map(|video| {
                let key = video.key.unwrap_or_default();
                Trailer {
                    id: video.id.unwrap_or_default(),
                    name: video.name.unwrap_or_default(),
                    url: format!("https://www.youtube.com/watch?v={key}"),
                    youtube_key: key,
                    source: "youtube".to_string(),
                }
            })
            .collect())
    }

    async fn submit_request(&self, request: MediaRequest) -> AppResult<serde_json::Value> {
        let mut body = serde_json::json!({
            "mediaType": request.media_type.as_path(),
            "mediaId": request.tmdb_id,
        });
        if request.media_type == RequestMediaType::Tv {
            if let Some(seasons) = &request.seasons {
                body["seasons"] = serde_json::json!(seasons);
            }
        }

        let response = self
            .http
            .post(format!("{}/api/v1/request", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .timeout(PRIMARY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Surface the upstream's own message when it sends one
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body["message"].as_str().map(String::from));
            if let Some(message) = message {
                return Err(AppError::ExternalApi(message));
            }
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyseerr",
                status: status.as_u16(),
            });
        }

        tracing::info!(tmdb_id = request.tmdb_id, "media request submitted");
        Ok(response.json().await?)
    }
}

fn resolve_genres(genre_ids: &[i64]) -> Vec<String> {
    genre_ids
        .iter()
        .map(|id| {
            TMDB_GENRES
                .iter()
                .find(|(tmdb_id, _)| tmdb_id == id)
                .map(|(_, name)| (*name).to_string())
                .unwrap_or_else(|| format!("Genre_{id}"))
        })
        .collect()
}

fn parse_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(0..4)).and_then(|y| y.parse().ok())
}

fn display_name(raw: &SeerrItem) -> String {
    raw.title
        .clone()
        .or_else(|| raw.name.clone())
        .unwrap_or_default()
}

fn normalize_search_hit(raw: SeerrItem) -> UnifiedSearchResult {
    let media_type = match raw.media_type.as_deref() {
        Some("tv") => RequestMediaType::Tv,
        _ => RequestMediaType::Movie,
    };
    UnifiedSearchResult {
        id: raw.id.to_string(),
        tmdb_id: Some(raw.id),
        name: display_name(&raw),
        kind: match media_type {
            RequestMediaType::Tv => MediaKind::Series,
            RequestMediaType::Movie => MediaKind::Movie,
        },
        media_type,
        overview: raw.overview.unwrap_or_default(),
        year: parse_year(
            raw.release_date
                .as_deref()
                .or(raw.first_air_date.as_deref()),
        ),
        vote_average: raw.vote_average.unwrap_or(0.0),
        media_status: raw.media_info.and_then(|info| info.status).unwrap_or(0),
    }
}

fn normalize_catalog_item(raw: SeerrItem, kind: MediaKind) -> MediaItem {
    let vote_average = raw.vote_average.unwrap_or(0.0);
    MediaItem {
        id: format!("tmdb-{}", raw.id),
        tmdb_id: Some(raw.id),
        name: display_name(&raw),
        kind,
        overview: raw.overview.clone().unwrap_or_default(),
        genres: resolve_genres(&raw.genre_ids),
        community_rating: vote_average,
        year: parse_year(
            raw.release_date
                .as_deref()
                .or(raw.first_air_date.as_deref()),
        ),
        runtime: raw.runtime.unwrap_or(0),
        is_played: false,
        playback_position_ticks: 0,
        media_status: raw.media_info.and_then(|info| info.status).unwrap_or(0),
        source: ItemSource::Jellyseerr,
    }
}

// Raw wire DTOs, camelCase with most fields optional.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrPage {
    #[serde(default)]
    results: Vec<SeerrItem>,
    total_pages: Option<i64>,
    total_results: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrItem {
    id: i64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    runtime: Option<i64>,
    media_info: Option<SeerrMediaInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrMediaInfo {
    status: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrMediaDetail {
    media_info: Option<SeerrMediaInfo>,
    belongs_to_collection: Option<SeerrCollectionRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrCollectionRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrCollection {
    id: i64,
    name: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    parts: Vec<SeerrItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrVideos {
    #[serde(default)]
    results: Vec<SeerrVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrVideo {
    id: Option<String>,
    name: Option<String>,
    key: Option<String>,
    site: Option<String>,
    #[serde(rename = "type")]
    video_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeerrStatus {
    version: Option<String>,
}
