/// Jellyfin adapter
///
/// Implements the library side of the system: listings, availability probes,
/// watch history, search, grouped sets, and the authentication proxy. All
/// payloads are normalized into `models` shapes here; the raw wire DTOs stay
/// private to this module.
use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    clients::{
        LibraryClient, LibraryQuery, ProbeInfo, ENRICHMENT_TIMEOUT, LOCALLY_AVAILABLE_STATUS,
        PRIMARY_TIMEOUT, TICKS_PER_MINUTE,
    },
    config::UpstreamEndpoint,
    error::{AppError, AppResult},
    models::{
        Episode, GenreRef, ItemSource, LibraryPage, MediaDetail, MediaItem, MediaKind, Person,
        RequestMediaType, SearchPage, Season, Session, UnifiedSearchResult, WatchHistoryEntry,
    },
};

const ITEM_FIELDS: &str =
    "Overview,Genres,CommunityRating,OfficialRating,PremiereDate,RunTimeTicks,People,ProviderIds,MediaSources";

#[derive(Clone)]
pub struct JellyfinClient {
    http: HttpClient,
    base_url: String,
    token: String,
    user_id: String,
}

impl JellyfinClient {
    pub fn new(http: HttpClient, endpoint: &UpstreamEndpoint, session: &Session) -> Self {
        Self {
            http,
            base_url: endpoint.base_url.clone(),
            token: session.token.clone(),
            user_id: session.user_id.clone(),
        }
    }

    /// Authenticates a user against the library upstream and returns the
    /// session material for subsequent proxied calls.
    pub async fn authenticate(
        http: &HttpClient,
        endpoint: &UpstreamEndpoint,
        username: &str,
        password: &str,
    ) -> AppResult<Session> {
        let response = http
            .post(format!("{}/Users/AuthenticateByName", endpoint.base_url))
            .header("X-Emby-Authorization", auth_header())
            .json(&serde_json::json!({ "Username": username, "Pw": password }))
            .timeout(PRIMARY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            tracing::warn!(%status, "Jellyfin authentication failed");
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyfin",
                status: status.as_u16(),
            });
        }

        let auth: JfAuthResponse = response.json().await?;
        let user = auth
            .user
            .ok_or_else(|| AppError::ExternalApi("Auth response missing user".to_string()))?;
        let token = auth
            .access_token
            .ok_or_else(|| AppError::ExternalApi("Auth response missing token".to_string()))?;

        tracing::info!(user = %user.name, "Jellyfin authentication succeeded");

        Ok(Session {
            user_id: user.id,
            user_name: user.name,
            token,
        })
    }

    /// Connectivity probe used by setup; hits the public system info endpoint
    pub async fn probe(http: &HttpClient, endpoint: &UpstreamEndpoint) -> AppResult<ProbeInfo> {
        let response = http
            .get(format!("{}/System/Info/Public", endpoint.base_url))
            .header("X-Emby-Token", &endpoint.api_key)
            .timeout(PRIMARY_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyfin",
                status: response.status().as_u16(),
            });
        }

        let info: JfSystemInfo = response.json().await?;
        Ok(ProbeInfo {
            server_name: info.server_name,
            version: info.version,
        })
    }

    fn user_items_url(&self) -> String {
        format!("{}/Users/{}/Items", self.base_url, self.user_id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
        timeout: std::time::Duration,
    ) -> AppResult<T> {
        let response = self
            .http
            .get(&url)
            .query(query)
            .header("X-Emby-Token", &self.token)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%url, %status, "Jellyfin request failed");
            return Err(AppError::UpstreamStatus {
                upstream: "Jellyfin",
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    async fn fetch_item(&self, item_id: &str) -> AppResult<JfItem> {
        self.get_json(
            format!("{}/{}", self.user_items_url(), item_id),
            &[],
            PRIMARY_TIMEOUT,
        )
        .await
    }
}

#[async_trait::async_trait]
impl LibraryClient for JellyfinClient {
    async fn library_items(&self, query: LibraryQuery) -> AppResult<LibraryPage> {
        let mut params = vec![
            ("IncludeItemTypes", query.item_types.clone()),
            ("Limit", query.limit.to_string()),
            ("StartIndex", query.start_index.to_string()),
            ("SortBy", query.sort_by.clone()),
            ("SortOrder", query.sort_order.clone()),
            ("Recursive", "true".to_string()),
            ("Fields", ITEM_FIELDS.to_string()),
        ];
        if let Some(genre_ids) = &query.genre_ids {
            params.push(("GenreIds", genre_ids.clone()));
        }
        if let Some(term) = &query.search_term {
            params.push(("SearchTerm", term.clone()));
        }

        let page: JfItemsPage = self
            .get_json(self.user_items_url(), &params, PRIMARY_TIMEOUT)
            .await?;

        tracing::debug!(
            items = page.items.len(),
            total = page.total_record_count,
            "library page fetched"
        );

        Ok(LibraryPage {
            items: page.items.into_iter().map(normalize_item).collect(),
            total_count: page.total_record_count,
        })
    }

    async fn item_detail(&self, item_id: &str) -> AppResult<MediaDetail> {
        let item = self.fetch_item(item_id).await?;
        Ok(normalize_detail(item))
    }

    async fn similar_items(&self, item_id: &str, limit: u32) -> AppResult<Vec<MediaItem>> {
        let page: JfItemsPage = self
            .get_json(
                format!("{}/Items/{}/Similar", self.base_url, item_id),
                &[
                    ("UserId", self.user_id.clone()),
                    ("Limit", limit.to_string()),
                    ("Fields", "Overview,Genres,CommunityRating".to_string()),
                ],
                ENRICHMENT_TIMEOUT,
            )
            .await?;
        Ok(page.items.into_iter().map(normalize_item).collect())
    }

    async fn has_media_sources(&self, item_id: &str) -> AppResult<bool> {
        let item = self.fetch_item(item_id).await?;
        Ok(!item.media_sources.is_empty())
    }

    async fn watch_history(&self, limit: u32) -> AppResult<Vec<WatchHistoryEntry>> {
        let page: JfItemsPage = self
            .get_json(
                self.user_items_url(),
                &[
                    ("IsPlayed", "true".to_string()),
                    ("Recursive", "true".to_string()),
                    ("Limit", limit.to_string()),
                    ("Fields", "Genres".to_string()),
                    ("SortBy", "DatePlayed".to_string()),
                    ("SortOrder", "Descending".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|item| WatchHistoryEntry {
                id: item.id,
                name: item.name.unwrap_or_default(),
                genres: item.genres,
            })
            .collect())
    }

    async fn catalog_sample(&self, limit: u32) -> AppResult<Vec<MediaItem>> {
        let page: JfItemsPage = self
            .get_json(
                self.user_items_url(),
                &[
                    ("Recursive", "true".to_string()),
                    ("Limit", limit.to_string()),
                    ("IncludeItemTypes", "Movie,Series".to_string()),
                    (
                        "Fields",
                        "Overview,Genres,CommunityRating,PremiereDate,ProviderIds".to_string(),
                    ),
                    ("SortBy", "Random".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;
        Ok(page.items.into_iter().map(normalize_item).collect())
    }

    async fn search(&self, query: &str, limit: u32) -> AppResult<SearchPage> {
        let page: JfItemsPage = self
            .get_json(
                self.user_items_url(),
                &[
                    ("SearchTerm", query.to_string()),
                    ("Recursive", "true".to_string()),
                    ("Limit", limit.to_string()),
                    (
                        "Fields",
                        "Overview,Genres,CommunityRating,ProviderIds".to_string(),
                    ),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        tracing::info!(
            query = %query,
            results = page.items.len(),
            source = "jellyfin",
            "library search completed"
        );

        let total = page.total_record_count;
        Ok(SearchPage {
            results: page.items.into_iter().map(normalize_search_hit).collect(),
            total_results: total,
            total_pages: None,
        })
    }

    async fn genres(&self) -> AppResult<Vec<GenreRef>> {
        let page: JfItemsPage = self
            .get_json(
                format!("{}/Genres", self.base_url),
                &[
                    ("UserId", self.user_id.clone()),
                    ("SortBy", "SortName".to_string()),
                    ("SortOrder", "Ascending".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|genre| GenreRef {
                id: genre.id,
                name: genre.name.unwrap_or_default(),
            })
            .collect())
    }

    async fn resume_items(&self, limit: u32) -> AppResult<Vec<MediaItem>> {
        let page: JfItemsPage = self
            .get_json(
                format!("{}/Resume", self.user_items_url()),
                &[
                    ("Limit", limit.to_string()),
                    ("Recursive", "true".to_string()),
                    (
                        "Fields",
                        "Overview,Genres,CommunityRating,PremiereDate,RunTimeTicks,MediaSources"
                            .to_string(),
                    ),
                    ("MediaTypes", "Video".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;
        Ok(page.items.into_iter().map(normalize_item).collect())
    }

    async fn seasons(&self, series_id: &str) -> AppResult<Vec<Season>> {
        let page: JfItemsPage = self
            .get_json(
                format!("{}/Shows/{}/Seasons", self.base_url, series_id),
                &[
                    ("UserId", self.user_id.clone()),
                    ("Fields", "Overview,Genres,CommunityRating".to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|season| {
                let user_data = season.user_data.unwrap_or_default();
                Season {
                    id: season.id,
                    name: season.name.unwrap_or_default(),
                    index_number: season.index_number.unwrap_or(0),
                    episode_count: season.child_count.unwrap_or(0),
                    year: season.production_year,
                    is_played: user_data.played,
                    played_percentage: user_data.played_percentage,
                }
            })
            .collect())
    }

    async fn episodes(
        &self,
        series_id: &str,
        season_id: Option<String>,
    ) -> AppResult<Vec<Episode>> {
        let mut params = vec![
            ("UserId", self.user_id.clone()),
            ("Fields", "Overview,MediaSources,RunTimeTicks".to_string()),
        ];
        if let Some(season_id) = season_id {
            params.push(("SeasonId", season_id));
        }

        let page: JfItemsPage = self
            .get_json(
                format!("{}/Shows/{}/Episodes", self.base_url, series_id),
                &params,
                PRIMARY_TIMEOUT,
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|episode| {
                let user_data = episode.user_data.unwrap_or_default();
                Episode {
                    id: episode.id,
                    name: episode.name.unwrap_or_default(),
                    index_number: episode.index_number.unwrap_or(0),
                    parent_index_number: episode.parent_index_number.unwrap_or(0),
                    overview: episode.overview.unwrap_or_default(),
                    runtime: ticks_to_minutes(episode.run_time_ticks),
                    is_played: user_data.played,
                    playback_position_ticks: user_data.playback_position_ticks,
                    has_media_source: !episode.media_sources.is_empty(),
                }
            })
            .collect())
    }

    async fn grouped_sets(&self, limit: u32) -> AppResult<Vec<MediaItem>> {
        let page: JfItemsPage = self
            .get_json(
                self.user_items_url(),
                &[
                    ("IncludeItemTypes", "BoxSet".to_string()),
                    ("Recursive", "true".to_string()),
                    ("Limit", limit.to_string()),
                    ("Fields", "Overview".to_string()),
                ],
                ENRICHMENT_TIMEOUT,
            )
            .await?;
        Ok(page.items.into_iter().map(normalize_item).collect())
    }

    async fn grouped_set_members(&self, set_id: &str) -> AppResult<Vec<MediaItem>> {
        let page: JfItemsPage = self
            .get_json(
                self.user_items_url(),
                &[
                    ("ParentId", set_id.to_string()),
                    (
                        "Fields",
                        "Overview,Genres,CommunityRating,PremiereDate,RunTimeTicks,ProviderIds"
                            .to_string(),
                    ),
                ],
                ENRICHMENT_TIMEOUT,
            )
            .await?;
        Ok(page.items.into_iter().map(normalize_item).collect())
    }
}

fn auth_header() -> String {
    "MediaBrowser Client=\"DagzFlix\", Device=\"Web\", DeviceId=\"dagzflix-web\", Version=\"1.0\""
        .to_string()
}

fn ticks_to_minutes(ticks: Option<i64>) -> i64 {
    // Round to the nearest minute the way runtimes are displayed
    ticks
        .map(|t| (t + TICKS_PER_MINUTE / 2) / TICKS_PER_MINUTE)
        .unwrap_or(0)
}

fn parse_kind(item_type: &str) -> MediaKind {
    if item_type == "Series" {
        MediaKind::Series
    } else {
        MediaKind::Movie
    }
}

fn tmdb_provider_id(provider_ids: &HashMap<String, String>) -> Option<i64> {
    provider_ids.get("Tmdb").and_then(|id| id.parse().ok())
}

fn normalize_item(item: JfItem) -> MediaItem {
    let user_data = item.user_data.unwrap_or_default();
    MediaItem {
        tmdb_id: tmdb_provider_id(&item.provider_ids),
        id: item.id,
        name: item.name.unwrap_or_default(),
        kind: parse_kind(item.item_type.as_deref().unwrap_or("Movie")),
        overview: item.overview.unwrap_or_default(),
        genres: item.genres,
        community_rating: item.community_rating.unwrap_or(0.0),
        year: item.production_year,
        runtime: ticks_to_minutes(item.run_time_ticks),
        is_played: user_data.played,
        playback_position_ticks: user_data.playback_position_ticks,
        media_status: 0,
        source: ItemSource::Jellyfin,
    }
}

fn normalize_search_hit(item: JfItem) -> UnifiedSearchResult {
    let kind = parse_kind(item.item_type.as_deref().unwrap_or("Movie"));
    UnifiedSearchResult {
        tmdb_id: tmdb_provider_id(&item.provider_ids),
        id: item.id,
        name: item.name.unwrap_or_default(),
        kind,
        media_type: match kind {
            MediaKind::Series => RequestMediaType::Tv,
            MediaKind::Movie => RequestMediaType::Movie,
        },
        overview: item.overview.unwrap_or_default(),
        year: item.production_year,
        vote_average: item.community_rating.unwrap_or(0.0),
        media_status: LOCALLY_AVAILABLE_STATUS,
    }
}

fn normalize_detail(item: JfItem) -> MediaDetail {
    let original_title = item.original_title.clone().unwrap_or_default();
    let official_rating = item.official_rating.clone().unwrap_or_default();
    let people = item
        .people
        .iter()
        .map(|person| Person {
            name: person.name.clone().unwrap_or_default(),
            role: person.role.clone().unwrap_or_default(),
            person_type: person.person_type.clone().unwrap_or_default(),
        })
        .collect();
    let studios = item
        .studios
        .iter()
        .filter_map(|studio| studio.name.clone())
        .collect();
    let taglines = item.taglines.clone();
    let has_subtitles = item.has_subtitles.unwrap_or(false);

    MediaDetail {
        item: normalize_item(item),
        original_title,
        official_rating,
        people,
        studios,
        taglines,
        has_subtitles,
    }
}

// Raw wire DTOs. Jellyfin is PascalCase and omits most fields freely, so
// everything optional-ish stays Option or defaulted.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfItemsPage {
    #[serde(default)]
    items: Vec<JfItem>,
    #[serde(default)]
    total_record_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfItem {
    id: String,
    name: Option<String>,
    #[serde(rename = "Type")]
    item_type: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    community_rating: Option<f64>,
    official_rating: Option<String>,
    original_title: Option<String>,
    production_year: Option<i32>,
    run_time_ticks: Option<i64>,
    user_data: Option<JfUserData>,
    #[serde(default)]
    media_sources: Vec<serde_json::Value>,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
    #[serde(default)]
    people: Vec<JfPerson>,
    #[serde(default)]
    studios: Vec<JfStudio>,
    #[serde(default)]
    taglines: Vec<String>,
    has_subtitles: Option<bool>,
    index_number: Option<i32>,
    parent_index_number: Option<i32>,
    child_count: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfUserData {
    #[serde(default)]
    played: bool,
    #[serde(default)]
    playback_position_ticks: i64,
    #[serde(default)]
    played_percentage: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfPerson {
    name: Option<String>,
    role: Option<String>,
    #[serde(rename = "Type")]
    person_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfStudio {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfAuthResponse {
    user: Option<JfAuthUser>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfAuthUser {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JfSystemInfo {
    server_name: Option<String>,
    version: Option<String>,
}
