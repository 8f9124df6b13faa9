use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    cache::CacheKey,
    cached,
    clients::{
        DiscoverKind, FulfillmentClient, JellyfinClient, JellyseerrClient, LibraryClient,
        LibraryQuery,
    },
    config::UpstreamEndpoint,
    error::{AppError, AppResult},
    models::{
        Episode, GenreRef, LibraryPage, MediaDetail, MediaItem, MediaRequest, RequestMediaType,
        Season, Trailer, UserPreferences,
    },
    services::orchestrator::{
        self, CollectionResponse, Era, RecommendationsResponse, RuntimePref, SearchResponse,
        StatusResponse, WizardFilters, WizardResponse,
    },
};

use super::AppState;

const SIMILAR_LIMIT: u32 = 12;
const RESUME_LIMIT: u32 = 20;

// Request/Response types

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCheckResponse {
    pub setup_complete: bool,
    pub jellyfin_configured: bool,
    pub jellyseerr_configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupTestRequest {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupTestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSaveRequest {
    pub jellyfin_url: Option<String>,
    pub jellyfin_api_key: Option<String>,
    pub jellyseerr_url: Option<String>,
    pub jellyseerr_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
    pub onboarding_complete: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub onboarding_complete: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub preferences: UserPreferences,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesSaveRequest {
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub disliked_genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryParams {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub limit: Option<u32>,
    pub start_index: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub genre_ids: Option<String>,
    pub search_term: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenresResponse {
    pub genres: Vec<GenreRef>,
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub item: MediaDetail,
    pub similar: Vec<MediaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonsParams {
    pub series_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonsResponse {
    pub seasons: Vec<Season>,
    pub series_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesParams {
    pub series_id: Option<String>,
    pub season_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesResponse {
    pub episodes: Vec<Episode>,
    pub series_id: String,
    pub season_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    pub id: Option<String>,
    pub tmdb_id: Option<i64>,
    pub media_type: Option<RequestMediaType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequestBody {
    pub tmdb_id: Option<i64>,
    pub media_type: Option<RequestMediaType>,
    pub seasons: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerParams {
    pub id: Option<String>,
    pub tmdb_id: Option<i64>,
    pub media_type: Option<RequestMediaType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrailerResponse {
    pub trailers: Vec<Trailer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionParams {
    pub id: Option<String>,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverParams {
    #[serde(rename = "type")]
    pub feed_type: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub results: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
pub struct WizardParams {
    pub era: Option<String>,
    pub mood: Option<String>,
    pub runtime: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

// Handlers

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Reports whether the upstreams have been configured yet
pub async fn setup_check(State(state): State<AppState>) -> AppResult<Json<SetupCheckResponse>> {
    let key = CacheKey::new("setup/check", &[]);
    let response = cached!(state.cache, key, async {
        let upstreams = state.upstreams.read().await;
        Ok(SetupCheckResponse {
            setup_complete: upstreams.jellyfin.is_some(),
            jellyfin_configured: upstreams.jellyfin.is_some(),
            jellyseerr_configured: upstreams.jellyseerr.is_some(),
        })
    })?;
    Ok(Json(response))
}

/// Probes an upstream with candidate credentials before saving them
pub async fn setup_test(
    State(state): State<AppState>,
    Json(request): Json<SetupTestRequest>,
) -> AppResult<Json<SetupTestResponse>> {
    let service_type = request
        .service_type
        .as_deref()
        .filter(|value| !value.is_empty());
    let url = request.url.as_deref().filter(|value| !value.is_empty());
    let (Some(service_type), Some(url)) = (service_type, url) else {
        return Err(AppError::InvalidInput("type and url are required".to_string()));
    };

    let endpoint = UpstreamEndpoint::new(url, request.api_key.as_deref());
    let info = match service_type {
        "jellyfin" => JellyfinClient::probe(&state.http, &endpoint).await?,
        "jellyseerr" => JellyseerrClient::probe(&state.http, &endpoint).await?,
        other => {
            return Err(AppError::InvalidInput(format!(
                "unknown service type: {other}"
            )))
        }
    };

    Ok(Json(SetupTestResponse {
        success: true,
        server_name: info.server_name,
        version: info.version,
    }))
}

/// Replaces the upstream configuration
pub async fn setup_save(
    State(state): State<AppState>,
    Json(request): Json<SetupSaveRequest>,
) -> AppResult<Json<Value>> {
    let Some(jellyfin_url) = request.jellyfin_url.filter(|url| !url.is_empty()) else {
        return Err(AppError::InvalidInput("jellyfinUrl is required".to_string()));
    };

    {
        let mut upstreams = state.upstreams.write().await;
        upstreams.jellyfin = Some(UpstreamEndpoint::new(
            &jellyfin_url,
            request.jellyfin_api_key.as_deref(),
        ));
        upstreams.jellyseerr = request
            .jellyseerr_url
            .filter(|url| !url.is_empty())
            .map(|url| UpstreamEndpoint::new(&url, request.jellyseerr_api_key.as_deref()));
    }

    state.cache.invalidate("setup");
    tracing::info!("upstream configuration saved");

    Ok(Json(json!({ "success": true })))
}

/// Proxies authentication to the library upstream and opens the session
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = request.username.as_deref().filter(|value| !value.is_empty());
    let password = request.password.as_deref().filter(|value| !value.is_empty());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::InvalidInput(
            "username and password are required".to_string(),
        ));
    };

    let endpoint = state
        .upstreams
        .read()
        .await
        .jellyfin
        .clone()
        .ok_or(AppError::NotConfigured("Jellyfin"))?;

    let session = JellyfinClient::authenticate(&state.http, &endpoint, username, password).await?;
    let onboarding_complete = state
        .preferences
        .read()
        .await
        .get(&session.user_id)
        .map(|preferences| preferences.onboarding_complete)
        .unwrap_or(false);

    let user = UserInfo {
        id: session.user_id.clone(),
        name: session.user_name.clone(),
    };
    *state.session.write().await = Some(session);
    state.cache.invalidate("auth");

    Ok(Json(LoginResponse {
        success: true,
        user,
        onboarding_complete,
    }))
}

/// Closes the active session
pub async fn logout(State(state): State<AppState>) -> Json<Value> {
    *state.session.write().await = None;
    state.cache.invalidate("auth");
    Json(json!({ "success": true }))
}

/// Reports the current session
pub async fn auth_session(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let key = CacheKey::new("auth/session", &[]);
    let response = cached!(state.cache, key, async {
        let session = state.session.read().await.clone();
        Ok(match session {
            Some(session) => {
                let onboarding_complete = state
                    .preferences
                    .read()
                    .await
                    .get(&session.user_id)
                    .map(|preferences| preferences.onboarding_complete)
                    .unwrap_or(false);
                SessionResponse {
                    authenticated: true,
                    user: Some(UserInfo {
                        id: session.user_id,
                        name: session.user_name,
                    }),
                    onboarding_complete,
                }
            }
            None => SessionResponse {
                authenticated: false,
                user: None,
                onboarding_complete: false,
            },
        })
    })?;
    Ok(Json(response))
}

/// Returns the user's saved genre preferences
pub async fn preferences_get(
    State(state): State<AppState>,
) -> AppResult<Json<PreferencesResponse>> {
    let session = state.require_session().await?;
    let key = CacheKey::new("preferences", &[("userId", &session.user_id)]);
    let response = cached!(state.cache, key, async {
        Ok(PreferencesResponse {
            preferences: state.preferences_for(&session.user_id).await,
        })
    })?;
    Ok(Json(response))
}

/// Saves genre preferences; a full replace, and it completes onboarding
pub async fn preferences_save(
    State(state): State<AppState>,
    Json(request): Json<PreferencesSaveRequest>,
) -> AppResult<Json<Value>> {
    let session = state.require_session().await?;
    let preferences = UserPreferences::new(
        &session.user_id,
        request.favorite_genres,
        request.disliked_genres,
    );
    state
        .preferences
        .write()
        .await
        .insert(session.user_id.clone(), preferences);

    state.cache.invalidate("preferences");
    state.cache.invalidate("recommendations");
    tracing::info!(user_id = %session.user_id, "preferences saved");

    Ok(Json(json!({ "success": true })))
}

/// One page of the library
pub async fn media_library(
    State(state): State<AppState>,
    Query(params): Query<LibraryParams>,
) -> AppResult<Json<LibraryPage>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;

    let query = LibraryQuery {
        item_types: params.item_type.unwrap_or_else(|| "Movie".to_string()),
        limit: params.limit.unwrap_or(20),
        start_index: params.start_index.unwrap_or(0),
        sort_by: params.sort_by.unwrap_or_else(|| "DateCreated".to_string()),
        sort_order: params.sort_order.unwrap_or_else(|| "Descending".to_string()),
        genre_ids: params.genre_ids.filter(|value| !value.is_empty()),
        search_term: params.search_term.filter(|value| !value.is_empty()),
    };

    let limit = query.limit.to_string();
    let start_index = query.start_index.to_string();
    let key = CacheKey::new(
        "media/library",
        &[
            ("type", query.item_types.as_str()),
            ("limit", limit.as_str()),
            ("startIndex", start_index.as_str()),
            ("sortBy", query.sort_by.as_str()),
            ("sortOrder", query.sort_order.as_str()),
            ("genreIds", query.genre_ids.as_deref().unwrap_or("")),
            ("searchTerm", query.search_term.as_deref().unwrap_or("")),
        ],
    );

    let response = cached!(state.cache, key, async {
        library.library_items(query.clone()).await
    })?;
    Ok(Json(response))
}

/// Genres known to the library
pub async fn media_genres(State(state): State<AppState>) -> AppResult<Json<GenresResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;

    let key = CacheKey::new("media/genres", &[]);
    let response = cached!(state.cache, key, async {
        Ok(GenresResponse {
            genres: library.genres().await?,
        })
    })?;
    Ok(Json(response))
}

/// Full detail for one item, with best-effort similar titles
pub async fn media_detail(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> AppResult<Json<DetailResponse>> {
    let session = state.require_session().await?;
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return Err(AppError::InvalidInput("id is required".to_string()));
    };
    let library = state.library_client(&session).await?;

    let key = CacheKey::new("media/detail", &[("id", &id)]);
    let response = cached!(state.cache, key, async {
        let (detail, similar) = tokio::join!(
            library.item_detail(&id),
            library.similar_items(&id, SIMILAR_LIMIT),
        );
        let item = detail?;
        let similar = similar.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "similar items unavailable");
            Vec::new()
        });
        Ok(DetailResponse { item, similar })
    })?;
    Ok(Json(response))
}

/// Partially-watched items to continue
pub async fn media_resume(State(state): State<AppState>) -> AppResult<Json<ResumeResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;

    let key = CacheKey::new("media/resume", &[]);
    let response = cached!(state.cache, key, async {
        Ok(ResumeResponse {
            items: library.resume_items(RESUME_LIMIT).await?,
        })
    })?;
    Ok(Json(response))
}

/// Seasons of a series
pub async fn media_seasons(
    State(state): State<AppState>,
    Query(params): Query<SeasonsParams>,
) -> AppResult<Json<SeasonsResponse>> {
    let session = state.require_session().await?;
    let Some(series_id) = params.series_id.filter(|id| !id.is_empty()) else {
        return Err(AppError::InvalidInput("seriesId is required".to_string()));
    };
    let library = state.library_client(&session).await?;

    let key = CacheKey::new("media/seasons", &[("seriesId", &series_id)]);
    let response = cached!(state.cache, key, async {
        Ok(SeasonsResponse {
            seasons: library.seasons(&series_id).await?,
            series_id: series_id.clone(),
        })
    })?;
    Ok(Json(response))
}

/// Episodes of a series, optionally one season
pub async fn media_episodes(
    State(state): State<AppState>,
    Query(params): Query<EpisodesParams>,
) -> AppResult<Json<EpisodesResponse>> {
    let session = state.require_session().await?;
    let Some(series_id) = params.series_id.filter(|id| !id.is_empty()) else {
        return Err(AppError::InvalidInput("seriesId is required".to_string()));
    };
    let season_id = params.season_id.filter(|id| !id.is_empty());
    let library = state.library_client(&session).await?;

    let key = CacheKey::new(
        "media/episodes",
        &[
            ("seriesId", series_id.as_str()),
            ("seasonId", season_id.as_deref().unwrap_or("")),
        ],
    );
    let response = cached!(state.cache, key, async {
        Ok(EpisodesResponse {
            episodes: library.episodes(&series_id, season_id.clone()).await?,
            series_id: series_id.clone(),
            season_id: season_id.clone(),
        })
    })?;
    Ok(Json(response))
}

/// Smart Button status for one title
pub async fn media_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> AppResult<Json<StatusResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;
    let fulfillment = state.fulfillment_client().await;
    let media_type = params.media_type.unwrap_or_default();

    let tmdb_id = params.tmdb_id.map(|id| id.to_string()).unwrap_or_default();
    let key = CacheKey::new(
        "media/status",
        &[
            ("id", params.id.as_deref().unwrap_or("")),
            ("tmdbId", tmdb_id.as_str()),
            ("mediaType", media_type.as_path()),
        ],
    );

    let response = cached!(state.cache, key, async {
        Ok(orchestrator::media_status(
            &library,
            fulfillment.as_ref().map(|client| client as &dyn FulfillmentClient),
            params.id.as_deref(),
            params.tmdb_id,
            media_type,
        )
        .await)
    })?;
    Ok(Json(response))
}

/// Submits an acquisition request to the fulfillment upstream
pub async fn media_request(
    State(state): State<AppState>,
    Json(request): Json<MediaRequestBody>,
) -> AppResult<Json<Value>> {
    let _session = state.require_session().await?;
    let Some(tmdb_id) = request.tmdb_id else {
        return Err(AppError::InvalidInput("tmdbId is required".to_string()));
    };
    let fulfillment = state
        .fulfillment_client()
        .await
        .ok_or(AppError::NotConfigured("Jellyseerr"))?;

    let submitted = fulfillment
        .submit_request(MediaRequest {
            tmdb_id,
            media_type: request.media_type.unwrap_or_default(),
            seasons: request.seasons,
        })
        .await?;

    Ok(Json(json!({ "success": true, "request": submitted })))
}

/// Trailer videos for a title, best-effort
pub async fn media_trailer(
    State(state): State<AppState>,
    Query(params): Query<TrailerParams>,
) -> AppResult<Json<TrailerResponse>> {
    let _session = state.require_session().await?;
    if params.id.as_deref().unwrap_or("").is_empty() && params.tmdb_id.is_none() {
        return Err(AppError::InvalidInput("id or tmdbId is required".to_string()));
    }
    let fulfillment = state.fulfillment_client().await;
    let media_type = params.media_type.unwrap_or_default();

    let tmdb_id = params.tmdb_id.map(|id| id.to_string()).unwrap_or_default();
    let key = CacheKey::new(
        "media/trailer",
        &[
            ("tmdbId", tmdb_id.as_str()),
            ("mediaType", media_type.as_path()),
        ],
    );

    let response = cached!(state.cache, key, async {
        let trailers = match (&fulfillment, params.tmdb_id) {
            (Some(client), Some(tmdb_id)) => {
                client.videos(tmdb_id, media_type).await.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "trailer lookup failed");
                    Vec::new()
                })
            }
            _ => Vec::new(),
        };
        Ok(TrailerResponse { trailers })
    })?;
    Ok(Json(response))
}

/// The saga a title belongs to
pub async fn media_collection(
    State(state): State<AppState>,
    Query(params): Query<CollectionParams>,
) -> AppResult<Json<CollectionResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;
    let fulfillment = state.fulfillment_client().await;

    let tmdb_id = params.tmdb_id.map(|id| id.to_string()).unwrap_or_default();
    let key = CacheKey::new(
        "media/collection",
        &[
            ("id", params.id.as_deref().unwrap_or("")),
            ("tmdbId", tmdb_id.as_str()),
        ],
    );

    let response = cached!(state.cache, key, async {
        orchestrator::collection(
            &library,
            fulfillment.as_ref().map(|client| client as &dyn FulfillmentClient),
            params.id.as_deref(),
            params.tmdb_id,
        )
        .await
    })?;
    Ok(Json(response))
}

/// Unified search across both upstreams
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;
    let fulfillment = state.fulfillment_client().await;
    let query = params.q.unwrap_or_default();
    let page = params.page.unwrap_or(1);

    let page_str = page.to_string();
    let key = CacheKey::new("search", &[("q", query.as_str()), ("page", page_str.as_str())]);

    let response = cached!(state.cache, key, async {
        orchestrator::search(
            &library,
            fulfillment.as_ref().map(|client| client as &dyn FulfillmentClient),
            &query,
            page,
        )
        .await
    })?;
    Ok(Json(response))
}

/// Trending feed from the fulfillment upstream
pub async fn discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverParams>,
) -> AppResult<Json<DiscoverResponse>> {
    let _session = state.require_session().await?;
    let fulfillment = state.fulfillment_client().await;
    let kind = match params.feed_type.as_deref() {
        Some("tv") => DiscoverKind::Tv,
        _ => DiscoverKind::Movies,
    };
    let page = params.page.unwrap_or(1);

    let page_str = page.to_string();
    let key = CacheKey::new(
        "discover",
        &[("type", kind.as_path()), ("page", page_str.as_str())],
    );

    let response = cached!(state.cache, key, async {
        let results = match &fulfillment {
            Some(client) => client.discover(kind, page).await?,
            None => Vec::new(),
        };
        Ok(DiscoverResponse { results })
    })?;
    Ok(Json(response))
}

/// Guided discovery with era, mood and runtime filters
pub async fn wizard_discover(
    State(state): State<AppState>,
    Query(params): Query<WizardParams>,
) -> AppResult<Json<WizardResponse>> {
    let _session = state.require_session().await?;
    let fulfillment = state.fulfillment_client().await;

    let era_param = params.era.unwrap_or_else(|| "all".to_string());
    let runtime_param = params.runtime.unwrap_or_else(|| "any".to_string());
    let type_param = params.media_type.unwrap_or_else(|| "movie".to_string());
    let mood = params.mood.filter(|mood| !mood.is_empty());

    let filters = WizardFilters {
        era: match era_param.as_str() {
            "classic" => Era::Classic,
            "90s" => Era::Nineties,
            "2000s" => Era::TwoThousands,
            "recent" => Era::Recent,
            _ => Era::All,
        },
        mood: mood.clone(),
        runtime: match runtime_param.as_str() {
            "short" => RuntimePref::Short,
            "medium" => RuntimePref::Medium,
            "long" => RuntimePref::Long,
            _ => RuntimePref::Any,
        },
        media_type: match type_param.as_str() {
            "tv" => RequestMediaType::Tv,
            _ => RequestMediaType::Movie,
        },
    };

    let key = CacheKey::new(
        "wizard/discover",
        &[
            ("era", era_param.as_str()),
            ("mood", mood.as_deref().unwrap_or("")),
            ("runtime", runtime_param.as_str()),
            ("type", type_param.as_str()),
        ],
    );

    let response = cached!(state.cache, key, async {
        orchestrator::wizard_discover(
            fulfillment.as_ref().map(|client| client as &dyn FulfillmentClient),
            &filters,
            Utc::now(),
        )
        .await
    })?;
    Ok(Json(response))
}

/// Personalized DagzRank ranking
pub async fn recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<RecommendationsResponse>> {
    let session = state.require_session().await?;
    let library = state.library_client(&session).await?;
    let fulfillment = state.fulfillment_client().await;
    let preferences = state.preferences_for(&session.user_id).await;

    let key = CacheKey::new("recommendations", &[("userId", &session.user_id)]);
    let response = cached!(state.cache, key, async {
        orchestrator::recommendations(
            &library,
            fulfillment.as_ref().map(|client| client as &dyn FulfillmentClient),
            &preferences,
            Utc::now(),
        )
        .await
    })?;
    Ok(Json(response))
}
