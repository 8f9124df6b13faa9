use std::time::Duration;

/// Upstream client adapters.
///
/// One adapter per upstream service, each exposing typed operations behind an
/// async trait so orchestration logic can be tested against mocks. Adapters
/// normalize loosely-typed upstream payloads into the fixed `models` shapes
/// at this boundary; nothing loosely-typed crosses into the engines.
use crate::error::AppResult;
use crate::models::{
    CollectionSummary, Episode, GenreRef, LibraryPage, MediaDetail, MediaItem, MediaRequest,
    RequestMediaType, SearchPage, Season, Trailer, WatchHistoryEntry,
};

pub mod jellyfin;
pub mod jellyseerr;

pub use jellyfin::JellyfinClient;
pub use jellyseerr::JellyseerrClient;

/// Timeout for calls whose result is the primary payload of a response
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for best-effort enrichment calls (similar items, trailers,
/// trending, collections); these fail fast and degrade
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(8);

/// Identity reported by an upstream when probed during setup
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeInfo {
    pub server_name: Option<String>,
    pub version: Option<String>,
}

/// Discover feed selector on the fulfillment upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverKind {
    Movies,
    Tv,
}

impl DiscoverKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            DiscoverKind::Movies => "movies",
            DiscoverKind::Tv => "tv",
        }
    }
}

/// Typed operations against the library/streaming upstream.
///
/// Every method is one bounded HTTP call; failures surface as errors and the
/// orchestrator decides which ones degrade.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibraryClient: Send + Sync {
    /// One page of the library, filtered and sorted
    async fn library_items(&self, query: LibraryQuery) -> AppResult<LibraryPage>;

    /// Full detail for a single item
    async fn item_detail(&self, item_id: &str) -> AppResult<MediaDetail>;

    /// Titles similar to the given item
    async fn similar_items(&self, item_id: &str, limit: u32) -> AppResult<Vec<MediaItem>>;

    /// Whether the item has at least one playable media source
    async fn has_media_sources(&self, item_id: &str) -> AppResult<bool>;

    /// Played items, newest first
    async fn watch_history(&self, limit: u32) -> AppResult<Vec<WatchHistoryEntry>>;

    /// Random sample of movies and series for ranking
    async fn catalog_sample(&self, limit: u32) -> AppResult<Vec<MediaItem>>;

    /// Library search with the available-locally status sentinel
    async fn search(&self, query: &str, limit: u32) -> AppResult<SearchPage>;

    /// All genres known to the library
    async fn genres(&self) -> AppResult<Vec<GenreRef>>;

    /// Partially-watched items to resume
    async fn resume_items(&self, limit: u32) -> AppResult<Vec<MediaItem>>;

    /// Seasons of a series
    async fn seasons(&self, series_id: &str) -> AppResult<Vec<Season>>;

    /// Episodes of a series, optionally narrowed to one season
    async fn episodes(&self, series_id: &str, season_id: Option<String>)
        -> AppResult<Vec<Episode>>;

    /// Grouped sets (box sets / sagas) known to the library
    async fn grouped_sets(&self, limit: u32) -> AppResult<Vec<MediaItem>>;

    /// Members of one grouped set
    async fn grouped_set_members(&self, set_id: &str) -> AppResult<Vec<MediaItem>>;
}

/// Typed operations against the request-fulfillment upstream.
///
/// The whole upstream is optional; when unconfigured, callers degrade to
/// local-only behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FulfillmentClient: Send + Sync {
    /// Acquisition pipeline code for a title, `None` when unreported
    async fn media_status(
        &self,
        tmdb_id: i64,
        media_type: RequestMediaType,
    ) -> AppResult<Option<i32>>;

    /// World-catalog search
    async fn search(&self, query: &str, page: u32) -> AppResult<SearchPage>;

    /// Trending titles, normalized into catalog items
    async fn discover(&self, kind: DiscoverKind, page: u32) -> AppResult<Vec<MediaItem>>;

    /// Collection id a movie belongs to, if any
    async fn movie_collection_id(&self, tmdb_id: i64) -> AppResult<Option<i64>>;

    /// Collection metadata and member titles
    async fn collection(
        &self,
        collection_id: i64,
    ) -> AppResult<(CollectionSummary, Vec<MediaItem>)>;

    /// YouTube trailer videos for a title
    async fn videos(
        &self,
        tmdb_id: i64,
        media_type: RequestMediaType,
    ) -> AppResult<Vec<Trailer>>;

    /// Submits an acquisition request; the one mutating operation
    async fn submit_request(&self, request: MediaRequest) -> AppResult<serde_json::Value>;
}

/// Library listing parameters, mirroring the upstream's query surface
#[derive(Debug, Clone)]
pub struct LibraryQuery {
    pub item_types: String,
    pub limit: u32,
    pub start_index: u32,
    pub sort_by: String,
    pub sort_order: String,
    pub genre_ids: Option<String>,
    pub search_term: Option<String>,
}

impl Default for LibraryQuery {
    fn default() -> Self {
        Self {
            item_types: "Movie".to_string(),
            limit: 20,
            start_index: 0,
            sort_by: "DateCreated".to_string(),
            sort_order: "Descending".to_string(),
            genre_ids: None,
            search_term: None,
        }
    }
}

/// Status sentinel for library-sourced search hits: anything the library
/// returns is by definition available locally.
pub(crate) const LOCALLY_AVAILABLE_STATUS: i32 = 5;

/// RunTimeTicks are 100 ns units; 600M ticks to the minute
pub(crate) const TICKS_PER_MINUTE: i64 = 600_000_000;
