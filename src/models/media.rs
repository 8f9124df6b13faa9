use serde::{Deserialize, Serialize};

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Series,
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::Movie
    }
}

/// Which upstream a normalized item came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Jellyfin,
    Jellyseerr,
}

/// Media type expected by the fulfillment upstream's URL scheme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestMediaType {
    Movie,
    Tv,
}

impl Default for RequestMediaType {
    fn default() -> Self {
        RequestMediaType::Movie
    }
}

impl RequestMediaType {
    /// URL path segment on the fulfillment upstream
    pub fn as_path(&self) -> &'static str {
        match self {
            RequestMediaType::Movie => "movie",
            RequestMediaType::Tv => "tv",
        }
    }
}

/// A catalog entry normalized from either upstream.
///
/// Adapters map loosely-typed upstream payloads into this shape at the
/// boundary; missing fields are defaulted there, never downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Library item id, or a `tmdb-{id}` synthetic id for world-catalog items
    pub id: String,
    pub tmdb_id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub overview: String,
    /// Genre names; TMDB numeric ids are resolved before items reach here
    pub genres: Vec<String>,
    /// 0-10; best available of community rating / public vote average
    pub community_rating: f64,
    pub year: Option<i32>,
    /// Runtime in whole minutes, 0 when unknown
    pub runtime: i64,
    pub is_played: bool,
    pub playback_position_ticks: i64,
    /// Raw fulfillment pipeline code, 0 when none was reported
    pub media_status: i32,
    pub source: ItemSource,
}

/// One page of library items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPage {
    pub items: Vec<MediaItem>,
    pub total_count: i64,
}

/// A search hit normalized from either search source.
///
/// `media_status` carries the fulfillment code when the hit came from the
/// fulfillment upstream, and the available-locally sentinel (5) when it came
/// from the library fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedSearchResult {
    pub id: String,
    pub tmdb_id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub media_type: RequestMediaType,
    pub overview: String,
    pub year: Option<i32>,
    pub vote_average: f64,
    pub media_status: i32,
}

/// One page of unified search results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<UnifiedSearchResult>,
    pub total_results: i64,
    #[serde(default)]
    pub total_pages: Option<i64>,
}

/// Collection (saga / grouped set) metadata; members travel separately
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub overview: String,
}

/// A person credited on an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub person_type: String,
}

/// Full detail view of a library item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetail {
    #[serde(flatten)]
    pub item: MediaItem,
    pub original_title: String,
    pub official_rating: String,
    pub people: Vec<Person>,
    pub studios: Vec<String>,
    pub taglines: Vec<String>,
    pub has_subtitles: bool,
}

/// A season of a series
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: String,
    pub name: String,
    pub index_number: i32,
    pub episode_count: i32,
    pub year: Option<i32>,
    pub is_played: bool,
    pub played_percentage: f64,
}

/// An episode within a season
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub name: String,
    pub index_number: i32,
    pub parent_index_number: i32,
    pub overview: String,
    pub runtime: i64,
    pub is_played: bool,
    pub playback_position_ticks: i64,
    pub has_media_source: bool,
}

/// Genre reference from the library upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreRef {
    pub id: String,
    pub name: String,
}

/// A trailer video reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trailer {
    pub id: String,
    pub name: String,
    pub url: String,
    pub youtube_key: String,
    pub source: String,
}

/// A media acquisition request submitted to the fulfillment upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub tmdb_id: i64,
    pub media_type: RequestMediaType,
    pub seasons: Option<Vec<i32>>,
}
