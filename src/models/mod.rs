mod media;
mod preferences;
mod session;
mod status;

pub use media::{
    CollectionSummary, Episode, GenreRef, ItemSource, LibraryPage, MediaDetail, MediaItem,
    MediaKind, MediaRequest, Person, RequestMediaType, SearchPage, Season, Trailer,
    UnifiedSearchResult,
};
pub use preferences::{UserPreferences, WatchHistoryEntry};
pub use session::Session;
pub use status::ReconciledStatus;
