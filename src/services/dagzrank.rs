//! DagzRank scoring engine.
//!
//! Scores a catalog item 0-100 against the user's genre preferences and
//! watch history:
//!
//! - Genre match (0-40): favorite/disliked genre overlap
//! - Watch-history affinity (0-25): genres the user actually watches
//! - Community score (0-20): public rating normalized
//! - Freshness bonus (0-10): recent releases
//! - Already-watched penalty: -50
//!
//! Pure: no I/O, no clock access beyond the passed-in `now`.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::models::{MediaItem, UserPreferences, WatchHistoryEntry};

const GENRE_WEIGHT: f64 = 40.0;
const DISLIKE_WEIGHT: f64 = 20.0;
/// Flat contribution when the item or the user has no genre data
const GENRE_DEFAULT: f64 = 15.0;
const AFFINITY_CAP: f64 = 25.0;
/// Flat contribution for users with no watch history yet
const AFFINITY_DEFAULT: f64 = 10.0;
const COMMUNITY_WEIGHT: f64 = 20.0;
const WATCHED_PENALTY: f64 = 50.0;

/// Computes the DagzRank score for one item.
///
/// Deterministic for identical inputs; always in [0, 100]. Genre comparison
/// is case-insensitive since the two upstreams disagree on casing.
pub fn score(
    item: &MediaItem,
    preferences: &UserPreferences,
    watch_history: &[WatchHistoryEntry],
    now: DateTime<Utc>,
) -> u32 {
    let mut score = 0.0;
    let item_genres: Vec<String> = item.genres.iter().map(|g| g.to_lowercase()).collect();

    // 1. Genre match (0-40)
    if !item_genres.is_empty() && !preferences.favorite_genres.is_empty() {
        let favorites: Vec<String> = preferences
            .favorite_genres
            .iter()
            .map(|g| g.to_lowercase())
            .collect();
        let disliked: Vec<String> = preferences
            .disliked_genres
            .iter()
            .map(|g| g.to_lowercase())
            .collect();

        let genre_count = item_genres.len() as f64;
        let matches = item_genres.iter().filter(|g| favorites.contains(g)).count() as f64;
        let dislikes = item_genres.iter().filter(|g| disliked.contains(g)).count() as f64;

        let genre_score = matches / genre_count * GENRE_WEIGHT;
        let dislike_penalty = dislikes / genre_count * DISLIKE_WEIGHT;
        score += (genre_score - dislike_penalty).max(0.0);
    } else {
        score += GENRE_DEFAULT;
    }

    // 2. Watch-history affinity (0-25): each of the item's genres contributes
    // its relative weight in the history, summed and capped at 25.
    if !watch_history.is_empty() {
        let mut history_genres: HashMap<String, u32> = HashMap::new();
        for entry in watch_history {
            for genre in &entry.genres {
                *history_genres.entry(genre.to_lowercase()).or_insert(0) += 1;
            }
        }

        let max_count = history_genres.values().copied().max().unwrap_or(0).max(1) as f64;
        let affinity: f64 = item_genres
            .iter()
            .filter_map(|genre| history_genres.get(genre))
            .map(|&count| count as f64 / max_count * AFFINITY_CAP)
            .sum();
        score += affinity.min(AFFINITY_CAP);
    } else {
        score += AFFINITY_DEFAULT;
    }

    // 3. Community score (0-20)
    score += item.community_rating / 10.0 * COMMUNITY_WEIGHT;

    // 4. Freshness bonus (0-10) by whole-year age
    if let Some(year) = item.year {
        let age = now.year() - year;
        score += match age {
            a if a <= 1 => 10.0,
            a if a <= 3 => 7.0,
            a if a <= 5 => 4.0,
            a if a <= 10 => 2.0,
            _ => 0.0,
        };
    }

    // 5. Already-watched penalty, floored before the final clamp
    if item.is_played {
        score = (score - WATCHED_PENALTY).max(0.0);
    }

    score.min(100.0).round() as u32
}
