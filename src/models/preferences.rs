use serde::{Deserialize, Serialize};

/// Per-user genre preferences collected at onboarding.
///
/// Saves are a full replace, never a merge; everything else reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub user_id: String,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub disliked_genres: Vec<String>,
    #[serde(default)]
    pub onboarding_complete: bool,
}

impl UserPreferences {
    /// Creates preferences as saved by the onboarding flow
    pub fn new(user_id: &str, favorite_genres: Vec<String>, disliked_genres: Vec<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            favorite_genres,
            disliked_genres,
            onboarding_complete: true,
        }
    }
}

/// One entry of the user's watch history, newest first as the upstream
/// returns it. Read-only snapshot fetched per scoring request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchHistoryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}
