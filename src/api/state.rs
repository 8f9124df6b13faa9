use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client as HttpClient;
use tokio::sync::RwLock;

use crate::{
    cache::ResponseCache,
    clients::{JellyfinClient, JellyseerrClient},
    config::{Config, UpstreamConfig},
    error::{AppError, AppResult},
    models::{Session, UserPreferences},
};

/// Shared application state.
///
/// The response cache is the only cross-request shared data the engines see;
/// upstream configuration, the active session, and saved preferences are
/// plain in-memory state behind their own locks.
#[derive(Clone)]
pub struct AppState {
    pub http: HttpClient,
    pub cache: Arc<ResponseCache>,
    pub upstreams: Arc<RwLock<UpstreamConfig>>,
    pub session: Arc<RwLock<Option<Session>>>,
    pub preferences: Arc<RwLock<HashMap<String, UserPreferences>>>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            http: HttpClient::new(),
            cache: Arc::new(ResponseCache::system()),
            upstreams: Arc::new(RwLock::new(config.upstreams())),
            session: Arc::new(RwLock::new(None)),
            preferences: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The active session, or a 401
    pub async fn require_session(&self) -> AppResult<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(AppError::Unauthorized)
    }

    /// Library adapter bound to the active session
    pub async fn library_client(&self, session: &Session) -> AppResult<JellyfinClient> {
        let upstreams = self.upstreams.read().await;
        let endpoint = upstreams
            .jellyfin
            .as_ref()
            .ok_or(AppError::NotConfigured("Jellyfin"))?;
        Ok(JellyfinClient::new(self.http.clone(), endpoint, session))
    }

    /// Fulfillment adapter, when that upstream is configured at all
    pub async fn fulfillment_client(&self) -> Option<JellyseerrClient> {
        let upstreams = self.upstreams.read().await;
        upstreams
            .jellyseerr
            .as_ref()
            .map(|endpoint| JellyseerrClient::new(self.http.clone(), endpoint))
    }

    /// Saved preferences for the user, empty defaults before onboarding
    pub async fn preferences_for(&self, user_id: &str) -> UserPreferences {
        self.preferences
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserPreferences {
                user_id: user_id.to_string(),
                ..UserPreferences::default()
            })
    }
}
