//! Bounded TTL response cache fronting all upstream calls.
//!
//! Keys carry the full request identity (route + sorted query parameters);
//! TTLs are resolved by longest-prefix match against a static policy table.
//! Expired entries are evicted lazily on access; there is no background
//! sweeper.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

mod macros;

/// Clock abstraction so expiry is testable without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// TTL policy in seconds, resolved by longest matching key prefix
const TTL_POLICY: &[(&str, i64)] = &[
    ("setup/check", 120),
    ("auth/session", 60),
    ("media/library", 300),
    ("media/detail", 600),
    ("media/seasons", 600),
    ("media/episodes", 600),
    ("media/trailer", 3600),
    ("media/collection", 3600),
    ("media/status", 60),
    ("media/resume", 300),
    ("search", 120),
    ("discover", 300),
    ("recommendations", 300),
    ("wizard", 120),
];

/// Conservative fallback for keys no policy prefix matches
const DEFAULT_TTL_SECS: i64 = 60;

/// Resolves the TTL for a cache key by longest-prefix match
pub fn resolve_ttl(key: &str) -> Duration {
    let secs = TTL_POLICY
        .iter()
        .filter(|(prefix, _)| key.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, secs)| *secs)
        .unwrap_or(DEFAULT_TTL_SECS);
    Duration::seconds(secs)
}

/// Full request identity: route plus its query parameters.
///
/// Parameters are sorted and empty values dropped, so two requests with the
/// same route and parameters always map to the same key regardless of
/// parameter order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(route: &str, params: &[(&str, &str)]) -> Self {
        let mut pairs: Vec<&(&str, &str)> =
            params.iter().filter(|(_, value)| !value.is_empty()).collect();
        pairs.sort();

        if pairs.is_empty() {
            return Self(route.to_string());
        }

        let query = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("{route}?{query}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct CacheEntry {
    payload: serde_json::Value,
    written_at: DateTime<Utc>,
}

/// In-process TTL cache for shaped upstream responses.
///
/// Safe for concurrent handler access; operations never suspend and never
/// perform I/O. Only idempotent (read) responses belong in here.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Cache backed by the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Retrieves a cached payload, treating any entry at or past its TTL as
    /// a miss and evicting it.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let ttl = resolve_ttl(key.as_str());
        let now = self.clock.now();

        let mut expired = false;
        let hit = {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key.as_str()) {
                Some(entry) if now - entry.written_at < ttl => {
                    serde_json::from_value(entry.payload.clone()).ok()
                }
                Some(_) => {
                    expired = true;
                    None
                }
                None => None,
            }
        };

        if expired {
            self.entries
                .write()
                .expect("cache lock poisoned")
                .remove(key.as_str());
            tracing::debug!(key = %key, "cache entry expired");
        }

        hit
    }

    /// Stores a payload under the key, superseding any previous entry.
    ///
    /// A payload that fails to serialize is logged and skipped; caching is
    /// never worth failing the request over.
    pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache serialization failed, skipping");
                return;
            }
        };

        let entry = CacheEntry {
            payload,
            written_at: self.clock.now(),
        };
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(key.as_str().to_string(), entry);
    }

    /// Removes every key starting with `prefix`; used after state-changing
    /// operations so stale personalized data is never served.
    pub fn invalidate(&self, prefix: &str) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        tracing::debug!(prefix, dropped = before - entries.len(), "cache invalidated");
    }

    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
