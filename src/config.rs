use serde::{Deserialize, Serialize};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Jellyfin server base URL (optional; may also arrive via setup save)
    pub jellyfin_url: Option<String>,

    /// Jellyfin API key
    pub jellyfin_api_key: Option<String>,

    /// Jellyseerr base URL (optional; the service degrades to local-only without it)
    pub jellyseerr_url: Option<String>,

    /// Jellyseerr API key
    pub jellyseerr_api_key: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Initial upstream configuration derived from the environment
    pub fn upstreams(&self) -> UpstreamConfig {
        UpstreamConfig {
            jellyfin: self
                .jellyfin_url
                .as_deref()
                .map(|url| UpstreamEndpoint::new(url, self.jellyfin_api_key.as_deref())),
            jellyseerr: self
                .jellyseerr_url
                .as_deref()
                .map(|url| UpstreamEndpoint::new(url, self.jellyseerr_api_key.as_deref())),
        }
    }
}

/// Base URL + credential for one upstream service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl UpstreamEndpoint {
    /// Normalizes the base URL so adapters can append paths blindly.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.unwrap_or_default().to_string(),
        }
    }
}

/// Runtime-mutable upstream configuration; each service is independently optional
#[derive(Debug, Clone, Default)]
pub struct UpstreamConfig {
    pub jellyfin: Option<UpstreamEndpoint>,
    pub jellyseerr: Option<UpstreamEndpoint>,
}
