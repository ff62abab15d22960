use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;
use super::proxy::{ProxyChain, ProxyEndpoint};

pub const DEFAULT_TARGET_URL: &str =
    "https://rss.marketingtools.apple.com/api/v2/us/music/most-played/50/albums.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,
    /// Upper bound on a single intermediary attempt, not on the whole chain.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Tried strictly in this order.
    #[serde(default = "default_proxies")]
    pub proxies: Vec<ProxyEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_allow_any")]
    pub cors_allow_any: bool,
}

impl FeedConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn proxy_chain(&self) -> ProxyChain {
        ProxyChain::new(self.target_url.clone(), self.proxies.clone())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            proxies: default_proxies(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
            cors_allow_any: default_cors_allow_any(),
        }
    }
}

fn default_target_url() -> String {
    DEFAULT_TARGET_URL.to_string()
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    concat!("chartd/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_proxies() -> Vec<ProxyEndpoint> {
    vec![
        ProxyEndpoint::enveloping("https://api.allorigins.win/get?url={url_encoded}"),
        ProxyEndpoint::transparent("https://corsproxy.io/?{url_encoded}"),
        ProxyEndpoint::transparent("https://api.codetabs.com/v1/proxy?quest={url}"),
    ]
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8979
}

fn default_cors_allow_any() -> bool {
    true
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing defaults there first if it does not exist.
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            http: HttpConfig::default(),
        }
    }
}
