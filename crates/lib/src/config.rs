//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.coordinator/config.json`) and environment.
//! Secrets (page access token, verify token, geocoding key) are usually supplied via env.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messenger page credentials and Graph API settings.
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Geocoding provider settings.
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Per-sender conversation state lifetime.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1"). Put a TLS-terminating proxy in front for Messenger.
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Messenger channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerConfig {
    /// Page access token. Overridden by ACCESS_TOKEN env when set.
    pub access_token: Option<String>,
    /// Token Messenger echoes during webhook verification. Overridden by VERIFY_TOKEN env when set.
    pub verify_token: Option<String>,
    /// Graph API base including version (default "https://graph.facebook.com/v18.0").
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
    /// When true, `serve` subscribes the page and applies greeting, get-started and persistent
    /// menu on startup.
    #[serde(default = "default_true")]
    pub setup_thread: bool,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            verify_token: None,
            graph_api_base: default_graph_api_base(),
            setup_thread: default_true(),
        }
    }
}

/// Geocoding provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodingConfig {
    /// API key appended as `key=`. Overridden by GEOCODING_API_KEY env when set.
    pub api_key: Option<String>,
    /// Lookup endpoint (default Google Geocoding JSON API).
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Upper bound for one lookup request, in seconds (default 10).
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoding_base_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_geocoding_timeout_secs() -> u64 {
    10
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_geocoding_base_url(),
            timeout_secs: default_geocoding_timeout_secs(),
        }
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Conversation state config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationConfig {
    /// Senders inactive for this long are forgotten and start over in idle mode (default 1800).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// How often the eviction sweep runs (default 60).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl ConversationConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Env value trimmed; empty counts as unset.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the page access token: env ACCESS_TOKEN overrides config.
pub fn resolve_access_token(config: &Config) -> Option<String> {
    env_non_empty("ACCESS_TOKEN")
        .or_else(|| config_non_empty(config.messenger.access_token.as_ref()))
}

/// Resolve the webhook verify token: env VERIFY_TOKEN overrides config.
pub fn resolve_verify_token(config: &Config) -> Option<String> {
    env_non_empty("VERIFY_TOKEN")
        .or_else(|| config_non_empty(config.messenger.verify_token.as_ref()))
}

/// Resolve the geocoding API key: env GEOCODING_API_KEY overrides config.
pub fn resolve_geocoding_key(config: &Config) -> Option<String> {
    env_non_empty("GEOCODING_API_KEY")
        .or_else(|| config_non_empty(config.geocoding.api_key.as_ref()))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("COORDINATOR_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".coordinator").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or COORDINATOR_CONFIG_PATH).
/// Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 15152);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 15152);
        assert!(config.messenger.setup_thread);
        assert_eq!(
            config.geocoding.base_url,
            "https://maps.googleapis.com/maps/api/geocode/json"
        );
        assert_eq!(config.geocoding.timeout(), Duration::from_secs(10));
        assert_eq!(config.conversation.idle_timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn camel_case_keys_are_read() {
        let config: Config = serde_json::from_str(
            r#"{
                "messenger": {
                    "verifyToken": "abc",
                    "graphApiBase": "http://localhost:9000",
                    "setupThread": false
                },
                "geocoding": { "timeoutSecs": 3 },
                "conversation": { "idleTimeoutSecs": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.messenger.verify_token.as_deref(), Some("abc"));
        assert_eq!(config.messenger.graph_api_base, "http://localhost:9000");
        assert!(!config.messenger.setup_thread);
        assert_eq!(config.geocoding.timeout_secs, 3);
        assert_eq!(config.conversation.idle_timeout_secs, 5);
        assert_eq!(config.conversation.sweep_interval_secs, 60);
    }

    #[test]
    fn zero_timeouts_are_clamped() {
        let mut config = Config::default();
        config.geocoding.timeout_secs = 0;
        config.conversation.sweep_interval_secs = 0;
        assert_eq!(config.geocoding.timeout(), Duration::from_secs(1));
        assert_eq!(config.conversation.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn blank_config_secret_is_unset() {
        assert_eq!(config_non_empty(Some(&"   ".to_string())), None);
        assert_eq!(
            config_non_empty(Some(&" tok ".to_string())),
            Some("tok".to_string())
        );
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let path = std::env::temp_dir()
            .join(format!("coordinator-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 15152);
    }
}
