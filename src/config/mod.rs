//! Configuration management for registry-node
//!
//! Handles configuration loading and validation. Every field carries a
//! serde default so partial files (or none at all) produce a working
//! node; environment variables override the deployment-specific fields.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Content store upstream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the content store; documents live at `{base}/{locator}`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-fetch read timeout (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Attempts per fetch for transient upstream failures
    #[serde(default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// First retry delay; doubles per attempt
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_millis: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/content".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_fetch_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    200
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fetch_timeout_seconds: 10,
            max_fetch_attempts: 3,
            initial_backoff_millis: 200,
        }
    }
}

/// Inline reference resolution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum nesting of sibling references before a document is rejected
    #[serde(default = "default_max_reference_depth")]
    pub max_reference_depth: usize,
}

fn default_max_reference_depth() -> usize {
    8
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_reference_depth: 8,
        }
    }
}

/// File hydration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydratorConfig {
    /// Concurrent file fetches per manifest
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_max_concurrent_fetches() -> usize {
    6
}

impl Default for HydratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 6,
        }
    }
}

/// Document cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the process-wide document cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cached documents (LRU eviction beyond this)
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1024,
        }
    }
}

/// REST API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// End-to-end budget for one resolution request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_listen_addr() -> SocketAddr {
    // Loopback by default; deployments override via config or env
    "127.0.0.1:9432".parse().unwrap()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_seconds: 30,
        }
    }
}

/// Node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub hydrator: HydratorConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl NodeConfig {
    /// Load configuration from file (supports JSON and TOML)
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            let config: NodeConfig = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
            Ok(config)
        } else {
            let config: NodeConfig = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {}", e))?;
            Ok(config)
        }
    }

    /// Apply environment overrides for deployment-specific fields
    ///
    /// `REGISTRY_UPSTREAM_URL` replaces the content store base URL and
    /// `REGISTRY_LISTEN_ADDR` the server listening address.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(url) = std::env::var("REGISTRY_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }
        if let Ok(addr) = std::env::var("REGISTRY_LISTEN_ADDR") {
            self.server.listen_addr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid REGISTRY_LISTEN_ADDR {addr:?}: {e}"))?;
        }
        Ok(())
    }
}
