// src/config/service.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyze::weights::DEFAULT_WEIGHTS_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "config/trending.toml";
pub const ENV_CONFIG_PATH: &str = "TRENDING_CONFIG_PATH";
pub const ENV_SOURCE_TIMEOUT_MS: &str = "TRENDING_SOURCE_TIMEOUT_MS";
pub const ENV_CACHE_TTL_SECS: &str = "TRENDING_CACHE_TTL_SECS";
pub const ENV_CACHE_CAPACITY: &str = "TRENDING_CACHE_CAPACITY";

fn default_fixture_path() -> PathBuf {
    PathBuf::from("config/fixtures/listings.json")
}

/// Where listings come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpstreamConfig {
    Fixture {
        #[serde(default = "default_fixture_path")]
        path: PathBuf,
    },
    Http {
        endpoint: String,
    },
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig::Fixture {
            path: default_fixture_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Per-source query timeout.
    pub source_timeout_ms: u64,
    /// Upstream response cache; 0 disables it.
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub upstream: UpstreamConfig,
    /// JSON array of ids the caller already stores.
    pub known_ids_path: Option<PathBuf>,
    pub weights_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 10_000,
            cache_ttl_secs: 300,
            cache_capacity: 256,
            upstream: UpstreamConfig::default(),
            known_ids_path: None,
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
        }
    }
}

impl ServiceConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading service config from {}", path.display()))?;
        let mut cfg: ServiceConfig = toml::from_str(&content)
            .with_context(|| format!("parsing service config {}", path.display()))?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $TRENDING_CONFIG_PATH (must exist)
    /// 2) config/trending.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Numeric env overrides; unparsable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>(ENV_SOURCE_TIMEOUT_MS) {
            self.source_timeout_ms = v;
        }
        if let Some(v) = env_parse::<u64>(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_CACHE_CAPACITY) {
            self.cache_capacity = v;
        }
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(target: "trending", var = name, value = %raw, "ignoring unparsable env override");
            None
        }
    }
}
