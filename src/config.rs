// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const TEMPLATE: &str = include_str!("../config-templates/default.toml");

/// Target site and the fixed page set to scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Section id -> path relative to `base_url`
    pub pages: BTreeMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let pages = [("home", ""), ("programs", "programs"), ("admissions", "admissions")]
            .into_iter()
            .map(|(id, path)| (id.to_string(), path.to_string()))
            .collect();

        Self {
            base_url: "https://www.mptigh.com/".to_string(),
            user_agent: "MPTI-Chatbot/1.0".to_string(),
            pages,
        }
    }
}

/// HTTP fetch and extraction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub read_timeout_floor_secs: u64,
    pub read_timeout_ceiling_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_delay_cap_ms: u64,
    /// One relaxed last-chance attempt after the retry budget is spent
    pub aggressive: bool,
    pub max_body_bytes: usize,
    pub content_max_chars: usize,
    pub min_content_chars: usize,
    /// Whole-body text at or under this length is treated as a placeholder page
    pub min_body_chars: usize,
    pub extract_links: bool,
    pub content_selectors: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            read_timeout_floor_secs: 5,
            read_timeout_ceiling_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 2000,
            retry_delay_cap_ms: 10_000,
            aggressive: false,
            max_body_bytes: 500 * 1024,
            content_max_chars: 1800,
            min_content_chars: 100,
            min_body_chars: 50,
            extract_links: true,
            content_selectors: [
                "main",
                ".content",
                "#content",
                ".main-content",
                "#main-content",
                ".entry-content",
                ".post-content",
                "article",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl FetchConfig {
    /// Profile for a site that is known to drop connections and stall
    pub fn aggressive() -> Self {
        Self {
            connect_timeout_secs: 15,
            read_timeout_secs: 45,
            max_retries: 8,
            retry_base_delay_ms: 3000,
            retry_delay_cap_ms: 15_000,
            aggressive: true,
            content_max_chars: 4000,
            ..Self::default()
        }
    }

    /// These settings with only the aggressive retry, timeout and delay knobs applied
    pub fn with_aggressive_retries(&self) -> Self {
        let preset = Self::aggressive();
        Self {
            connect_timeout_secs: preset.connect_timeout_secs,
            read_timeout_secs: preset.read_timeout_secs,
            max_retries: preset.max_retries,
            retry_base_delay_ms: preset.retry_base_delay_ms,
            retry_delay_cap_ms: preset.retry_delay_cap_ms,
            aggressive: true,
            ..self.clone()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout clamped into `[floor, ceiling]`
    pub fn read_timeout(&self) -> Duration {
        let floor = self.read_timeout_floor_secs;
        let ceiling = self.read_timeout_ceiling_secs.max(floor);
        Duration::from_secs(self.read_timeout_secs.clamp(floor, ceiling))
    }

    /// Backoff before the next attempt: `attempt * base`, capped
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let delay = self.retry_base_delay_ms.saturating_mul(u64::from(attempt));
        Duration::from_millis(delay.min(self.retry_delay_cap_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Local,
    Redis,
}

/// Cache backend selection and TTL policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    pub ttl_secs: u64,
    pub cleanup_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Local,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            ttl_secs: 3600,
            cleanup_threshold: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Background refresh cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// Lower bound applied to `interval_secs`
    pub min_interval_secs: u64,
    pub error_retry_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            min_interval_secs: 1800,
            error_retry_secs: 300,
        }
    }
}

impl RefreshConfig {
    /// Scrape interval, never shorter than `min_interval_secs`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(self.min_interval_secs))
    }

    pub fn error_retry(&self) -> Duration {
        Duration::from_secs(self.error_retry_secs)
    }
}

/// Main configuration for sitebrain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
}

impl Config {
    /// Load configuration from config.toml file
    /// First tries to load from system config directory, falls back to embedded template
    pub fn load() -> Result<Self> {
        let config_path = crate::storage::get_system_config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            // Config doesn't exist, create from template
            let config: Self =
                toml::from_str(TEMPLATE).context("Embedded config template is invalid")?;

            if let Some(parent) = config_path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&config_path, TEMPLATE)?;

            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base_url) = env_value("SITEBRAIN_BASE_URL") {
            self.site.base_url = base_url;
        }
        if let Some(backend) = env_value("SITEBRAIN_CACHE_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "redis" => self.cache.backend = CacheBackendKind::Redis,
                "local" | "memory" => self.cache.backend = CacheBackendKind::Local,
                other => tracing::warn!(value = other, "Unknown cache backend override ignored"),
            }
        }
        if let Some(redis_url) = env_value("SITEBRAIN_REDIS_URL") {
            self.cache.redis_url = redis_url;
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let config: Config = toml::from_str(TEMPLATE).unwrap();
        let defaults = Config::default();

        assert_eq!(config.site.base_url, defaults.site.base_url);
        assert_eq!(config.site.pages, defaults.site.pages);
        assert_eq!(config.fetch.max_retries, defaults.fetch.max_retries);
        assert_eq!(config.fetch.max_body_bytes, defaults.fetch.max_body_bytes);
        assert_eq!(config.fetch.min_body_chars, defaults.fetch.min_body_chars);
        assert_eq!(config.fetch.content_selectors, defaults.fetch.content_selectors);
        assert_eq!(config.cache.backend, CacheBackendKind::Local);
        assert_eq!(config.refresh.error_retry_secs, 300);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            backend = "redis"

            [site.pages]
            news = "news"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, CacheBackendKind::Redis);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.site.pages.len(), 1);
        assert_eq!(config.fetch.read_timeout_secs, 30);
    }

    #[test]
    fn test_read_timeout_is_clamped() {
        let mut fetch = FetchConfig {
            read_timeout_secs: 1,
            ..FetchConfig::default()
        };
        assert_eq!(fetch.read_timeout(), Duration::from_secs(5));

        fetch.read_timeout_secs = 600;
        assert_eq!(fetch.read_timeout(), Duration::from_secs(60));

        fetch.read_timeout_secs = 20;
        assert_eq!(fetch.read_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_retry_delay_is_incremental_and_capped() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.retry_delay(1), Duration::from_millis(2000));
        assert_eq!(fetch.retry_delay(3), Duration::from_millis(6000));
        assert_eq!(fetch.retry_delay(20), Duration::from_millis(10_000));
    }

    #[test]
    fn test_refresh_interval_has_floor() {
        let refresh = RefreshConfig {
            interval_secs: 60,
            ..RefreshConfig::default()
        };
        assert_eq!(refresh.interval(), Duration::from_secs(1800));

        let refresh = RefreshConfig {
            interval_secs: 7200,
            ..RefreshConfig::default()
        };
        assert_eq!(refresh.interval(), Duration::from_secs(7200));
    }

    #[test]
    fn test_aggressive_profile() {
        let fetch = FetchConfig::aggressive();
        assert!(fetch.aggressive);
        assert_eq!(fetch.max_retries, 8);
        assert_eq!(fetch.read_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_aggressive_overlay_keeps_user_settings() {
        let user = FetchConfig {
            max_body_bytes: 1234,
            extract_links: false,
            min_content_chars: 7,
            content_max_chars: 900,
            content_selectors: vec!["#page".to_string()],
            ..FetchConfig::default()
        };
        let fetch = user.with_aggressive_retries();

        assert!(fetch.aggressive);
        assert_eq!(fetch.max_retries, 8);
        assert_eq!(fetch.read_timeout(), Duration::from_secs(45));
        assert_eq!(fetch.max_body_bytes, 1234);
        assert!(!fetch.extract_links);
        assert_eq!(fetch.min_content_chars, 7);
        assert_eq!(fetch.content_max_chars, 900);
        assert_eq!(fetch.content_selectors, vec!["#page".to_string()]);
    }
}
