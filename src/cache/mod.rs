// Copyright 2026 Muvon Un Limited
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

pub mod local;
pub mod redis_backend;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{CacheBackendKind, CacheConfig};
use local::LocalCache;
use redis_backend::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend timed out")]
    Timeout,

    #[error("cache lock poisoned")]
    Poisoned,
}

enum Backend {
    Local(LocalCache),
    Redis(RedisCache),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Fail-soft TTL cache of JSON-serialized values.
///
/// Every error is logged and degraded to a miss or a no-op; callers never see one.
pub struct Cache {
    backend: Backend,
    ttl: Duration,
    counters: Counters,
}

impl Cache {
    /// Build the configured backend. An unreachable Redis falls back to the
    /// local map for the lifetime of this instance.
    pub async fn connect(config: &CacheConfig) -> Self {
        let backend = match config.backend {
            CacheBackendKind::Local => Backend::Local(LocalCache::new(config.cleanup_threshold)),
            CacheBackendKind::Redis => match RedisCache::connect(&config.redis_url).await {
                Ok(redis) => Backend::Redis(redis),
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, using local cache");
                    Backend::Local(LocalCache::new(config.cleanup_threshold))
                }
            },
        };

        Self {
            backend,
            ttl: config.ttl(),
            counters: Counters::default(),
        }
    }

    pub fn local(ttl: Duration, cleanup_threshold: usize) -> Self {
        Self {
            backend: Backend::Local(LocalCache::new(cleanup_threshold)),
            ttl,
            counters: Counters::default(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Local(_) => "local",
            Backend::Redis(_) => "redis",
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let decoded = match self.get_raw(key).await {
            Ok(Some(payload)) => serde_json::from_str::<T>(&payload)
                .map(Some)
                .map_err(CacheError::from),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(Some(value)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache miss");
                None
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.record_error("get", key, &e);
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.ttl).await
    }

    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let result = match serde_json::to_string(value) {
            Ok(payload) => match &self.backend {
                Backend::Local(local) => local.set(key, payload, ttl),
                Backend::Redis(redis) => redis.set(key, payload, ttl).await,
            },
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            self.record_error("set", key, &e);
        }
    }

    pub async fn delete(&self, key: &str) {
        let result = match &self.backend {
            Backend::Local(local) => local.delete(key),
            Backend::Redis(redis) => redis.delete(key).await,
        };

        if let Err(e) = result {
            self.record_error("delete", key, &e);
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        match &self.backend {
            Backend::Local(local) => local.get(key),
            Backend::Redis(redis) => redis.get(key).await,
        }
    }

    fn record_error(&self, operation: &str, key: &str, error: &CacheError) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        warn!(operation, key, error = %error, "Cache operation failed");
    }
}
