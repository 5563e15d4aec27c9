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

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::CacheError;

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-process TTL map used when no durable backend is available
pub struct LocalCache {
    entries: Mutex<HashMap<String, Entry>>,
    cleanup_threshold: usize,
}

impl LocalCache {
    pub fn new(cleanup_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cleanup_threshold,
        }
    }

    /// Expired entries are evicted on read
    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Ok(Some(entry.payload.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        entries.insert(
            key.to_string(),
            Entry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );

        if entries.len() > self.cleanup_threshold {
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| now < entry.expires_at);
            debug!(evicted = before - entries.len(), "Local cache cleanup");
        }

        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
