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

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::Cache;
use crate::config::Config;
use crate::knowledge::fallback::fallback_snapshot;
use crate::knowledge::search::{normalize_query, rank_sections, search_cache_key};
use crate::knowledge::types::{
    KnowledgeStatus, RefreshError, RefreshMetrics, RefreshReport, RefreshStatus, Snapshot,
};
use crate::scraper::{HttpFetcher, PageFetcher, PageSetScraper, ScrapeSession};

/// Cache key of the persisted snapshot
pub const KNOWLEDGE_BASE_KEY: &str = "knowledge_base";

/// Sections returned per search
pub const SEARCH_RESULT_LIMIT: usize = 2;

struct RefreshState {
    status: RefreshStatus,
    last_refresh: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct MetricCounters {
    scrape_attempts: AtomicU64,
    scrape_successes: AtomicU64,
    pages_scraped: AtomicU64,
}

/// Live snapshot of site knowledge with refresh and cached search.
///
/// Readers get an `Arc` to an immutable snapshot; a refresh builds a new map
/// and swaps it in, so searches never observe a half-merged state.
pub struct KnowledgeStore {
    scraper: PageSetScraper,
    pages: BTreeMap<String, String>,
    cache: Arc<Cache>,
    snapshot: RwLock<Arc<Snapshot>>,
    state: RwLock<RefreshState>,
    metrics: MetricCounters,
}

impl KnowledgeStore {
    /// Wire the production fetcher and configured cache backend
    pub async fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch, &config.site.user_agent)?;
        let cache = Arc::new(Cache::connect(&config.cache).await);
        Self::new(config, Arc::new(fetcher), cache).await
    }

    /// Start from the cached snapshot when present, otherwise from fallback content
    pub async fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        cache: Arc<Cache>,
    ) -> Result<Self> {
        let scraper = PageSetScraper::new(&config.site.base_url, fetcher)?;

        let initial = match cache.get::<Snapshot>(KNOWLEDGE_BASE_KEY).await {
            Some(snapshot) if !snapshot.is_empty() => {
                info!(sections = snapshot.len(), "Loaded knowledge base from cache");
                snapshot
            }
            _ => {
                info!("No cached knowledge base, using fallback content");
                fallback_snapshot()
            }
        };

        Ok(Self::from_parts(
            scraper,
            config.site.pages.clone(),
            cache,
            initial,
        ))
    }

    pub(crate) fn from_parts(
        scraper: PageSetScraper,
        pages: BTreeMap<String, String>,
        cache: Arc<Cache>,
        initial: Snapshot,
    ) -> Self {
        Self {
            scraper,
            pages,
            cache,
            snapshot: RwLock::new(Arc::new(initial)),
            state: RwLock::new(RefreshState {
                status: RefreshStatus::Idle,
                last_refresh: None,
            }),
            metrics: MetricCounters::default(),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Run one refresh cycle. Concurrent callers queue on the scrape lock
    /// and each runs its own cycle in turn.
    pub async fn update(&self) -> RefreshReport {
        let session = self.scraper.session().await;
        self.set_status(RefreshStatus::Updating);
        self.metrics.scrape_attempts.fetch_add(1, Ordering::Relaxed);

        let result = AssertUnwindSafe(self.refresh_cycle(&session))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RefreshError::Panicked(panic_message(panic))));

        match result {
            Ok(report) => {
                self.set_status(RefreshStatus::Completed);
                info!(
                    attempted = report.pages_attempted,
                    scraped = report.pages_scraped,
                    sections = report.section_count,
                    "Knowledge refresh completed"
                );
                report
            }
            Err(e) => {
                self.set_status(RefreshStatus::Failed);
                error!(error = %e, "Knowledge refresh failed");
                RefreshReport {
                    status: RefreshStatus::Failed,
                    pages_attempted: 0,
                    pages_scraped: 0,
                    section_count: self.snapshot().len(),
                    used_fallback: false,
                }
            }
        }
    }

    async fn refresh_cycle(
        &self,
        session: &ScrapeSession<'_>,
    ) -> Result<RefreshReport, RefreshError> {
        if self.pages.is_empty() {
            return Err(RefreshError::NoPages);
        }

        let report = session.scrape(&self.pages).await;
        let scraped = report.pages();
        let mut used_fallback = false;

        if scraped.is_empty() {
            warn!("Website unreachable, keeping existing knowledge");
            if self.snapshot().is_empty() {
                self.replace_snapshot(fallback_snapshot());
                used_fallback = true;
            }
        } else {
            let merged = merge_snapshot(&self.snapshot(), scraped);
            self.cache.set(KNOWLEDGE_BASE_KEY, &merged).await;
            self.replace_snapshot(merged);

            self.metrics.scrape_successes.fetch_add(1, Ordering::Relaxed);
            self.metrics
                .pages_scraped
                .fetch_add(report.succeeded() as u64, Ordering::Relaxed);
            self.write_state(|state| state.last_refresh = Some(Utc::now()));
        }

        Ok(RefreshReport {
            status: RefreshStatus::Completed,
            pages_attempted: report.attempted(),
            pages_scraped: report.succeeded(),
            section_count: self.snapshot().len(),
            used_fallback,
        })
    }

    /// Up to two best-matching section texts, memoized per normalized query.
    /// Empty results are never memoized, so a later refresh can satisfy them.
    pub async fn search(&self, query: &str) -> Vec<String> {
        let normalized = normalize_query(query);
        let key = search_cache_key(&normalized);

        match self.cache.get::<Vec<String>>(&key).await {
            Some(cached) if !cached.is_empty() => return cached,
            _ => {}
        }

        let results = rank_sections(&self.snapshot(), &normalized, SEARCH_RESULT_LIMIT);
        if !results.is_empty() {
            self.cache.set(&key, &results).await;
        }
        results
    }

    pub fn get_status(&self) -> KnowledgeStatus {
        let (refresh_status, last_refresh) = match self.state.read() {
            Ok(state) => (state.status, state.last_refresh),
            Err(poisoned) => {
                let state = poisoned.into_inner();
                (state.status, state.last_refresh)
            }
        };

        KnowledgeStatus {
            section_count: self.snapshot().len(),
            refresh_status,
            last_refresh,
            cache_backend: self.cache.backend_name().to_string(),
            cache_stats: self.cache.stats(),
            metrics: RefreshMetrics {
                scrape_attempts: self.metrics.scrape_attempts.load(Ordering::Relaxed),
                scrape_successes: self.metrics.scrape_successes.load(Ordering::Relaxed),
                pages_scraped: self.metrics.pages_scraped.load(Ordering::Relaxed),
            },
        }
    }

    /// Start a refresh in the background and return immediately
    pub fn trigger_manual_refresh(self: &Arc<Self>) -> JoinHandle<RefreshReport> {
        info!("Manual knowledge refresh triggered");
        let store = Arc::clone(self);
        tokio::spawn(async move { store.update().await })
    }

    fn replace_snapshot(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    fn set_status(&self, status: RefreshStatus) {
        self.write_state(|state| state.status = status);
    }

    fn write_state(&self, apply: impl FnOnce(&mut RefreshState)) {
        match self.state.write() {
            Ok(mut guard) => apply(&mut guard),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}

/// Scraped sections overwrite, everything else is kept
pub fn merge_snapshot(current: &Snapshot, scraped: BTreeMap<String, String>) -> Snapshot {
    let mut merged = current.clone();
    merged.extend(scraped);
    merged
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
