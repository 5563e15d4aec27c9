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

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use url::Url;

use crate::scraper::fetcher::PageFetcher;
use crate::scraper::types::{ScrapeOutcome, ScrapeReport, ScrapeResult};

/// Scrapes a fixed id -> path page set against one base URL
pub struct PageSetScraper {
    base_url: Url,
    fetcher: Arc<dyn PageFetcher>,
    lock: Mutex<()>,
}

/// Exclusive right to run a scrape pass; held across scrape and merge
pub struct ScrapeSession<'a> {
    scraper: &'a PageSetScraper,
    _guard: MutexGuard<'a, ()>,
}

impl PageSetScraper {
    pub fn new(base_url: &str, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        Ok(Self {
            base_url,
            fetcher,
            lock: Mutex::new(()),
        })
    }

    /// Wait until no other pass is running, then claim the scrape lock
    pub async fn session(&self) -> ScrapeSession<'_> {
        ScrapeSession {
            scraper: self,
            _guard: self.lock.lock().await,
        }
    }

    /// Standalone scrape pass under the scrape lock
    pub async fn scrape(&self, pages: &BTreeMap<String, String>) -> ScrapeReport {
        self.session().await.scrape(pages).await
    }
}

impl ScrapeSession<'_> {
    /// Fetch every page; failures are recorded, never raised
    pub async fn scrape(&self, pages: &BTreeMap<String, String>) -> ScrapeReport {
        let mut report = ScrapeReport::default();

        for (page_id, path) in pages {
            let result = match self.scraper.base_url.join(path) {
                Ok(url) => match self.scraper.fetcher.fetch(url.as_str()).await {
                    Ok(text) => {
                        info!(page = %page_id, chars = text.len(), "Scraped page");
                        ScrapeResult {
                            page_id: page_id.clone(),
                            text: Some(text),
                            outcome: ScrapeOutcome::Success,
                        }
                    }
                    Err(e) => {
                        warn!(page = %page_id, url = %url, error = %e, "Failed to scrape page");
                        ScrapeResult {
                            page_id: page_id.clone(),
                            text: None,
                            outcome: e.outcome(),
                        }
                    }
                },
                Err(e) => {
                    warn!(page = %page_id, path = %path, error = %e, "Cannot resolve page URL");
                    ScrapeResult {
                        page_id: page_id.clone(),
                        text: None,
                        outcome: ScrapeOutcome::InvalidUrl,
                    }
                }
            };
            report.results.push(result);
        }

        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            "Scrape pass finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct StubFetcher {
        requested: StdMutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                requested: StdMutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("/missing") {
                Err(FetchError::NotFound)
            } else if url.ends_with("/slow") {
                Err(FetchError::Unreachable {
                    attempts: 3,
                    last: Box::new(FetchError::Timeout),
                })
            } else {
                Ok(format!("Page\n\ncontent of {url}"))
            }
        }
    }

    fn pages(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(id, path)| (id.to_string(), path.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successes() {
        let fetcher = Arc::new(StubFetcher::new());
        let scraper = PageSetScraper::new("https://www.example.edu/", fetcher.clone()).unwrap();

        let report = scraper
            .scrape(&pages(&[
                ("home", ""),
                ("missing", "missing"),
                ("programs", "programs"),
                ("slow", "slow"),
            ]))
            .await;

        let scraped = report.pages();
        assert_eq!(scraped.len(), 2);
        assert_eq!(
            scraped["home"],
            "Page\n\ncontent of https://www.example.edu/"
        );
        assert!(scraped.contains_key("programs"));
        assert_eq!(report.attempted(), 4);
        assert_eq!(report.count(ScrapeOutcome::NotFound), 1);
        assert_eq!(report.count(ScrapeOutcome::Timeout), 1);
    }

    #[tokio::test]
    async fn test_paths_join_against_base() {
        let fetcher = Arc::new(StubFetcher::new());
        let scraper =
            PageSetScraper::new("https://www.example.edu/site/", fetcher.clone()).unwrap();

        scraper
            .scrape(&pages(&[("admissions", "admissions"), ("root", "/contact")]))
            .await;

        let requested = fetcher.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            vec![
                "https://www.example.edu/site/admissions".to_string(),
                "https://www.example.edu/contact".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_all_failures_give_empty_mapping() {
        let fetcher = Arc::new(StubFetcher::new());
        let scraper = PageSetScraper::new("https://www.example.edu/", fetcher).unwrap();

        let report = scraper.scrape(&pages(&[("missing", "missing")])).await;
        assert!(report.pages().is_empty());
        assert_eq!(report.succeeded(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_scrapes_are_serialized() {
        let fetcher = Arc::new(StubFetcher::new());
        let scraper = Arc::new(
            PageSetScraper::new("https://www.example.edu/", fetcher.clone()).unwrap(),
        );
        let page_set = pages(&[("a", "a"), ("b", "b"), ("c", "c")]);

        let first = {
            let scraper = scraper.clone();
            let page_set = page_set.clone();
            tokio::spawn(async move { scraper.scrape(&page_set).await })
        };
        let second = {
            let scraper = scraper.clone();
            let page_set = page_set.clone();
            tokio::spawn(async move { scraper.scrape(&page_set).await })
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());
        assert_eq!(first.succeeded(), 3);
        assert_eq!(second.succeeded(), 3);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.requested.lock().unwrap().len(), 6);
    }

    #[test]
    fn test_invalid_base_url() {
        let fetcher = Arc::new(StubFetcher::new());
        assert!(PageSetScraper::new("not a url", fetcher).is_err());
    }
}
