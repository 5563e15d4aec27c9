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

use super::*;
use crate::knowledge::fallback::fallback_snapshot;
use crate::scraper::FetchError;
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tokio::sync::Notify;

const BASE: &str = "https://www.example.edu/";

/// Answers every fetch through a plain function of the URL
struct FnFetcher<F> {
    respond: F,
    calls: AtomicUsize,
}

impl<F> FnFetcher<F>
where
    F: Fn(&str) -> Result<String, FetchError> + Send + Sync,
{
    fn new(respond: F) -> Arc<Self> {
        Arc::new(Self {
            respond,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> PageFetcher for FnFetcher<F>
where
    F: Fn(&str) -> Result<String, FetchError> + Send + Sync,
{
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(url)
    }
}

/// First fetch parks until released; later fetches answer at once
struct GatedFetcher {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PageFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("Home\n\nfirst".to_string())
        } else {
            Ok("Home\n\nsecond".to_string())
        }
    }
}

fn timeout_error() -> FetchError {
    FetchError::Unreachable {
        attempts: 3,
        last: Box::new(FetchError::Timeout),
    }
}

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn local_cache() -> Arc<Cache> {
    Arc::new(Cache::local(Duration::from_secs(3600), 1000))
}

fn store_with(
    fetcher: Arc<dyn PageFetcher>,
    pages: &[(&str, &str)],
    initial: Snapshot,
) -> Arc<KnowledgeStore> {
    let scraper = PageSetScraper::new(BASE, fetcher).unwrap();
    Arc::new(KnowledgeStore::from_parts(
        scraper,
        map(pages),
        local_cache(),
        initial,
    ))
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.site.base_url = BASE.to_string();
    config.site.pages = map(&[("home", ""), ("programs", "programs")]);
    config
}

#[tokio::test]
async fn test_unreachable_page_keeps_previous_section() {
    let fetcher = FnFetcher::new(|url| {
        if url == BASE {
            Ok("MPTI Home\n\nWelcome to the institute".to_string())
        } else {
            Err(timeout_error())
        }
    });
    let store = KnowledgeStore::new(&test_config(), fetcher.clone(), local_cache())
        .await
        .unwrap();
    assert_eq!(store.get_status().refresh_status, RefreshStatus::Idle);

    let report = store.update().await;
    assert_eq!(report.status, RefreshStatus::Completed);
    assert_eq!(report.pages_attempted, 2);
    assert_eq!(report.pages_scraped, 1);
    assert_eq!(fetcher.calls(), 2);

    let snapshot = store.snapshot();
    let fallback = fallback_snapshot();
    assert_eq!(snapshot["home"], "MPTI Home\n\nWelcome to the institute");
    assert_eq!(snapshot["programs"], fallback["programs"]);
    assert_eq!(snapshot["admissions"], fallback["admissions"]);

    let status = store.get_status();
    assert_eq!(status.refresh_status, RefreshStatus::Completed);
    assert!(status.last_refresh.is_some());
    assert_eq!(status.metrics.scrape_attempts, 1);
    assert_eq!(status.metrics.scrape_successes, 1);
    assert_eq!(status.metrics.pages_scraped, 1);
}

#[tokio::test]
async fn test_merge_never_drops_sections() {
    let fetcher = FnFetcher::new(|url| {
        if url.ends_with("/programs") {
            Err(FetchError::NotFound)
        } else {
            Ok("Home\n\nfresh".to_string())
        }
    });
    let initial = map(&[
        ("custom", "kept forever"),
        ("home", "Home\n\nstale"),
        ("programs", "Programs\n\nold list"),
    ]);
    let store = store_with(
        fetcher,
        &[("home", ""), ("programs", "programs")],
        initial.clone(),
    );

    store.update().await;

    let snapshot = store.snapshot();
    for key in initial.keys() {
        assert!(snapshot.contains_key(key), "lost section {key}");
    }
    assert_eq!(snapshot["home"], "Home\n\nfresh");
    assert_eq!(snapshot["programs"], "Programs\n\nold list");
    assert_eq!(snapshot["custom"], "kept forever");
}

#[tokio::test]
async fn test_failed_scrape_leaves_snapshot_untouched() {
    let fetcher = FnFetcher::new(|_| Err(FetchError::Connection("refused".into())));
    let store = store_with(fetcher, &[("home", "")], map(&[("home", "Home\n\nkept")]));
    let before = store.snapshot();

    let report = store.update().await;

    assert_eq!(report.status, RefreshStatus::Completed);
    assert_eq!(report.pages_scraped, 0);
    assert!(!report.used_fallback);
    assert!(Arc::ptr_eq(&before, &store.snapshot()));

    let status = store.get_status();
    assert!(status.last_refresh.is_none());
    assert_eq!(status.metrics.scrape_attempts, 1);
    assert_eq!(status.metrics.scrape_successes, 0);
}

#[tokio::test]
async fn test_empty_snapshot_gets_fallback() {
    let fetcher = FnFetcher::new(|_| Err(timeout_error()));
    let store = store_with(fetcher, &[("home", "")], Snapshot::new());

    let report = store.update().await;

    assert!(report.used_fallback);
    assert_eq!(*store.snapshot(), fallback_snapshot());
    assert!(!store.search("admission requirements").await.is_empty());
}

#[tokio::test]
async fn test_refresh_persists_snapshot_to_cache() {
    let cache = local_cache();
    let fetcher = FnFetcher::new(|url| Ok(format!("Page\n\nscraped from {url}")));
    let config = test_config();

    let first = KnowledgeStore::new(&config, fetcher.clone(), cache.clone())
        .await
        .unwrap();
    first.update().await;

    let second = KnowledgeStore::new(&config, fetcher, cache).await.unwrap();
    assert_eq!(*second.snapshot(), *first.snapshot());
    assert_eq!(
        second.snapshot()["programs"],
        "Page\n\nscraped from https://www.example.edu/programs"
    );
}

#[tokio::test]
async fn test_search_results_are_memoized() {
    let fetcher = FnFetcher::new(|_| Err(FetchError::NotFound));
    let store = store_with(
        fetcher,
        &[("home", "")],
        map(&[
            ("a", "We offer programs."),
            ("b", "programs programs programs programs programs"),
        ]),
    );

    let first = store.search("Programs").await;
    let hits_before = store.get_status().cache_stats.hits;
    let second = store.search("  programs ").await;

    assert_eq!(first, second);
    assert_eq!(first[0], "programs programs programs programs programs");
    assert_eq!(store.get_status().cache_stats.hits, hits_before + 1);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let fetcher = FnFetcher::new(|_| Err(FetchError::NotFound));
    let store = store_with(fetcher, &[("home", "")], fallback_snapshot());

    assert!(store.search("zzzz qqqq").await.is_empty());
    assert!(store.search("").await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_memoized_search_expires_with_ttl() {
    let fetcher = FnFetcher::new(|_| Ok("Home\n\nnew campus opening".to_string()));
    let store = store_with(
        fetcher,
        &[("home", "")],
        map(&[("home", "Home\n\nold campus tour")]),
    );

    assert_eq!(
        store.search("campus").await,
        vec!["Home\n\nold campus tour".to_string()]
    );
    store.update().await;

    // memo still answers within its TTL
    assert_eq!(
        store.search("campus").await,
        vec!["Home\n\nold campus tour".to_string()]
    );

    tokio::time::advance(Duration::from_secs(3601)).await;
    assert_eq!(
        store.search("campus").await,
        vec!["Home\n\nnew campus opening".to_string()]
    );
}

#[tokio::test]
async fn test_empty_search_is_retried_after_refresh() {
    let fetcher = FnFetcher::new(|_| Ok("Home\n\nnew campus opening".to_string()));
    let store = store_with(fetcher, &[("home", "")], map(&[("home", "Home\n\nold")]));

    assert!(store.search("campus").await.is_empty());
    store.update().await;

    assert_eq!(
        store.search("campus").await,
        vec!["Home\n\nnew campus opening".to_string()]
    );
    assert_eq!(store.get_status().cache_stats.hits, 0);
}

#[tokio::test]
async fn test_concurrent_updates_run_one_at_a_time() {
    let fetcher = Arc::new(GatedFetcher {
        calls: AtomicUsize::new(0),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let store = store_with(fetcher.clone(), &[("home", "")], fallback_snapshot());

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.update().await }
    });
    fetcher.entered.notified().await;
    assert_eq!(store.get_status().refresh_status, RefreshStatus::Updating);

    let second = tokio::spawn({
        let store = store.clone();
        async move { store.update().await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    fetcher.release.notify_one();
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.snapshot()["home"], "Home\n\nsecond");
    assert_eq!(store.get_status().metrics.scrape_attempts, 2);
}

#[tokio::test]
async fn test_panicking_cycle_is_reported_as_failed() {
    let fetcher = FnFetcher::new(|_| -> Result<String, FetchError> { panic!("parser blew up") });
    let store = store_with(fetcher, &[("home", "")], map(&[("home", "Home\n\nkept")]));

    let report = store.update().await;

    assert_eq!(report.status, RefreshStatus::Failed);
    assert_eq!(store.get_status().refresh_status, RefreshStatus::Failed);
    assert_eq!(store.snapshot()["home"], "Home\n\nkept");

    // the scrape lock is released after a failed cycle
    let again = store.update().await;
    assert_eq!(again.status, RefreshStatus::Failed);
}

#[tokio::test]
async fn test_no_pages_configured_fails() {
    let fetcher = FnFetcher::new(|_| Ok("unused".to_string()));
    let store = store_with(fetcher.clone(), &[], fallback_snapshot());

    let report = store.update().await;

    assert_eq!(report.status, RefreshStatus::Failed);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(report.section_count, 3);
}

#[tokio::test]
async fn test_manual_refresh_runs_in_background() {
    let fetcher = FnFetcher::new(|_| Ok("Home\n\nfrom manual refresh".to_string()));
    let store = store_with(fetcher, &[("home", "")], fallback_snapshot());

    let handle = store.trigger_manual_refresh();
    let report = handle.await.unwrap();

    assert_eq!(report.status, RefreshStatus::Completed);
    assert_eq!(store.snapshot()["home"], "Home\n\nfrom manual refresh");
}

#[test]
fn test_merge_snapshot_overwrites_scraped_only() {
    let current = map(&[("a", "1"), ("b", "2")]);
    let merged = merge_snapshot(&current, map(&[("b", "3"), ("c", "4")]));
    assert_eq!(merged, map(&[("a", "1"), ("b", "3"), ("c", "4")]));
}
