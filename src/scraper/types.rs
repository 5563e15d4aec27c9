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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a single page fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Success,
    HttpError,
    Timeout,
    ConnectionError,
    NotFound,
    ParseEmpty,
    InvalidUrl,
}

/// Result for one page of a scrape pass; never persisted
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub page_id: String,
    pub text: Option<String>,
    pub outcome: ScrapeOutcome,
}

/// Everything one scrape pass produced, in page-map order
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    pub results: Vec<ScrapeResult>,
}

impl ScrapeReport {
    /// Successfully scraped sections keyed by page id
    pub fn pages(&self) -> BTreeMap<String, String> {
        self.results
            .iter()
            .filter_map(|r| r.text.as_ref().map(|t| (r.page_id.clone(), t.clone())))
            .collect()
    }

    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ScrapeOutcome::Success)
    }

    pub fn count(&self, outcome: ScrapeOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}
