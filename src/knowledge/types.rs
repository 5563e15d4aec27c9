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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::cache::CacheStats;

/// Section id -> extracted text
pub type Snapshot = BTreeMap<String, String>;

/// Lifecycle of the most recent refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Idle,
    Updating,
    Completed,
    Failed,
}

impl std::fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefreshStatus::Idle => "idle",
            RefreshStatus::Updating => "updating",
            RefreshStatus::Completed => "completed",
            RefreshStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Failure of a whole refresh cycle
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no pages configured")]
    NoPages,

    #[error("refresh cycle panicked: {0}")]
    Panicked(String),
}

/// Outcome of one `update()` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub status: RefreshStatus,
    pub pages_attempted: usize,
    pub pages_scraped: usize,
    pub section_count: usize,
    pub used_fallback: bool,
}

/// Cumulative refresh counters since start
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RefreshMetrics {
    pub scrape_attempts: u64,
    pub scrape_successes: u64,
    pub pages_scraped: u64,
}

/// Health view of the knowledge store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStatus {
    pub section_count: usize,
    pub refresh_status: RefreshStatus,
    pub last_refresh: Option<DateTime<Utc>>,
    pub cache_backend: String,
    pub cache_stats: CacheStats,
    #[serde(flatten)]
    pub metrics: RefreshMetrics,
}
