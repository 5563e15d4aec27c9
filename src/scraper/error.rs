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

use thiserror::Error;

use crate::scraper::types::ScrapeOutcome;

/// Failure of a single page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("page not found")]
    NotFound,

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("no extractable text")]
    ParseEmpty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unreachable after {attempts} attempts: {last}")]
    Unreachable { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// 404 and unparseable pages are permanent; everything transport-level is retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout | FetchError::Connection(_) | FetchError::HttpStatus(_)
        )
    }

    pub fn outcome(&self) -> ScrapeOutcome {
        match self {
            FetchError::Timeout => ScrapeOutcome::Timeout,
            FetchError::Connection(_) => ScrapeOutcome::ConnectionError,
            FetchError::NotFound => ScrapeOutcome::NotFound,
            FetchError::HttpStatus(_) => ScrapeOutcome::HttpError,
            FetchError::ParseEmpty => ScrapeOutcome::ParseEmpty,
            FetchError::InvalidUrl(_) => ScrapeOutcome::InvalidUrl,
            FetchError::Unreachable { last, .. } => last.outcome(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            if status == reqwest::StatusCode::NOT_FOUND {
                FetchError::NotFound
            } else {
                FetchError::HttpStatus(status.as_u16())
            }
        } else {
            FetchError::Connection(err.to_string())
        }
    }
}
