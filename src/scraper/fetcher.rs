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

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::scraper::error::FetchError;
use crate::scraper::extract::HtmlExtractor;

/// Fetches one page and returns its extracted text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with retry, backoff and body capping
pub struct HttpFetcher {
    client: Client,
    /// Minimal-header, relaxed-TLS client for the aggressive last attempt
    relaxed_client: Option<Client>,
    config: FetchConfig,
    extractor: HtmlExtractor,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig, user_agent: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let relaxed_client = if config.aggressive {
            Some(
                Client::builder()
                    .connect_timeout(config.connect_timeout())
                    .read_timeout(std::time::Duration::from_secs(
                        config.read_timeout_ceiling_secs,
                    ))
                    .user_agent(user_agent)
                    .danger_accept_invalid_certs(true)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            client,
            relaxed_client,
            config: config.clone(),
            extractor: HtmlExtractor::new(config),
        })
    }

    /// Single request: status check, capped body read, extraction
    async fn attempt(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let html = read_capped(response, self.config.max_body_bytes).await?;
        self.extractor
            .extract(&html, Some(url))
            .ok_or(FetchError::ParseEmpty)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;
        let mut last_error = FetchError::Timeout;

        while attempts < max_attempts {
            attempts += 1;
            match self.attempt(&self.client, &parsed).await {
                Ok(text) => {
                    debug!(url, attempts, chars = text.len(), "Fetched page");
                    return Ok(text);
                }
                Err(err) if err.is_retryable() => {
                    warn!(
                        url,
                        attempt = attempts,
                        max_attempts,
                        error = %err,
                        "Fetch attempt failed"
                    );
                    last_error = err;
                    if attempts < max_attempts {
                        tokio::time::sleep(self.config.retry_delay(attempts)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(relaxed) = &self.relaxed_client {
            info!(url, "Retry budget spent, making relaxed final attempt");
            attempts += 1;
            match self.attempt(relaxed, &parsed).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() => last_error = err,
                Err(err) => return Err(err),
            }
        }

        Err(FetchError::Unreachable {
            attempts,
            last: Box::new(last_error),
        })
    }
}

/// Read at most `max_bytes` of the body; the rest is dropped
async fn read_capped(mut response: Response, max_bytes: usize) -> Result<String, FetchError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let remaining = max_bytes.saturating_sub(body.len());
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            debug!(max_bytes, "Response body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
