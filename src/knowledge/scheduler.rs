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

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::knowledge::store::KnowledgeStore;
use crate::knowledge::types::RefreshStatus;

/// Periodic refresh loop: refresh at once, then every `interval`,
/// or after `error_retry` when a cycle fails.
pub struct RefreshScheduler {
    store: Arc<KnowledgeStore>,
    interval: Duration,
    error_retry: Duration,
}

/// Owner of a running scheduler task
pub struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<KnowledgeStore>, config: &RefreshConfig) -> Self {
        Self {
            store,
            interval: config.interval(),
            error_retry: config.error_retry(),
        }
    }

    pub fn spawn(self) -> SchedulerHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(token.clone()));
        SchedulerHandle { token, task }
    }

    async fn run(self, token: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            error_retry_secs = self.error_retry.as_secs(),
            "Refresh scheduler started"
        );

        while !token.is_cancelled() {
            let report = self.store.update().await;

            let delay = if report.status == RefreshStatus::Failed {
                warn!(
                    retry_secs = self.error_retry.as_secs(),
                    "Refresh failed, retrying early"
                );
                self.error_retry
            } else {
                self.interval
            };

            debug!(delay_secs = delay.as_secs(), "Next refresh scheduled");
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Refresh scheduler stopped");
    }
}

impl SchedulerHandle {
    /// Stop the loop; an in-flight refresh finishes first
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Refresh scheduler task ended abnormally");
        }
    }

    /// Like `shutdown`, but abandons an in-flight refresh after `limit`.
    /// Returns `false` when the task had to be aborted.
    pub async fn shutdown_within(self, limit: Duration) -> bool {
        self.token.cancel();
        let mut task = self.task;

        match tokio::time::timeout(limit, &mut task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Refresh scheduler task ended abnormally");
                true
            }
            Err(_) => {
                warn!(
                    limit_secs = limit.as_secs(),
                    "Refresh still running at shutdown, aborting it"
                );
                task.abort();
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
