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
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cli::Commands;
use crate::config::Config;
use crate::knowledge::formatting::{format_refresh_report, format_search_results, format_status};
use crate::knowledge::{KnowledgeStore, RefreshScheduler};
use crate::scraper::{HttpFetcher, PageFetcher};
use crate::server::KnowledgeServer;

/// Longest wait for an in-flight refresh once the server stops
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub async fn execute(config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Refresh => {
            let store = KnowledgeStore::from_config(config).await?;
            let report = store.update().await;
            print!("{}", format_refresh_report(&report));
            Ok(())
        }
        Commands::Search {
            query,
            refresh,
            format,
        } => {
            let store = KnowledgeStore::from_config(config).await?;
            if refresh {
                let report = store.update().await;
                eprint!("{}", format_refresh_report(&report));
            }

            let results = store.search(&query.join(" ")).await;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&results)?),
                _ => print!("{}", format_search_results(&results)),
            }
            Ok(())
        }
        Commands::Status { refresh, format } => {
            let store = KnowledgeStore::from_config(config).await?;
            if refresh {
                store.update().await;
            }

            let status = store.get_status();
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&status)?),
                _ => print!("{}", format_status(&status)),
            }
            Ok(())
        }
        Commands::Fetch { url, aggressive } => {
            let fetch_config = if aggressive {
                config.fetch.with_aggressive_retries()
            } else {
                config.fetch.clone()
            };

            let fetcher = HttpFetcher::new(&fetch_config, &config.site.user_agent)?;
            let text = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            println!("{}", text);
            Ok(())
        }
    }
}

async fn serve(config: &Config) -> Result<()> {
    let store = Arc::new(KnowledgeStore::from_config(config).await?);
    let scheduler = RefreshScheduler::new(Arc::clone(&store), &config.refresh).spawn();

    let server = KnowledgeServer::new(Arc::clone(&store));
    let served = tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            Ok(())
        }
    };

    info!(
        grace_secs = SHUTDOWN_GRACE.as_secs(),
        "Waiting for any in-flight refresh to finish"
    );
    scheduler.shutdown_within(SHUTDOWN_GRACE).await;
    served
}
