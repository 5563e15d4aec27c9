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
use colored::Colorize;

use crate::knowledge::types::{KnowledgeStatus, RefreshReport, RefreshStatus};

const PREVIEW_CHARS: usize = 400;

pub fn format_search_results(results: &[String]) -> String {
    if results.is_empty() {
        return "No matching knowledge found".to_string();
    }

    let mut output = String::new();

    for text in results {
        output.push_str(&"━".repeat(60));
        output.push('\n');

        let (title, body) = text.split_once("\n\n").unwrap_or((text.as_str(), ""));
        output.push_str(&title.blue().bold().to_string());
        output.push('\n');

        let body = body.trim();
        if !body.is_empty() {
            // Content preview
            if body.chars().count() > PREVIEW_CHARS {
                output.push_str(&format!("{}...", truncate_chars(body, PREVIEW_CHARS)));
            } else {
                output.push_str(body);
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output
}

pub fn format_status(status: &KnowledgeStatus) -> String {
    let mut output = String::new();

    output.push_str(&"Knowledge Base Status".bold().to_string());
    output.push('\n');
    output.push_str(&format!("Sections: {}", status.section_count));
    output.push('\n');
    output.push_str(&format!(
        "Refresh Status: {}",
        colorize_status(status.refresh_status)
    ));
    output.push('\n');

    let last = status
        .last_refresh
        .map(format_relative_time)
        .unwrap_or_else(|| "never".to_string());
    output.push_str(&format!("Last Refresh: {}", last));
    output.push('\n');

    output.push_str(&format!(
        "Scrapes: {} attempted, {} successful, {} pages",
        status.metrics.scrape_attempts,
        status.metrics.scrape_successes,
        status.metrics.pages_scraped
    ));
    output.push('\n');

    output.push_str(&format!(
        "Cache ({}): {} hits, {} misses, {} errors",
        status.cache_backend,
        status.cache_stats.hits,
        status.cache_stats.misses,
        status.cache_stats.errors
    ));
    output.push('\n');

    output
}

pub fn format_refresh_report(report: &RefreshReport) -> String {
    let mut output = format!(
        "Refresh {}: {}/{} pages scraped, {} sections",
        colorize_status(report.status),
        report.pages_scraped,
        report.pages_attempted,
        report.section_count
    );
    if report.used_fallback {
        output.push_str(&" (fallback content)".yellow().to_string());
    }
    output.push('\n');
    output
}

fn colorize_status(status: RefreshStatus) -> String {
    let label = status.to_string();
    match status {
        RefreshStatus::Completed => label.green().to_string(),
        RefreshStatus::Failed => label.red().to_string(),
        RefreshStatus::Updating => label.yellow().to_string(),
        RefreshStatus::Idle => label,
    }
}

fn format_relative_time(dt: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(dt);

    if duration.num_days() > 0 {
        format!("{} days ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{} hours ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{} minutes ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}
