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

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sitebrain")]
#[command(version, author = "Muvon Un Limited <opensource@muvon.io>")]
#[command(about = "Website-backed knowledge base with cached keyword search", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh scheduler and answer JSON-lines requests on stdio
    Serve {
        /// Log at debug level for this crate
        #[arg(long)]
        debug: bool,
    },

    /// Scrape the configured pages once and print the refresh report
    Refresh,

    /// Search the knowledge base
    Search {
        /// Free-text query
        #[arg(required = true)]
        query: Vec<String>,

        /// Refresh from the website before searching
        #[arg(short, long)]
        refresh: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show section count, refresh state and cache counters
    Status {
        /// Refresh from the website first
        #[arg(short, long)]
        refresh: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Fetch one URL and print the extracted text
    Fetch {
        /// Absolute URL to fetch
        url: String,

        /// Use the aggressive retry profile
        #[arg(long)]
        aggressive: bool,
    },
}
