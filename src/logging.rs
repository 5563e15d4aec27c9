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

use std::path::Path;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, fmt::Layer, prelude::*, registry::Registry, EnvFilter};

const DEFAULT_FILTER: &str = "sitebrain=info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Human-readable logs on stderr for one-shot commands
pub fn init_cli_logging() {
    fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// JSON logs to a daily rolling file; stdout stays clean for the request protocol
pub fn init_server_logging(log_dir: &Path, debug_mode: bool) -> Result<(), anyhow::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "server.log");

    let default = if debug_mode {
        "info,sitebrain=debug"
    } else {
        "info,sitebrain=info"
    };

    let file_layer = Layer::new()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .json();

    Registry::default()
        .with(file_layer)
        .with(env_filter(default))
        .try_init()?;

    info!(
        log_directory = %log_dir.display(),
        debug_mode,
        "Server logging initialized"
    );

    Ok(())
}
