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

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::knowledge::KnowledgeStore;

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Line-delimited JSON request loop over stdio
pub struct KnowledgeServer {
    store: Arc<KnowledgeStore>,
}

impl KnowledgeServer {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Serve requests until stdin closes
    pub async fn run(&self) -> Result<()> {
        let mut stdout = stdout();
        let mut reader = BufReader::new(stdin());
        let mut line = String::new();

        info!("Knowledge server listening on stdio");

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                debug!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = self.handle_line(trimmed).await;
            let response_json = serde_json::to_string(&response)?;
            stdout.write_all(response_json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Response::error(None, PARSE_ERROR, format!("Parse error: {}", e)),
        }
    }

    async fn handle_request(&self, request: Request) -> Response {
        let id = request.id;
        let params = request.params.unwrap_or_else(|| json!({}));

        match request.method.as_str() {
            "search" => {
                let Some(query) = params.get("query").and_then(Value::as_str) else {
                    return Response::error(
                        id,
                        INVALID_PARAMS,
                        "Missing required parameter: query",
                    );
                };

                let results = self.store.search(query).await;
                Response::ok(id, json!({ "results": results }))
            }

            "status" => match serde_json::to_value(self.store.get_status()) {
                Ok(status) => Response::ok(id, status),
                Err(e) => Response::error(id, INTERNAL_ERROR, e.to_string()),
            },

            "refresh" => {
                // Completion is visible through `status`
                drop(self.store.trigger_manual_refresh());
                Response::ok(id, json!({ "started": true }))
            }

            other => Response::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }
}
