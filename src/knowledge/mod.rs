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

pub mod fallback;
pub mod formatting;
pub mod scheduler;
pub mod search;
pub mod store;
pub mod types;

pub use scheduler::{RefreshScheduler, SchedulerHandle};
pub use store::{KnowledgeStore, KNOWLEDGE_BASE_KEY, SEARCH_RESULT_LIMIT};
pub use types::{
    KnowledgeStatus, RefreshError, RefreshMetrics, RefreshReport, RefreshStatus, Snapshot,
};
