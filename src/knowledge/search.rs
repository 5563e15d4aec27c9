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

use sha2::{Digest, Sha256};

use crate::knowledge::types::Snapshot;

/// Query words this short are ignored when scoring
const MIN_WORD_CHARS: usize = 4;

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// `search:` + first 16 hex chars of SHA-256 over the normalized query
pub fn search_cache_key(normalized_query: &str) -> String {
    let digest = hex::encode(Sha256::digest(normalized_query.as_bytes()));
    format!("search:{}", &digest[..16])
}

/// Term-frequency sum: every query word (repeats included) adds its
/// occurrence count in the lower-cased text. No length normalization.
pub fn score_text(text: &str, query: &str) -> usize {
    let text_lower = text.to_lowercase();
    let query_lower = query.to_lowercase();

    query_lower
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_CHARS)
        .map(|word| text_lower.matches(word).count())
        .sum()
}

/// Texts of the best `limit` sections with a positive score.
/// Ties keep snapshot (id) order.
pub fn rank_sections(snapshot: &Snapshot, query: &str, limit: usize) -> Vec<String> {
    let mut scored: Vec<(&String, usize)> = snapshot
        .values()
        .map(|text| (text, score_text(text, query)))
        .filter(|(_, score)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(limit)
        .map(|(text, _)| text.clone())
        .collect()
}
