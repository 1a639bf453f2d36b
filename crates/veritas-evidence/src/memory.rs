//! A deterministic in-memory cosine-similarity index standing in for the
//! pluggable vector memory substrate.
//!
//! Persistence and embedding-model backends are out of scope here — see
//! `DESIGN.md`. What's kept is the shape that matters for the decision
//! pipeline: parallel `ids`/`vecs` arrays, add-by-vector, and top-k
//! cosine search, with lookups addressed by id only, never by raw offset
//! or pointer, so rebuilds and saves stay straightforward.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use veritas_contracts::error::VeritasResult;
use veritas_contracts::evidence::Evidence;
use veritas_core::traits::EvidenceSource;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Embeds text into a fixed-width vector deterministically, with no model
/// dependency: a simple bag-of-characters hash. Good enough to exercise the
/// index's search behavior without shipping a real embedding model.
fn embed(text: &str, dim: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    for (i, byte) in text.as_bytes().iter().enumerate() {
        v[i % dim] += *byte as f32;
    }
    v
}

struct Entry {
    id: String,
    vec: Vec<f32>,
    evidence: Evidence,
}

struct State {
    entries: Vec<Entry>,
}

/// A recall-only evidence source backed by a fixed-dimension cosine index.
pub struct CosineMemoryIndex {
    dim: usize,
    top_k: usize,
    state: Mutex<State>,
}

impl CosineMemoryIndex {
    pub fn new(dim: usize, top_k: usize) -> Self {
        CosineMemoryIndex {
            dim,
            top_k,
            state: Mutex::new(State { entries: Vec::new() }),
        }
    }

    /// Add a memory to the index under `id`. Re-adding the same `id`
    /// replaces the prior entry rather than duplicating it.
    pub fn remember(&self, id: impl Into<String>, evidence: Evidence) {
        let id = id.into();
        let vec = embed(&evidence.snippet, self.dim);
        let mut state = self.state.lock().unwrap();
        state.entries.retain(|e| e.id != id);
        state.entries.push(Entry { id, vec, evidence });
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Returns the top-k evidence items by cosine similarity to `query`.
    /// Never panics on an empty index.
    pub fn search(&self, query: &str) -> Vec<Evidence> {
        let query_vec = embed(query, self.dim);
        let state = self.state.lock().unwrap();
        let mut scored: Vec<(f32, &Entry)> = state
            .entries
            .iter()
            .map(|e| (cosine_similarity(&query_vec, &e.vec), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(score, entry)| {
                let mut ev = entry.evidence.clone();
                ev.confidence = score.clamp(0.0, 1.0) as f64;
                ev
            })
            .collect()
    }

    /// Lookup a single remembered item by id, never by positional index.
    pub fn get(&self, id: &str) -> Option<Evidence> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.evidence.clone())
    }
}

#[async_trait]
impl EvidenceSource for CosineMemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn collect(&self, request: &veritas_contracts::request::DecisionRequest) -> VeritasResult<Vec<Evidence>> {
        if self.size() == 0 {
            return Ok(Vec::new());
        }
        Ok(self.search(&request.query))
    }
}

/// Parallel id/vec storage helper kept separate from `CosineMemoryIndex`
/// for callers that want raw vectors without the `Evidence` wrapper.
pub struct VectorTable {
    ids: Vec<String>,
    vecs: HashMap<String, Vec<f32>>,
}

impl VectorTable {
    pub fn new() -> Self {
        VectorTable { ids: Vec::new(), vecs: HashMap::new() }
    }

    pub fn insert(&mut self, id: impl Into<String>, vec: Vec<f32>) {
        let id = id.into();
        if !self.vecs.contains_key(&id) {
            self.ids.push(id.clone());
        }
        self.vecs.insert(id, vec);
    }

    pub fn get(&self, id: &str) -> Option<&Vec<f32>> {
        self.vecs.get(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Default for VectorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(snippet: &str) -> Evidence {
        Evidence {
            source: "memory".into(),
            uri: None,
            title: String::new(),
            snippet: snippet.into(),
            confidence: 0.5,
            kind: "recall".into(),
            tags: vec![],
        }
    }

    #[test]
    fn empty_index_search_returns_nothing() {
        let idx = CosineMemoryIndex::new(16, 3);
        assert!(idx.search("anything").is_empty());
    }

    #[test]
    fn exact_text_match_scores_highest() {
        let idx = CosineMemoryIndex::new(16, 2);
        idx.remember("a", evidence("the weather is sunny today"));
        idx.remember("b", evidence("quarterly budget planning notes"));
        let results = idx.search("the weather is sunny today");
        assert_eq!(results[0].snippet, "the weather is sunny today");
    }

    #[test]
    fn remembering_same_id_replaces_entry() {
        let idx = CosineMemoryIndex::new(8, 5);
        idx.remember("a", evidence("first version"));
        idx.remember("a", evidence("second version"));
        assert_eq!(idx.size(), 1);
        assert_eq!(idx.get("a").unwrap().snippet, "second version");
    }

    #[tokio::test]
    async fn recall_runs_even_in_fast_mode() {
        let idx = CosineMemoryIndex::new(8, 5);
        idx.remember("a", evidence("anything"));
        let request = veritas_contracts::request::DecisionRequest {
            query: "anything".into(),
            fast_mode: true,
            ..Default::default()
        };
        let out = idx.collect(&request).await.unwrap();
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn empty_index_collect_returns_nothing() {
        let idx = CosineMemoryIndex::new(8, 5);
        let request = veritas_contracts::request::DecisionRequest {
            query: "anything".into(),
            ..Default::default()
        };
        let out = idx.collect(&request).await.unwrap();
        assert!(out.is_empty());
    }
}
